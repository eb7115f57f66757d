//! Outbound access to the StreamVerse REST API.
//!
//! Every call goes through [`ApiClient`], which runs it past the
//! [`RequestAuthorizer`] before sending and again when the response arrives.

pub mod authorizer;
pub mod client;
pub mod envelope;

pub use authorizer::RequestAuthorizer;
pub use client::ApiClient;

pub const LOGIN_PATH: &str = "auth/login";
pub const LOGOUT_PATH: &str = "auth/logout";
pub const REFRESH_PATH: &str = "auth/token/refresh";
pub const REGISTER_PATH: &str = "auth/register";
