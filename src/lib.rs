//! Library exports for streamverse-session, shared between the binary and tests.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;

pub use error::SessionError;
