//! Session state derivation, publication and transitions.

pub mod manager;
pub mod publisher;

pub use manager::SessionManager;
pub use publisher::SessionPublisher;
