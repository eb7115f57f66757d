pub mod base;
pub mod http_backend;

pub use base::AuthBackend;
pub use http_backend::HttpAuthBackend;
