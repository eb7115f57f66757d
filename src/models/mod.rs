pub mod claims;
pub mod session;
pub mod token;

pub use claims::{decode_claims, Claims};
pub use session::SessionState;
pub use token::TokenRecord;
