use serde::{Deserialize, Serialize};

use super::claims::decode_claims;
use super::token::TokenRecord;

/// What the rest of the application may know about the current session.
///
/// Always derived from the stored token record, never written directly.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub logged_in: bool,
    pub username: Option<String>,
    pub is_admin: bool,
    /// The server invalidated a session that a refresh could still recover.
    pub session_expired: bool,
}

impl SessionState {
    pub fn logged_out() -> Self {
        SessionState::default()
    }

    /// Projects a token record into session state.
    ///
    /// An access token that does not decode counts as no token at all.
    pub fn derive(record: &TokenRecord) -> Self {
        let claims = record.access_token.as_deref().and_then(decode_claims);
        match claims {
            Some(claims) => SessionState {
                logged_in: true,
                username: claims.username().map(str::to_string),
                is_admin: claims.is_admin(),
                session_expired: false,
            },
            None => SessionState {
                session_expired: record.refresh_token.is_some() && record.session_expired,
                ..SessionState::logged_out()
            },
        }
    }
}
