use thiserror::Error;

/// Errors surfaced by session transitions and API calls.
///
/// Token decoding problems never show up here: an undecodable token reads as
/// "no claims".
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Backend rejected request ({status}): {message}")]
    BackendRejected { status: u16, message: String },
    #[error("Authorization expired: {0}")]
    AuthorizationExpired(String),
    #[error("No refresh token stored")]
    NoRefreshToken,
    #[error("Superseded by a newer session transition")]
    Superseded,
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl SessionError {
    /// HTTP status reported by the backend, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::BackendRejected { status, .. } => Some(*status),
            SessionError::AuthorizationExpired(_) => Some(401),
            SessionError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
