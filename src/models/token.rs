use serde::{Deserialize, Serialize};

/// Snapshot of everything the token store persists.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Seconds since epoch, as written alongside the access token.
    pub expiration: Option<String>,
    pub session_expired: bool,
}

impl TokenRecord {
    pub fn expiration_secs(&self) -> Option<i64> {
        self.expiration.as_deref()?.trim().parse().ok()
    }
}

/// Body of `POST auth/login`.
#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `data` of a successful login.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TokenGrant {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expiration: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST auth/token/refresh`.
#[derive(Serialize, Debug, Clone)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// `data` of a successful refresh.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RefreshGrant {
    pub access_token: Option<String>,
}

/// Body of `POST auth/register`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trims every field and lowercases username and email, matching how the
    /// backend stores accounts.
    pub fn normalized(&self) -> Self {
        RegisterRequest {
            username: self.username.trim().to_lowercase(),
            fullname: self.fullname.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.trim().to_string(),
        }
    }

    /// Names of the fields that are empty after trimming.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("username", &self.username),
            ("fullname", &self.fullname),
            ("email", &self.email),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// `data` of a successful registration.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Registration {
    #[serde(default)]
    pub message: Option<String>,
    pub username: String,
}
