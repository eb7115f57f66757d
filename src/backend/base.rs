use crate::error::Result;
use crate::models::token::{
    LoginRequest, RefreshGrant, RefreshRequest, RegisterRequest, Registration, TokenGrant,
};

/// The backend's `auth/*` endpoints as consumed by the session manager.
///
/// Implementations report any non-success answer as an error and never touch
/// local session state themselves.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    fn get_name(&self) -> &str;
    async fn login(&self, request: &LoginRequest) -> Result<TokenGrant>;
    /// Revokes `access_token` on the server. Local state is the caller's job.
    async fn logout(&self, access_token: Option<&str>) -> Result<()>;
    async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshGrant>;
    async fn register(&self, request: &RegisterRequest) -> Result<Registration>;
}
