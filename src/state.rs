//! Shared application state.
//!
//! Everything a consumer of the session layer needs: the loaded
//! configuration, the API client and the session manager.

use crate::api::ApiClient;
use crate::config::ConfigV1;
use crate::session::SessionManager;
use std::sync::Arc;

/// Handles created once at startup and shared by every caller.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Client for API calls. Requests made through it carry the bearer token.
    pub api: Arc<ApiClient>,
    /// Session state machine driving login, logout and refresh.
    pub session: Arc<SessionManager>,
}
