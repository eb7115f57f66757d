//! Application startup.
//!
//! Wires storage, token store, state publisher, API client, auth backend and
//! session manager together from the configuration.

use std::sync::Arc;
use tracing::info;

use crate::api::ApiClient;
use crate::backend::{AuthBackend, HttpAuthBackend};
use crate::config::ConfigV1;
use crate::error::Result;
use crate::session::{SessionManager, SessionPublisher};
use crate::state::AppState;
use crate::store::{create_storage, TokenStore};

/// Builds the session layer described by `config`.
///
/// The session manager publishes whatever session the configured storage
/// already holds before this returns.
///
/// # Errors
///
/// Returns an error if the API base URL is invalid or the HTTP client cannot
/// be created.
pub fn build(config: Arc<ConfigV1>) -> Result<AppState> {
    let storage = create_storage(&config.storage);
    let tokens = Arc::new(TokenStore::new(storage));
    let publisher = Arc::new(SessionPublisher::new());

    let api = Arc::new(ApiClient::new(
        &config.api,
        tokens.clone(),
        publisher.clone(),
    )?);
    let backend: Arc<dyn AuthBackend> = Arc::new(HttpAuthBackend::new(api.clone()));
    let session = Arc::new(SessionManager::new(tokens, publisher, backend));

    info!(
        "Session layer ready for {} (storage enabled: {})",
        api.base_url(),
        config.storage.enabled
    );

    Ok(AppState {
        config,
        api,
        session,
    })
}
