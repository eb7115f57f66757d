use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use futures::Stream;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::publisher::SessionPublisher;
use crate::backend::AuthBackend;
use crate::error::{Result, SessionError};
use crate::models::claims::decode_claims;
use crate::models::token::{LoginRequest, RefreshRequest, RegisterRequest, Registration};
use crate::models::SessionState;
use crate::store::TokenStore;

/// The only component that interprets tokens and drives session transitions.
///
/// Every login, logout and refresh takes a generation ticket when it starts
/// and only writes its outcome if no newer transition has started since.
/// The transition issued last wins, whichever network call resolves last.
pub struct SessionManager {
    tokens: Arc<TokenStore>,
    publisher: Arc<SessionPublisher>,
    backend: Arc<dyn AuthBackend>,
    generation: Mutex<u64>,
}

impl SessionManager {
    /// Creates the manager and publishes whatever session the stored access
    /// token describes.
    pub fn new(
        tokens: Arc<TokenStore>,
        publisher: Arc<SessionPublisher>,
        backend: Arc<dyn AuthBackend>,
    ) -> Self {
        let manager = SessionManager {
            tokens,
            publisher,
            backend,
            generation: Mutex::new(0),
        };
        let state = manager.publisher.sync(&manager.tokens);
        info!(
            event_name = "session.init",
            event_domain = "session",
            backend = manager.backend.get_name(),
            logged_in = state.logged_in,
            "session restored from storage"
        );
        manager
    }

    fn begin(&self) -> u64 {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        *generation
    }

    /// Runs `apply` only if `ticket` is still the newest transition. The
    /// check and the write happen under one lock.
    fn commit<T>(&self, ticket: u64, apply: impl FnOnce() -> T) -> Option<T> {
        let generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        if *generation != ticket {
            debug!(
                event_name = "session.transition.superseded",
                event_domain = "session",
                ticket,
                current = *generation,
                "discarding stale session transition"
            );
            return None;
        }
        Some(apply())
    }

    /// Starts a new generation and runs `apply` under the same lock, so no
    /// transition issued earlier can commit afterwards.
    fn supersede<T>(&self, apply: impl FnOnce() -> T) -> T {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        apply()
    }

    fn clear_all(&self) -> SessionState {
        self.tokens.clear_tokens(true);
        self.publisher.sync(&self.tokens)
    }

    /// Logs in with the given credentials.
    ///
    /// The username is trimmed and lowercased. Empty credentials fail with
    /// `InvalidInput` before any network call. A rejected login leaves the
    /// current session untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState> {
        let username = username.trim().to_lowercase();

        let mut missing = Vec::new();
        if username.is_empty() {
            missing.push("username");
        }
        if password.trim().is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(SessionError::InvalidInput(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let ticket = self.begin();
        let request = LoginRequest {
            username: username.clone(),
            password: password.to_string(),
        };
        let grant = match self.backend.login(&request).await {
            Ok(grant) => grant,
            Err(e) => {
                warn!(
                    event_name = "session.login.failed",
                    event_domain = "session",
                    username = username.as_str(),
                    error = %e,
                    "login rejected"
                );
                return Err(e);
            }
        };

        let access = grant
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                SessionError::MalformedResponse("login response carries no access_token".into())
            })?;
        let expiration = grant
            .expiration
            .or_else(|| decode_claims(&access).and_then(|claims| claims.expiration()));
        if grant.refresh_token.is_none() {
            debug!("Login response carries no refresh token; session cannot be refreshed.");
        }

        let state = self
            .commit(ticket, || {
                self.tokens
                    .set_tokens(&access, grant.refresh_token.as_deref(), expiration);
                self.publisher.sync(&self.tokens)
            })
            .ok_or(SessionError::Superseded)?;

        info!(
            event_name = "session.login.succeeded",
            event_domain = "session",
            username = state.username.as_deref().unwrap_or_default(),
            is_admin = state.is_admin,
            "logged in"
        );
        Ok(state)
    }

    /// Ends the session.
    ///
    /// Local tokens are cleared before the backend is told, under a new
    /// generation, so every login or refresh still in flight is superseded.
    /// The backend call only revokes the old token and its failure is logged.
    pub async fn logout(&self) -> SessionState {
        let (revoked, state) = self.supersede(|| {
            let revoked = self.tokens.get_access_token();
            (revoked, self.clear_all())
        });
        info!(
            event_name = "session.logout",
            event_domain = "session",
            "logged out"
        );

        if let Err(e) = self.backend.logout(revoked.as_deref()).await {
            warn!(
                event_name = "session.logout.backend_failed",
                event_domain = "session",
                error = %e,
                "backend logout failed; local session already cleared"
            );
        }
        state
    }

    /// Trades the stored refresh token for a new access token.
    ///
    /// Without a refresh token the session is cleared and `NoRefreshToken`
    /// returned without a network call. A failed refresh clears every token.
    pub async fn refresh_session(&self) -> Result<SessionState> {
        let ticket = self.begin();
        let Some(refresh_token) = self.tokens.get_refresh_token() else {
            self.commit(ticket, || self.clear_all());
            return Err(SessionError::NoRefreshToken);
        };

        let outcome = self
            .backend
            .refresh(&RefreshRequest { refresh_token })
            .await
            .and_then(|grant| {
                grant
                    .access_token
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| {
                        SessionError::MalformedResponse(
                            "refresh response carries no access_token".into(),
                        )
                    })
            });

        match outcome {
            Ok(access) => {
                let expiration = decode_claims(&access).and_then(|claims| claims.expiration());
                let state = self
                    .commit(ticket, || {
                        self.tokens.set_access_token(&access, expiration);
                        self.publisher.sync(&self.tokens)
                    })
                    .ok_or(SessionError::Superseded)?;
                info!(
                    event_name = "session.refresh.succeeded",
                    event_domain = "session",
                    "access token refreshed"
                );
                Ok(state)
            }
            Err(e) => {
                warn!(
                    event_name = "session.refresh.failed",
                    event_domain = "session",
                    error = %e,
                    "refresh failed; clearing session"
                );
                self.commit(ticket, || self.clear_all())
                    .ok_or(SessionError::Superseded)?;
                Err(e)
            }
        }
    }

    /// Refreshes when the stored access token is gone or expires within
    /// `leeway`, provided a refresh token exists. Otherwise returns the
    /// current state untouched.
    pub async fn refresh_if_expiring(&self, leeway: Duration) -> Result<SessionState> {
        let record = self.tokens.record();
        if record.refresh_token.is_none() {
            return Ok(self.state());
        }
        let due = match (&record.access_token, record.expiration_secs()) {
            (None, _) => true,
            (Some(_), Some(exp)) => Utc::now().timestamp() + leeway.num_seconds() >= exp,
            (Some(_), None) => false,
        };
        if due {
            self.refresh_session().await
        } else {
            Ok(self.state())
        }
    }

    /// Registers a new account. Session state is not affected.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Registration> {
        let missing = request.missing_fields();
        if !missing.is_empty() {
            return Err(SessionError::InvalidInput(format!(
                "Missing or empty field(s): {}",
                missing.join(", ")
            )));
        }
        let request = request.normalized();
        let registration = self.backend.register(&request).await?;
        info!(
            event_name = "session.register",
            event_domain = "session",
            username = registration.username.as_str(),
            "account registered"
        );
        Ok(registration)
    }

    /// Clears the re-authentication prompt without touching the tokens.
    pub fn dismiss_session_warning(&self) -> SessionState {
        self.tokens.clear_session_expired_flag();
        self.publisher.sync(&self.tokens)
    }

    pub fn state(&self) -> SessionState {
        SessionState::derive(&self.tokens.record())
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().logged_in
    }

    pub fn current_username(&self) -> Option<String> {
        self.state().username
    }

    pub fn is_admin(&self) -> bool {
        self.state().is_admin
    }

    /// Logged out by the server while a refresh could still recover.
    pub fn has_expired_session(&self) -> bool {
        self.state().session_expired
    }

    /// When the stored access token expires, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.tokens.record().expiration_secs()?;
        DateTime::from_timestamp(secs, 0)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }

    pub fn updates(&self) -> impl Stream<Item = SessionState> + Send + 'static {
        self.publisher.updates()
    }
}
