use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Request, StatusCode, Url};
use tracing::{debug, warn};

use super::LOGIN_PATH;
use crate::error::{Result, SessionError};
use crate::session::SessionPublisher;
use crate::store::TokenStore;
use crate::utils::log_throttle::LogThrottle;

const UNAUTHORIZED_LOG_WINDOW: Duration = Duration::from_secs(30);

/// Gate every outbound request passes through.
///
/// Attaches the bearer token to API calls and turns a 401 on such a call into
/// local session invalidation, so the token store never outlives the
/// server-side session.
pub struct RequestAuthorizer {
    api_base: Url,
    login_url: Url,
    tokens: Arc<TokenStore>,
    publisher: Arc<SessionPublisher>,
    throttle: LogThrottle,
}

impl RequestAuthorizer {
    pub fn new(
        api_base: Url,
        tokens: Arc<TokenStore>,
        publisher: Arc<SessionPublisher>,
    ) -> Result<Self> {
        let login_url = api_base
            .join(LOGIN_PATH)
            .map_err(|e| SessionError::InvalidUrl(e.to_string()))?;
        Ok(RequestAuthorizer {
            api_base,
            login_url,
            tokens,
            publisher,
            throttle: LogThrottle::new(UNAUTHORIZED_LOG_WINDOW),
        })
    }

    /// Same origin as the API and under its base path.
    pub fn is_api_target(&self, url: &Url) -> bool {
        url.scheme() == self.api_base.scheme()
            && url.host_str() == self.api_base.host_str()
            && url.port_or_known_default() == self.api_base.port_or_known_default()
            && url.path().starts_with(self.api_base.path())
    }

    fn is_login(&self, url: &Url) -> bool {
        url.path().trim_end_matches('/') == self.login_url.path().trim_end_matches('/')
    }

    /// Attaches `Authorization: Bearer <token>` when the request targets the
    /// API, is not the login call, carries no Authorization header of its own
    /// and a token is stored. Returns the token that was attached.
    pub fn authorize(&self, mut request: Request) -> (Request, Option<String>) {
        if !self.is_api_target(request.url()) {
            return (request, None);
        }
        if self.is_login(request.url()) {
            debug!("Login request sent without bearer token.");
            return (request, None);
        }
        if request.headers().contains_key(AUTHORIZATION) {
            return (request, None);
        }
        let Some(token) = self.tokens.get_access_token() else {
            return (request, None);
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
                (request, Some(token))
            }
            Err(_) => {
                warn!(
                    event_name = "api.authorize.invalid_token",
                    event_domain = "api",
                    "stored access token is not a valid header value; sending request without it"
                );
                (request, None)
            }
        }
    }

    /// Inspects the status of a response to a request that carried
    /// `attached`. A 401 drops the access token, keeps the refresh token and
    /// raises the session-expired flag, unless a newer token has been stored
    /// since. Returns whether the session was invalidated.
    pub fn observe(&self, status: StatusCode, url: &Url, attached: &str) -> bool {
        if status != StatusCode::UNAUTHORIZED {
            return false;
        }

        if !self.tokens.invalidate_access_token(attached) {
            debug!(
                event_name = "api.authorization_expired.stale",
                event_domain = "api",
                path = url.path(),
                "401 for a token that is no longer stored; session left alone"
            );
            return false;
        }
        self.publisher.sync(&self.tokens);

        if let Some(suppressed_count) = self.throttle.should_emit("api.authorization_expired") {
            warn!(
                event_name = "api.authorization_expired",
                event_domain = "api",
                path = url.path(),
                suppressed_count,
                "server rejected the bearer token; local session invalidated"
            );
        }
        true
    }
}
