use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::authorizer::RequestAuthorizer;
use super::envelope::read_envelope;
use crate::config::ApiConfig;
use crate::error::{Result, SessionError};
use crate::session::SessionPublisher;
use crate::store::TokenStore;

/// The HTTP client every backend call goes through.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    authorizer: RequestAuthorizer,
}

/// Parses the configured base URL, making sure relative paths resolve below it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    let url = Url::parse(&raw).map_err(|e| SessionError::InvalidUrl(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(SessionError::InvalidUrl(format!("{} cannot be a base URL", raw)));
    }
    Ok(url)
}

impl ApiClient {
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<TokenStore>,
        publisher: Arc<SessionPublisher>,
    ) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .build()?;
        let authorizer = RequestAuthorizer::new(base_url.clone(), tokens, publisher)?;
        debug!(
            "Created API client for {} (timeout {}ms)",
            base_url, config.timeout_in_ms
        );
        Ok(ApiClient {
            http,
            base_url,
            authorizer,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves an API path such as `titles/42` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SessionError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// Starts a request to an API path.
    pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    /// Starts a request to an arbitrary URL. It still passes the authorizer,
    /// which leaves anything outside the API untouched.
    pub fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<(Response, bool)> {
        let request = builder.build()?;
        let (request, attached) = self.authorizer.authorize(request);
        let url = request.url().clone();
        debug!(
            method = %request.method(),
            path = url.path(),
            authorized = attached.is_some(),
            "sending request"
        );

        let response = self.http.execute(request).await?;
        if let Some(token) = &attached {
            self.authorizer.observe(response.status(), &url, token);
        }
        Ok((response, attached.is_some()))
    }

    /// Sends a request and hands the response back untouched, whatever its
    /// status. Transport failures and timeouts are errors.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        self.dispatch(builder).await.map(|(response, _)| response)
    }

    /// Sends a request and unwraps the `data` of the backend's envelope.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let (response, authorized) = self.dispatch(builder).await?;
        read_envelope(response, authorized).await
    }
}
