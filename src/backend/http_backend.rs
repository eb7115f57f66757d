use std::sync::Arc;

use reqwest::Method;
use serde::de::IgnoredAny;
use serde_json::json;
use tracing::{debug, info};

use super::base::AuthBackend;
use crate::api::{ApiClient, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH, REGISTER_PATH};
use crate::error::{Result, SessionError};
use crate::models::token::{
    LoginRequest, RefreshGrant, RefreshRequest, RegisterRequest, Registration, TokenGrant,
};

/// Talks to the StreamVerse REST API over HTTP.
///
/// Every call goes through the shared [`ApiClient`]. Login never carries a
/// bearer token; logout carries the token it is asked to revoke.
pub struct HttpAuthBackend {
    api: Arc<ApiClient>,
}

impl HttpAuthBackend {
    pub fn new(api: Arc<ApiClient>) -> Self {
        info!("Creating HTTP auth backend for {}", api.base_url());
        HttpAuthBackend { api }
    }
}

#[async_trait::async_trait]
impl AuthBackend for HttpAuthBackend {
    fn get_name(&self) -> &str {
        "http"
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenGrant> {
        debug!("POST {} for user {}", LOGIN_PATH, request.username);
        let builder = self.api.request(Method::POST, LOGIN_PATH)?.json(request);
        self.api.send_json(builder).await
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<()> {
        let mut builder = self.api.request(Method::POST, LOGOUT_PATH)?.json(&json!({}));
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        let _: IgnoredAny = self.api.send_json(builder).await?;
        Ok(())
    }

    /// A 401 here rejects the refresh token itself, so it is reported as
    /// `BackendRejected` even when a stale access token rode along.
    async fn refresh(&self, request: &RefreshRequest) -> Result<RefreshGrant> {
        let builder = self.api.request(Method::POST, REFRESH_PATH)?.json(request);
        self.api.send_json(builder).await.map_err(|e| match e {
            SessionError::AuthorizationExpired(message) => SessionError::BackendRejected {
                status: 401,
                message,
            },
            other => other,
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Registration> {
        debug!("POST {} for user {}", REGISTER_PATH, request.username);
        let builder = self.api.request(Method::POST, REGISTER_PATH)?.json(request);
        self.api.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::session::SessionPublisher;
    use crate::store::memory_store::MemoryStorage;
    use crate::store::TokenStore;
    use mockito::{Matcher, Server, ServerGuard};

    async fn backend() -> (ServerGuard, HttpAuthBackend, Arc<TokenStore>) {
        let server = Server::new_async().await;
        let tokens = Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())));
        let publisher = Arc::new(SessionPublisher::new());
        let api = ApiClient::new(
            &ApiConfig::new(format!("{}/api/v1.0/streamverse/", server.url())),
            tokens.clone(),
            publisher,
        )
        .unwrap();
        (server, HttpAuthBackend::new(Arc::new(api)), tokens)
    }

    #[tokio::test]
    async fn test_login_parses_envelope() {
        let (mut server, backend, tokens) = backend().await;
        tokens.set_tokens("stale.token.value", None, None);

        let m = server
            .mock("POST", "/api/v1.0/streamverse/auth/login")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(
                json!({"username": "alice", "password": "secret"}),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true,
                    "data": {"message": "Login successful", "access_token": "a.b.c",
                             "refresh_token": "r.s.t", "expiration": 1800000000},
                    "errors": {}}"#,
            )
            .create_async()
            .await;

        let grant = backend
            .login(&LoginRequest {
                username: "alice".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        m.assert_async().await;

        assert_eq!(grant.access_token.as_deref(), Some("a.b.c"));
        assert_eq!(grant.refresh_token.as_deref(), Some("r.s.t"));
        assert_eq!(grant.expiration, Some(1_800_000_000));
        assert_eq!(grant.message.as_deref(), Some("Login successful"));
    }

    #[tokio::test]
    async fn test_rejected_login_reports_backend_message() {
        let (mut server, backend, tokens) = backend().await;
        let m = server
            .mock("POST", "/api/v1.0/streamverse/auth/login")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "data": {}, "errors": {"error": "Incorrect password"}}"#)
            .create_async()
            .await;

        let err = backend
            .login(&LoginRequest {
                username: "alice".into(),
                password: "wrong".into(),
            })
            .await
            .unwrap_err();
        m.assert_async().await;

        match err {
            SessionError::BackendRejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect password");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!tokens.is_session_expired());
    }

    #[tokio::test]
    async fn test_logout_carries_given_token() {
        let (mut server, backend, tokens) = backend().await;
        // A newer token in the store must not replace the one being revoked.
        tokens.set_tokens("new.d.e", Some("r.s.t"), None);

        let m = server
            .mock("POST", "/api/v1.0/streamverse/auth/logout")
            .match_header("authorization", "Bearer a.b.c")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "data": {}, "errors": {"error": "JWT token expired"}}"#)
            .create_async()
            .await;

        let err = backend.logout(Some("a.b.c")).await.unwrap_err();
        m.assert_async().await;
        assert!(matches!(err, SessionError::BackendRejected { status: 401, .. }));
        assert_eq!(tokens.get_access_token().as_deref(), Some("new.d.e"));
        assert!(!tokens.is_session_expired());
    }

    #[tokio::test]
    async fn test_logout_without_token_sends_no_header() {
        let (mut server, backend, _) = backend().await;
        let m = server
            .mock("POST", "/api/v1.0/streamverse/auth/logout")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "data": {"message": "Logout successful"}, "errors": {}}"#)
            .create_async()
            .await;

        backend.logout(None).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_refresh_token_is_backend_rejection() {
        let (mut server, backend, tokens) = backend().await;
        tokens.set_tokens("stale.a.b", Some("r.s.t"), None);

        let m = server
            .mock("POST", "/api/v1.0/streamverse/auth/token/refresh")
            .match_header("authorization", "Bearer stale.a.b")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "data": {}, "errors": {"error": "Refresh token expired"}}"#)
            .create_async()
            .await;

        let err = backend
            .refresh(&RefreshRequest {
                refresh_token: "r.s.t".into(),
            })
            .await
            .unwrap_err();
        m.assert_async().await;
        assert!(matches!(
            err,
            SessionError::BackendRejected { status: 401, message } if message == "Refresh token expired"
        ));
    }

    #[tokio::test]
    async fn test_refresh_sends_refresh_token() {
        let (mut server, backend, _) = backend().await;
        let m = server
            .mock("POST", "/api/v1.0/streamverse/auth/token/refresh")
            .match_body(Matcher::Json(json!({"refresh_token": "r.s.t"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "data": {"access_token": "d.e.f"}, "errors": {}}"#)
            .create_async()
            .await;

        let grant = backend
            .refresh(&RefreshRequest {
                refresh_token: "r.s.t".into(),
            })
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(grant.access_token.as_deref(), Some("d.e.f"));
    }

    #[tokio::test]
    async fn test_register_created_and_conflict() {
        let (mut server, backend, _) = backend().await;
        let request = RegisterRequest {
            username: "carol".into(),
            fullname: "Carol Danvers".into(),
            email: "carol@example.com".into(),
            password: "pw".into(),
        };

        let created = server
            .mock("POST", "/api/v1.0/streamverse/auth/register")
            .match_body(Matcher::PartialJson(json!({"username": "carol"})))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": true,
                    "data": {"message": "User registered successfully", "username": "carol"},
                    "errors": {}}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let registration = backend.register(&request).await.unwrap();
        created.assert_async().await;
        assert_eq!(registration.username, "carol");
        created.remove_async().await;

        server
            .mock("POST", "/api/v1.0/streamverse/auth/register")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": false, "data": {}, "errors": {"error": "Username already exists"}}"#)
            .create_async()
            .await;

        let err = backend.register(&request).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::BackendRejected { status: 400, message } if message == "Username already exists"
        ));
    }
}
