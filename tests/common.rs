#![allow(dead_code)]

use std::sync::Arc;

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use streamverse_session::config::{parse_config, ConfigV1};
use streamverse_session::startup;
use streamverse_session::state::AppState;

pub const API_PATH: &str = "/api/v1.0/streamverse";
pub const FAR_FUTURE: i64 = 4102444800;

/// The claims the StreamVerse backend puts into its tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user: String,
    pub admin: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub exp: i64,
}

pub fn mint_token(user: &str, admin: bool, kind: &str, exp: i64) -> String {
    let claims = Claims {
        user: user.to_string(),
        admin,
        kind: kind.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"streamverse_secret"),
    )
    .expect("failed to mint token")
}

/// Config pointing at a mock server, with the given `storage` section.
pub fn test_config(server_url: &str, storage_yaml: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{}{}/"
  timeout_in_ms: 3000
logging:
  level: "debug"
  format: "json"
{}
"#,
        server_url, API_PATH, storage_yaml
    );
    parse_config(&yaml).expect("test config should parse")
}

pub fn build_app(config: ConfigV1) -> AppState {
    startup::build(Arc::new(config)).expect("app should build")
}

/// A successful response in the backend's envelope.
pub fn ok_envelope(data: serde_json::Value) -> String {
    serde_json::json!({"success": true, "data": data, "errors": {}}).to_string()
}

/// A failed response in the backend's envelope.
pub fn error_envelope(message: &str) -> String {
    serde_json::json!({"success": false, "data": {}, "errors": {"error": message}}).to_string()
}
