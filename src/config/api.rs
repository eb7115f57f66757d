use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Connection settings for the StreamVerse REST API.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    /// Base URL every API path is resolved against,
    /// e.g. `http://localhost:5000/api/v1.0/streamverse/`.
    pub base_url: String,
    /// Per-request timeout. A backend that never answers fails the call
    /// instead of leaving the session transition pending.
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiConfig {
            base_url: base_url.into(),
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}
