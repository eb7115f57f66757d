use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// LoggingConfig controls how tracing output is initialised.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct LoggingConfig {
    pub level: String,  // e.g. "info", "debug", "warn"
    pub format: String, // e.g. "json", "console"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "console".to_string(),
        }
    }
}
