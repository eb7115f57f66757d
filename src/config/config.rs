use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::api::ApiConfig;
use super::logging::LoggingConfig;
use super::storage::StorageConfig;

/// Environment variables with this prefix override file values;
/// `__` separates nested keys (`STREAMVERSE_API__BASE_URL`).
pub const ENV_PREFIX: &str = "STREAMVERSE_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl From<Config> for ConfigV1 {
    fn from(config: Config) -> Self {
        match config {
            Config::ConfigV1(c) => c,
        }
    }
}

/// Load config from a YAML file, with environment overrides layered on top.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, figment::Error> {
    Figment::new()
        .merge(Yaml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract::<Config>()
        .map(ConfigV1::from)
}

/// Parse config from a YAML string. No environment overrides are applied.
pub fn parse_config(yaml: &str) -> Result<ConfigV1, figment::Error> {
    Figment::new()
        .merge(Yaml::string(yaml))
        .extract::<Config>()
        .map(ConfigV1::from)
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
version: "1.0.0"
api:
  base_url: "http://localhost:5000/api/v1.0/streamverse/"
  timeout_in_ms: 2500
storage:
  enabled: true
  type: file
  path: "/tmp/streamverse/session.json"
logging:
  level: debug
  format: json
"#;
        let config = parse_config(yaml).expect("config should parse");
        assert_eq!(config.api.timeout_in_ms, 2500);
        assert!(config.storage.enabled);
        match config.storage.backend {
            Some(StorageBackend::File(file)) => {
                assert_eq!(file.path.to_str(), Some("/tmp/streamverse/session.json"))
            }
            other => panic!("expected file storage, got {:?}", other),
        }
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_defaults_apply_for_missing_sections() {
        let yaml = r#"
version: "1.0.0"
api:
  base_url: "http://localhost:5000/api/v1.0/streamverse/"
"#;
        let config = parse_config(yaml).expect("config should parse");
        assert_eq!(config.api.timeout_in_ms, 10_000);
        assert!(config.storage.enabled);
        match config.storage.backend {
            Some(StorageBackend::File(file)) => {
                assert_eq!(file.path.to_str(), Some(".streamverse/session.json"))
            }
            other => panic!("expected file storage, got {:?}", other),
        }
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let yaml = r#"
version: "0.9.0"
api:
  base_url: "http://localhost:5000/"
"#;
        assert!(parse_config(yaml).is_err());
    }
}
