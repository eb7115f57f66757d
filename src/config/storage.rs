use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the token record is persisted:
/// - enabled: if false, the medium is unavailable (reads absent, writes dropped).
/// - backend: the concrete medium.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StorageConfig {
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<StorageBackend>,
}

/// Location of the session file when no `storage` section is configured.
pub const DEFAULT_SESSION_FILE: &str = ".streamverse/session.json";

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            enabled: true,
            backend: Some(StorageBackend::File(FileStorageConfig {
                path: PathBuf::from(DEFAULT_SESSION_FILE),
            })),
        }
    }
}

/// Storage media, selected with a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StorageBackend {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "file")]
    File(FileStorageConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FileStorageConfig {
    pub path: PathBuf,
}
