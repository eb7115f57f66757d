use std::sync::Arc;

use tracing::{info, warn};

use super::{file_store::FileStorage, memory_store::MemoryStorage, no_store::NoStorage};
use crate::config::{StorageBackend, StorageConfig};

/// A durable string key/value medium, the port the token store writes through.
///
/// Implementations never fail towards the caller: an unavailable medium reads
/// as absent and drops writes.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn is_enabled(&self) -> bool {
        // Real media return true; NoStorage returns false for clearer logs.
        true
    }
}

/// Creates a concrete storage medium from the StorageConfig.
/// If `storage.enabled = false` or no backend is configured, returns NoStorage.
pub fn create_storage(config: &StorageConfig) -> Arc<dyn Storage> {
    if !config.enabled {
        info!("Token storage is disabled. Using NoStorage.");
        return Arc::new(NoStorage::new());
    }

    match &config.backend {
        Some(StorageBackend::Memory) => {
            info!("Using in-memory token storage.");
            Arc::new(MemoryStorage::new())
        }
        Some(StorageBackend::File(file_config)) => {
            info!("Using file token storage at {}", file_config.path.display());
            Arc::new(FileStorage::open(&file_config.path))
        }
        None => {
            warn!("Storage is enabled, but no backend is configured. Using NoStorage.");
            Arc::new(NoStorage::new())
        }
    }
}
