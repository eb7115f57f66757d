use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::Storage;

/// Process-local storage. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.get("refresh_token").is_none());

        storage.set("refresh_token", "r1");
        storage.set("refresh_token", "r2");
        assert_eq!(storage.get("refresh_token").as_deref(), Some("r2"));

        storage.remove("refresh_token");
        assert!(storage.get("refresh_token").is_none());
    }
}
