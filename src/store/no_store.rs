use super::Storage;

/// A storage medium that is not available: every read is absent and every
/// write is dropped.
pub struct NoStorage;

impl NoStorage {
    pub fn new() -> Self {
        NoStorage
    }
}

impl Default for NoStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for NoStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}

    fn is_enabled(&self) -> bool {
        false
    }
}
