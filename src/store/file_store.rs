use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::Storage;

/// Storage backed by a single JSON object on disk, rewritten on every change.
///
/// A missing or unreadable file starts empty; failed writes are logged and the
/// in-memory view stays authoritative for the rest of the process.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match load(&path) {
            Ok(entries) => {
                debug!("Loaded {} stored entries from {}", entries.len(), path.display());
                entries
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(
                    event_name = "store.file.load_failed",
                    event_domain = "store",
                    path = %path.display(),
                    error = %e,
                    "stored session is unreadable, starting empty"
                );
                HashMap::new()
            }
        };

        FileStorage {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        if let Err(e) = save(&self.path, entries) {
            warn!(
                event_name = "store.file.write_failed",
                event_domain = "store",
                path = %self.path.display(),
                error = %e,
                "failed to persist session storage"
            );
        }
    }
}

fn load(path: &Path) -> io::Result<HashMap<String, String>> {
    let raw = fs::read(path)?;
    serde_json::from_slice(&raw).map_err(io::Error::from)
}

fn save(path: &Path, entries: &HashMap<String, String>) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let body = serde_json::to_vec_pretty(entries).map_err(io::Error::from)?;
    // Readers only ever see a complete file.
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}
