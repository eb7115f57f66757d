use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::Storage;
use crate::models::token::TokenRecord;

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";
const EXPIRATION_KEY: &str = "expiration";
const SESSION_EXPIRED_KEY: &str = "session_expired";

/// Sole owner of the persisted token record.
///
/// Plain accessors over the storage port: no decoding, no policy. Every
/// operation is total; an unavailable medium simply reads as empty.
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    // Serialises multi-key writes so a compare-and-clear sees a whole record.
    writes: Mutex<()>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        if !storage.is_enabled() {
            debug!("Token store created over a disabled medium; nothing will persist.");
        }
        TokenStore {
            storage,
            writes: Mutex::new(()),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn get_refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    pub fn get_expiration(&self) -> Option<String> {
        self.storage.get(EXPIRATION_KEY)
    }

    /// Writes a fresh login. The refresh token is only replaced when one is
    /// given; a fresh login always supersedes a stale expired marker.
    pub fn set_tokens(&self, access: &str, refresh: Option<&str>, expiration: Option<i64>) {
        let _writes = self.lock_writes();
        self.storage.set(ACCESS_TOKEN_KEY, access);
        if let Some(refresh) = refresh {
            self.storage.set(REFRESH_TOKEN_KEY, refresh);
        }
        self.write_expiration(expiration);
        self.storage.remove(SESSION_EXPIRED_KEY);
    }

    /// Refresh path: replaces the access token, leaves the refresh token alone.
    pub fn set_access_token(&self, access: &str, expiration: Option<i64>) {
        let _writes = self.lock_writes();
        self.storage.set(ACCESS_TOKEN_KEY, access);
        self.write_expiration(expiration);
        self.storage.remove(SESSION_EXPIRED_KEY);
    }

    /// Removes the access token and its expiration, plus the refresh token when
    /// `include_refresh` is set. Also resets the expired marker.
    pub fn clear_tokens(&self, include_refresh: bool) {
        let _writes = self.lock_writes();
        self.remove_access(include_refresh);
        self.storage.remove(SESSION_EXPIRED_KEY);
    }

    /// Drops the access token and raises the expired marker, but only while
    /// `access` is still the stored access token. Returns whether it was.
    pub fn invalidate_access_token(&self, access: &str) -> bool {
        let _writes = self.lock_writes();
        if self.get_access_token().as_deref() != Some(access) {
            return false;
        }
        self.remove_access(false);
        self.storage.set(SESSION_EXPIRED_KEY, "true");
        true
    }

    pub fn set_session_expired_flag(&self) {
        let _writes = self.lock_writes();
        self.storage.set(SESSION_EXPIRED_KEY, "true");
    }

    pub fn clear_session_expired_flag(&self) {
        let _writes = self.lock_writes();
        self.storage.remove(SESSION_EXPIRED_KEY);
    }

    pub fn is_session_expired(&self) -> bool {
        self.storage.get(SESSION_EXPIRED_KEY).as_deref() == Some("true")
    }

    pub fn record(&self) -> TokenRecord {
        let _writes = self.lock_writes();
        TokenRecord {
            access_token: self.get_access_token(),
            refresh_token: self.get_refresh_token(),
            expiration: self.get_expiration(),
            session_expired: self.is_session_expired(),
        }
    }

    fn remove_access(&self, include_refresh: bool) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(EXPIRATION_KEY);
        if include_refresh {
            self.storage.remove(REFRESH_TOKEN_KEY);
        }
    }

    fn write_expiration(&self, expiration: Option<i64>) {
        match expiration {
            Some(exp) => self.storage.set(EXPIRATION_KEY, &exp.to_string()),
            None => self.storage.remove(EXPIRATION_KEY),
        }
    }
}
