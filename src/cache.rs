//! Time-boxed caching of resolution results.
//!
//! The resolver only ever stores successful, document-bearing results, keyed
//! by the base DID. [`MemoryCache`] is the in-process implementation; other
//! backends plug in through [`ResolutionCache`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::ResolutionResult;

/// Default lifetime of a cached result
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Storage for resolution results keyed by base DID
pub trait ResolutionCache: Send + Sync {
    /// Returns the cached result, or `None` if absent or expired
    fn get(&self, key: &str) -> Option<ResolutionResult>;

    /// Stores `result`. A `ttl` of `None` uses the cache's default lifetime.
    fn set(&self, key: &str, result: ResolutionResult, ttl: Option<Duration>);

    fn delete(&self, key: &str);

    fn clear(&self);

    /// Number of live entries
    fn size(&self) -> usize;
}

/// A cached resolution result
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: ResolutionResult,
    pub cached_at: DateTime<Utc>,
    /// `None` means the entry never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

/// In-memory [`ResolutionCache`] guarded by a mutex
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Option<Duration>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Some(DEFAULT_CACHE_TTL))
    }
}

impl MemoryCache {
    /// Creates a cache whose entries live for `default_ttl`, or forever if
    /// `None`
    pub fn new(default_ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Returns a copy of the raw entry, expired or not
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // entries are replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResolutionCache for MemoryCache {
    fn get(&self, key: &str) -> Option<ResolutionResult> {
        let mut entries = self.lock();
        let now = Utc::now();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                debug!("Cache entry expired: {}", key);
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.result.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, result: ResolutionResult, ttl: Option<Duration>) {
        let cached_at = Utc::now();
        let expires_at = ttl
            .or(self.default_ttl)
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .and_then(|ttl| cached_at.checked_add_signed(ttl));

        self.lock().insert(
            key.to_string(),
            CacheEntry {
                result,
                cached_at,
                expires_at,
            },
        );
    }

    fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    fn clear(&self) {
        self.lock().clear();
    }

    fn size(&self) -> usize {
        let mut entries = self.lock();
        let now = Utc::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        if entries.len() != before {
            debug!("Swept {} expired cache entries", before - entries.len());
        }
        entries.len()
    }
}
