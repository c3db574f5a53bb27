//! # TTL Cache
//!
//! A small time-to-live cache keyed by string, used in front of the trust
//! registry and revocation authority lookups. Time is always supplied by the
//! caller so expiry behavior can be driven deterministically in tests, and so
//! the cache can be swapped for a distributed implementation without touching
//! callers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};

/// A TTL cache entry with its insertion time.
#[derive(Clone, Debug)]
struct Entry<T> {
    value: T,
    cached_at: DateTime<Utc>,
}

/// In-memory TTL cache. Cloning is cheap and clones share the same entries.
#[derive(Clone, Debug)]
pub struct TtlCache<T: Clone> {
    ttl: TimeDelta,
    entries: Arc<Mutex<HashMap<String, Entry<T>>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Create a cache whose entries expire `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up an unexpired entry. Expired entries are evicted on read; a
    /// miss never implies anything about the underlying value; callers must
    /// perform a fresh query.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = entries.get(key)?;
        if now - entry.cached_at > self.ttl {
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert or replace an entry, stamped at `now`.
    pub fn put(&self, key: &str, value: T, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.into(), Entry { value, cached_at: now });
    }

    /// Remove an entry, if present. Used on registry/status mutation so the
    /// next read reflects the write.
    pub fn evict(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key);
    }

    /// Drop all expired entries. Intended for a periodic sweep off the
    /// request path.
    pub fn purge_expired(&self, now: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.retain(|_, entry| now - entry.cached_at <= self.ttl);
    }

    /// Number of entries currently held, including any not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// True when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
