//! Generic TTL key/value store.
//!
//! The credential cache consumes storage purely through the [`CacheStore`]
//! trait; [`MemoryCache`] is the in-memory reference implementation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Minimal TTL key/value contract.
///
/// Expiry is lazy: an expired entry is treated as absent on read, and the
/// read that discovers it removes the entry. Implementations must be safe
/// for concurrent callers, and a `set` must be visible to a subsequent
/// `get`/`has` from the same caller.
pub trait CacheStore: Send + Sync {
    /// Look up a live entry.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`. A `ttl` of `None` or zero never expires.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>);

    /// Whether a live entry exists, without retrieving the value.
    fn has(&self, key: &str) -> bool;

    /// Remove one entry.
    fn delete(&self, key: &str);

    /// Remove all entries.
    fn clear(&self);
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory [`CacheStore`] backed by a mutex-guarded map.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(key).map(|e| e.expired(Instant::now())) {
            None => None,
            Some(true) => {
                entries.remove(key);
                None
            }
            Some(false) => entries.get(key).map(|e| e.value.clone()),
        }
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) {
        // Saturating: a ttl too large to represent never expires.
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .lock()
            .insert(key.to_owned(), Entry { value, expires_at });
    }

    fn has(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(key).map(|e| e.expired(Instant::now())) {
            None => false,
            Some(true) => {
                entries.remove(key);
                false
            }
            Some(false) => true,
        }
    }

    fn delete(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}
