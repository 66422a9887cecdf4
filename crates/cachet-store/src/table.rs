use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use cachet_types::Meta;
use chrono::Utc;

use crate::entry::Entry;

/// Longest TTL honoured; larger values are clamped so instant arithmetic
/// cannot overflow.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Result of looking a key up at a given instant.
#[derive(Debug, Clone)]
pub enum Lookup {
    Missing,
    Expired,
    Live(Entry),
}

/// Key to entry mapping behind a single read/write lock.
///
/// Readers share the lock; writers exclude everyone. Expired entries stay
/// in the map until something removes them, so callers must check
/// expiration themselves (see [`EntryTable::lookup`]).
pub struct EntryTable {
    entries: RwLock<HashMap<String, Entry>>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace `key` with an already-encoded payload.
    ///
    /// Overwriting a live entry keeps its `created_at`; overwriting a missing
    /// or expired entry starts fresh. Returns the metadata that was stored.
    pub fn insert(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Meta {
        let payload: Arc<[u8]> = payload.into();
        let mut map = self.entries.write().expect("lock poisoned");

        // Timestamps are taken under the lock so they follow write order.
        let now = Instant::now();
        let wall = Utc::now();
        let expires_at = now + ttl.min(MAX_TTL);

        let meta = match map.get(key) {
            Some(prev) if !prev.is_expired_at(now) => prev.meta().touched(wall),
            _ => Meta::created(wall),
        };
        map.insert(key.to_string(), Entry::new(payload, meta, expires_at));
        meta
    }

    /// Look up `key`, classifying it as missing, expired, or live at `now`.
    pub fn lookup(&self, key: &str, now: Instant) -> Lookup {
        let map = self.entries.read().expect("lock poisoned");
        match map.get(key) {
            None => Lookup::Missing,
            Some(entry) if entry.is_expired_at(now) => Lookup::Expired,
            Some(entry) => Lookup::Live(entry.clone()),
        }
    }

    /// Remove `key` unconditionally. Returns `true` if it was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut map = self.entries.write().expect("lock poisoned");
        map.remove(key).is_some()
    }

    /// Remove `key` only if it is still expired at `now`.
    ///
    /// A key that was re-set with a fresh TTL after being queued for removal
    /// survives.
    pub fn remove_if_expired(&self, key: &str, now: Instant) -> bool {
        let mut map = self.entries.write().expect("lock poisoned");
        match map.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                map.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Keys whose entries are expired at `now`.
    pub fn expired_keys(&self, now: Instant) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        map.iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of entries held, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }
}

impl Default for EntryTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryTable")
            .field("entry_count", &self.len())
            .finish()
    }
}
