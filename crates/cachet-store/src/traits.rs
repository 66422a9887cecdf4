use std::time::Duration;

use serde_json::Value;

use crate::error::StoreResult;
use crate::store::TtlStore;
use crate::types::{Item, StoreStats};

/// JSON-valued key/value store with per-entry TTL.
///
/// This is the seam the network adapters are written against. It is object
/// safe so adapters can hold an `Arc<dyn KeyValueStore>` and tests can swap
/// in a double.
///
/// Implementations must satisfy:
/// - An entry is visible from `set` until its TTL elapses, then never again.
/// - `delete` is idempotent and reports whether anything was removed.
/// - Empty keys are rejected with [`StoreError::EmptyKey`](crate::StoreError::EmptyKey).
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> StoreResult<()>;

    /// Read the live entry under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or expired.
    fn get(&self, key: &str) -> StoreResult<Option<Item<Value>>>;

    /// Remove `key`. Returns `true` if an entry existed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Whether a live entry exists under `key`.
    fn has(&self, key: &str) -> StoreResult<bool>;

    /// Point-in-time counters and health.
    fn stats(&self) -> StoreStats;
}

impl KeyValueStore for TtlStore {
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> StoreResult<()> {
        TtlStore::set(self, key, value, ttl).map(|_| ())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Item<Value>>> {
        TtlStore::get(self, key)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        TtlStore::delete(self, key)
    }

    fn has(&self, key: &str) -> StoreResult<bool> {
        TtlStore::has(self, key)
    }

    fn stats(&self) -> StoreStats {
        TtlStore::stats(self)
    }
}
