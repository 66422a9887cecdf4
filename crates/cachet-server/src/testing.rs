//! In-memory `KeyValueStore` double for adapter tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use cachet_store::{Item, KeyValueStore, LifecycleState, Meta, StoreError, StoreResult, StoreStats};
use chrono::Utc;
use serde_json::Value;

/// Records writes with their TTL and never expires anything. Optionally
/// fails every operation with a fixed error.
#[derive(Default)]
pub struct MockStore {
    entries: Mutex<HashMap<String, (Value, Duration)>>,
    failure: Option<StoreError>,
    failed_task: Mutex<Option<String>>,
}

impl MockStore {
    pub fn failing(err: StoreError) -> Self {
        Self {
            failure: Some(err),
            ..Self::default()
        }
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), (value, Duration::from_secs(60)));
    }

    pub fn entry(&self, key: &str) -> Option<(Value, Duration)> {
        self.entries.lock().expect("lock poisoned").get(key).cloned()
    }

    pub fn mark_failed(&self, task: &str) {
        *self.failed_task.lock().expect("lock poisoned") = Some(task.to_string());
    }

    fn check(&self, key: &str) -> StoreResult<()> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        Ok(())
    }
}

impl KeyValueStore for MockStore {
    fn set(&self, key: &str, value: &Value, ttl: Duration) -> StoreResult<()> {
        self.check(key)?;
        self.entries
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), (value.clone(), ttl));
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Item<Value>>> {
        self.check(key)?;
        Ok(self.entry(key).map(|(value, _)| Item {
            value,
            meta: Meta::created(Utc::now()),
        }))
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        self.check(key)?;
        Ok(self
            .entries
            .lock()
            .expect("lock poisoned")
            .remove(key)
            .is_some())
    }

    fn has(&self, key: &str) -> StoreResult<bool> {
        self.check(key)?;
        Ok(self.entry(key).is_some())
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.entries.lock().expect("lock poisoned").len(),
            removals_enqueued: 0,
            removals_dropped: 0,
            state: LifecycleState::Running,
            failed_task: self.failed_task.lock().expect("lock poisoned").clone(),
        }
    }
}
