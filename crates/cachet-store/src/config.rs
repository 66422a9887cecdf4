use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`TtlStore`](crate::TtlStore) and its background tasks.
///
/// ```rust
/// use cachet_store::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_cleanup_interval(Duration::from_secs(30))
///     .with_removal_queue_capacity(64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Interval between sweeps for expired entries (default: 60 seconds).
    #[serde(with = "cachet_types::duration::serde_text")]
    pub cleanup_interval: Duration,
    /// Depth of the removal queue (default: 32).
    pub removal_queue_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
            removal_queue_capacity: 32,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how often the sweeper scans for expired entries.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Sets how many keys may wait for removal before new ones are dropped.
    pub fn with_removal_queue_capacity(mut self, capacity: usize) -> Self {
        self.removal_queue_capacity = capacity;
        self
    }
}
