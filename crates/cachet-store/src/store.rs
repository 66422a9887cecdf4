use std::sync::Arc;
use std::time::{Duration, Instant};

use cachet_codec::ValueCodec;
use cachet_types::Meta;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::lifecycle::{Health, Lifecycle, LifecycleState, TaskGroup};
use crate::queue::{Offer, RemovalQueue};
use crate::sweeper::{self, SweepReport};
use crate::table::{EntryTable, Lookup};
use crate::types::{Item, StoreStats};
use crate::worker;

/// Shortest sweep interval accepted; a zero period would spin.
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(1);

struct StoreInner {
    table: Arc<EntryTable>,
    queue: RemovalQueue,
    lifecycle: Lifecycle,
    config: StoreConfig,
}

/// Concurrent key/value store with per-entry TTL.
///
/// Cheap to clone; every clone is a handle to the same store. Creating a
/// store spawns two background tasks (sweeper and removal worker) on the
/// current Tokio runtime. Call [`close`](Self::close) to stop them and wait
/// for them; dropping the last handle without closing only signals them.
///
/// ```rust,no_run
/// # async fn demo() -> cachet_store::StoreResult<()> {
/// use cachet_store::TtlStore;
/// use std::time::Duration;
///
/// let store = TtlStore::new()?;
/// store.set("greeting", &"hello", Duration::from_secs(10))?;
/// let item = store.get::<String>("greeting")?.unwrap();
/// assert_eq!(item.value, "hello");
/// store.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TtlStore {
    inner: Arc<StoreInner>,
}

impl TtlStore {
    /// Create a store with default configuration.
    pub fn new() -> StoreResult<Self> {
        Self::with_config(StoreConfig::default())
    }

    /// Create a store and start its background tasks.
    ///
    /// Fails with [`StoreError::RuntimeUnavailable`] outside a Tokio runtime.
    pub fn with_config(mut config: StoreConfig) -> StoreResult<Self> {
        Handle::try_current().map_err(|_| StoreError::RuntimeUnavailable)?;
        config.cleanup_interval = config.cleanup_interval.max(MIN_CLEANUP_INTERVAL);

        let table = Arc::new(EntryTable::new());
        let (queue, rx) = RemovalQueue::bounded(config.removal_queue_capacity);

        let mut tasks = TaskGroup::new(Arc::new(Health::default()));
        {
            let table = Arc::clone(&table);
            let queue = queue.clone();
            let every = config.cleanup_interval;
            tasks.spawn("sweeper", move |signal| {
                sweeper::run_sweeper(table, queue, every, signal)
            });
        }
        {
            let table = Arc::clone(&table);
            tasks.spawn("removal-worker", move |signal| {
                worker::run_removal_worker(table, rx, signal)
            });
        }

        info!(
            cleanup_interval = ?config.cleanup_interval,
            queue_capacity = queue.capacity(),
            "store started"
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                table,
                queue,
                lifecycle: Lifecycle::new(tasks),
                config,
            }),
        })
    }

    /// Store `value` under `key` for `ttl`.
    ///
    /// The value is encoded before the table is locked, so an encoding
    /// failure leaves any previous entry in place. A zero TTL stores an
    /// entry that is already expired.
    pub fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: impl Into<Duration>,
    ) -> StoreResult<Meta> {
        self.check(key)?;
        let payload = ValueCodec::encode(value)?;
        let meta = self.inner.table.insert(key, payload, ttl.into());
        debug!(key, "set");
        Ok(meta)
    }

    /// Read the live entry under `key`, decoded as `T`.
    ///
    /// An expired entry reads as absent and is queued for removal.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<Item<T>>> {
        self.check(key)?;
        match self.inner.table.lookup(key, Instant::now()) {
            Lookup::Missing => Ok(None),
            Lookup::Expired => {
                self.reclaim(key);
                Ok(None)
            }
            Lookup::Live(entry) => {
                let value = ValueCodec::decode(entry.payload())?;
                Ok(Some(Item {
                    value,
                    meta: entry.meta(),
                }))
            }
        }
    }

    /// Remove `key`. Returns `true` if an entry (live or expired) was removed.
    pub fn delete(&self, key: &str) -> StoreResult<bool> {
        self.check(key)?;
        let removed = self.inner.table.remove(key);
        debug!(key, removed, "delete");
        Ok(removed)
    }

    /// Whether a live entry exists under `key`.
    ///
    /// Like [`get`](Self::get), finding an expired entry queues it for removal.
    pub fn has(&self, key: &str) -> StoreResult<bool> {
        self.check(key)?;
        match self.inner.table.lookup(key, Instant::now()) {
            Lookup::Missing => Ok(false),
            Lookup::Expired => {
                self.reclaim(key);
                Ok(false)
            }
            Lookup::Live(_) => Ok(true),
        }
    }

    /// Entries held, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.inner.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.table.is_empty()
    }

    /// Run one sweep immediately instead of waiting for the next tick.
    pub fn sweep_now(&self) -> StoreResult<SweepReport> {
        self.inner.lifecycle.ensure_serving()?;
        Ok(sweeper::sweep(&self.inner.table, &self.inner.queue))
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.inner.table.len(),
            removals_enqueued: self.inner.queue.enqueued(),
            removals_dropped: self.inner.queue.dropped(),
            state: self.inner.lifecycle.state(),
            failed_task: self
                .inner
                .lifecycle
                .health()
                .failed_task()
                .map(str::to_string),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    pub fn is_healthy(&self) -> bool {
        self.inner.lifecycle.health().is_healthy()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Stop the background tasks and wait for them to exit.
    ///
    /// Idempotent. Every operation afterwards fails with
    /// [`StoreError::Closed`].
    pub async fn close(&self) -> StoreResult<()> {
        self.inner.lifecycle.close().await
    }

    fn check(&self, key: &str) -> StoreResult<()> {
        self.inner.lifecycle.ensure_serving()?;
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        Ok(())
    }

    fn reclaim(&self, key: &str) {
        match self.inner.queue.offer(key) {
            Offer::Accepted => {}
            // Counted in `removals_dropped`; the sweeper warns in aggregate.
            Offer::Dropped => debug!(key, "removal queue full; expired key left for the sweeper"),
            Offer::Closed => debug!(key, "removal worker gone; expired key not queued"),
        }
    }
}

impl std::fmt::Debug for TtlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlStore")
            .field("entries", &self.inner.table.len())
            .field("lifecycle", &self.inner.lifecycle)
            .field("config", &self.inner.config)
            .finish()
    }
}
