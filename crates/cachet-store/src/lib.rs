//! Concurrent TTL store for Cachet.
//!
//! Keys map to opaque payloads produced by [`cachet_codec::ValueCodec`],
//! each with creation/modification timestamps and an absolute expiration
//! instant. Expired entries are invisible to readers immediately and are
//! physically removed in the background.
//!
//! # Components
//!
//! - [`EntryTable`] -- `RwLock<HashMap>` of live and not-yet-reclaimed entries
//! - [`RemovalQueue`] -- bounded, non-blocking queue of keys to reclaim
//! - sweeper -- periodic task that scans the table for expired keys
//! - removal worker -- task that drains the queue and deletes keys
//! - [`Lifecycle`] -- supervises both tasks; `Running -> Draining -> Closed`
//! - [`TtlStore`] -- the public handle tying it all together
//!
//! # Design Rules
//!
//! 1. Values are encoded before the write lock is taken; a failed encode
//!    leaves the table untouched.
//! 2. Readers decide expiration themselves; the sweeper only reclaims memory.
//! 3. Submitting a key for removal never blocks. A full queue drops the key,
//!    counts the drop, and leaves the entry for the next sweep.
//! 4. Removal is idempotent and only deletes entries that are still expired.
//! 5. `close()` returns only after every background task has stopped.
//! 6. A panicking background task marks the store unhealthy; it keeps
//!    refusing work instead of serving without expiration.

pub mod config;
pub mod entry;
pub mod error;
pub mod lifecycle;
pub mod queue;
pub mod store;
pub mod sweeper;
pub mod table;
pub mod traits;
pub mod types;
pub mod worker;

pub use config::StoreConfig;
pub use entry::Entry;
pub use error::{StoreError, StoreResult};
pub use lifecycle::{Health, Lifecycle, LifecycleState, ShutdownSignal, TaskGroup};
pub use queue::{Offer, RemovalQueue, RemovalReceiver};
pub use store::TtlStore;
pub use sweeper::SweepReport;
pub use table::{EntryTable, Lookup};
pub use traits::KeyValueStore;
pub use types::{Item, StoreStats};

pub use cachet_types::Meta;
