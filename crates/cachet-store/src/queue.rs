use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};

/// Receiving half of the removal queue, owned by the removal worker.
pub type RemovalReceiver = mpsc::Receiver<String>;

/// Outcome of offering a key to the removal queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The key is queued for removal.
    Accepted,
    /// The queue was full; the key was not queued.
    Dropped,
    /// The removal worker is gone (store closed).
    Closed,
}

#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
}

/// Bounded queue of keys waiting to be removed.
///
/// Cloning yields another producer for the same queue. [`offer`](Self::offer)
/// never waits: a full queue drops the key and bumps the drop counter.
#[derive(Debug, Clone)]
pub struct RemovalQueue {
    tx: mpsc::Sender<String>,
    counters: Arc<QueueCounters>,
    capacity: usize,
}

impl RemovalQueue {
    /// Create a queue holding at most `capacity` keys (minimum 1).
    pub fn bounded(capacity: usize) -> (Self, RemovalReceiver) {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let queue = Self {
            tx,
            counters: Arc::new(QueueCounters::default()),
            capacity,
        };
        (queue, rx)
    }

    /// Try to queue `key` for removal without blocking.
    pub fn offer(&self, key: &str) -> Offer {
        match self.tx.try_send(key.to_string()) {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                Offer::Accepted
            }
            Err(TrySendError::Full(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                Offer::Dropped
            }
            Err(TrySendError::Closed(_)) => Offer::Closed,
        }
    }

    /// Total keys accepted since creation.
    pub fn enqueued(&self) -> u64 {
        self.counters.enqueued.load(Ordering::Relaxed)
    }

    /// Total keys dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.counters.dropped.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
