use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::time::{interval_at, MissedTickBehavior};
use tracing::{debug, warn};

use crate::lifecycle::ShutdownSignal;
use crate::queue::{Offer, RemovalQueue};
use crate::table::EntryTable;

/// Summary of a single sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired keys found in the table.
    pub expired: usize,
    /// Keys handed to the removal worker.
    pub queued: usize,
    /// Keys skipped because the queue was full.
    pub dropped: usize,
}

/// Scan `table` once and offer every expired key to `queue`.
///
/// Keys that do not fit stay in the table and are picked up by a later sweep.
pub fn sweep(table: &EntryTable, queue: &RemovalQueue) -> SweepReport {
    let expired = table.expired_keys(Instant::now());
    let mut report = SweepReport {
        expired: expired.len(),
        ..SweepReport::default()
    };

    for key in &expired {
        match queue.offer(key) {
            Offer::Accepted => report.queued += 1,
            Offer::Dropped => report.dropped += 1,
            Offer::Closed => {
                debug!(expired = report.expired, "removal worker gone; sweep abandoned");
                return report;
            }
        }
    }

    if report.dropped > 0 {
        warn!(
            expired = report.expired,
            dropped = report.dropped,
            capacity = queue.capacity(),
            "removal queue full; expired keys left for the next sweep"
        );
    } else if report.expired > 0 {
        debug!(expired = report.expired, queued = report.queued, "sweep complete");
    }
    report
}

/// Periodic sweeper task. The first sweep happens one `every` after start.
pub async fn run_sweeper(
    table: Arc<EntryTable>,
    queue: RemovalQueue,
    every: Duration,
    mut shutdown: ShutdownSignal,
) {
    let mut ticker = interval_at(tokio::time::Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            _ = ticker.tick() => {
                sweep(&table, &queue);
            }
        }
    }
    debug!("sweeper stopped");
}
