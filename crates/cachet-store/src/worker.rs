use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use crate::lifecycle::ShutdownSignal;
use crate::queue::RemovalReceiver;
use crate::table::EntryTable;

/// Removal worker task: deletes queued keys that are still expired.
///
/// Stops when shutdown is requested or every producer is gone. Keys left in
/// the queue at shutdown are abandoned; the table is discarded with the store.
pub async fn run_removal_worker(
    table: Arc<EntryTable>,
    mut rx: RemovalReceiver,
    mut shutdown: ShutdownSignal,
) {
    let mut removed: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            next = rx.recv() => {
                let Some(key) = next else { break };
                if table.remove_if_expired(&key, Instant::now()) {
                    removed += 1;
                    trace!(key = %key, "expired entry removed");
                }
            }
        }
    }
    rx.close();
    debug!(removed, "removal worker stopped");
}
