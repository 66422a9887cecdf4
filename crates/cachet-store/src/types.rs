use cachet_types::Meta;
use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleState;

/// A value read back from the store together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item<T> {
    pub value: T,
    pub meta: Meta,
}

/// Point-in-time view of a store, used by health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Entries held, including expired ones not yet reclaimed.
    pub entries: usize,
    pub removals_enqueued: u64,
    pub removals_dropped: u64,
    pub state: LifecycleState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_task: Option<String>,
}

impl StoreStats {
    /// Running with every background task alive.
    pub fn is_serving(&self) -> bool {
        self.state == LifecycleState::Running && self.failed_task.is_none()
    }
}
