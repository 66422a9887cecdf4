use serde::{Deserialize, Serialize};

/// HTTP endpoint paths for the Cachet API.
pub mod endpoints {
    pub const API_PREFIX: &str = "/api/v1";
    pub const SET: &str = "/api/v1/set/:key";
    pub const GET: &str = "/api/v1/get/:key";
    pub const DELETE: &str = "/api/v1/delete/:key";
    pub const HAS: &str = "/api/v1/has/:key";
    pub const HEALTH: &str = "/api/v1/health";
}

/// Health check response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` while serving, `"unavailable"` otherwise.
    pub status: String,
    pub version: String,
    /// Store lifecycle state: `running`, `draining`, or `closed`.
    pub state: String,
    pub entries: usize,
    pub removals_enqueued: u64,
    pub removals_dropped: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_task: Option<String>,
}

impl HealthResponse {
    pub const OK: &'static str = "ok";
    pub const UNAVAILABLE: &'static str = "unavailable";

    pub fn is_ok(&self) -> bool {
        self.status == Self::OK
    }
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: Self::OK.into(),
            version: env!("CARGO_PKG_VERSION").into(),
            state: "running".into(),
            entries: 0,
            removals_enqueued: 0,
            removals_dropped: 0,
            failed_task: None,
        }
    }
}
