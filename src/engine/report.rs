//! # Status snapshot types.
//!
//! [`EngineReport`] is produced by the loop in a single turn, so it is a
//! consistent picture of the whole engine at one instant.

use std::collections::HashMap;

use serde::Serialize;

/// Loop-atomic snapshot of engine status.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReport {
    /// True once the engine has begun shutting down.
    pub is_dying: bool,
    /// Number of installed manifolds.
    pub manifold_count: usize,
    /// Per-manifold worker status, one entry per installed manifold.
    pub workers: HashMap<String, WorkerReport>,
}

impl EngineReport {
    /// Looks up one worker's status by manifold name.
    pub fn worker(&self, name: &str) -> Option<&WorkerReport> {
        self.workers.get(name)
    }
}

/// Status of a single manifold's worker.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerReport {
    /// A runner has been dispatched but has not yet reported back.
    pub starting: bool,
    /// A stop has been requested and the worker has not yet gone down.
    pub stopping: bool,
    /// A live worker is currently assigned.
    pub running: bool,
    /// The worker's own status, when it exposes the reporter capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<serde_json::Value>,
}
