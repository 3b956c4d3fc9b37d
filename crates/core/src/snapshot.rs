//! Versioned progress snapshots

use serde::{Deserialize, Serialize};

/// A versioned progress record for one owner
///
/// `step` is monotonically non-decreasing per owner on the remote store. A
/// locally cached snapshot must always be treated as potentially stale
/// relative to the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Owner identifier (supplied by the identity/session layer)
    pub owner_id: String,
    /// Monotonic progress step
    pub step: u64,
    /// Opaque payload carried alongside the step
    pub data: serde_json::Value,
}

impl ProgressSnapshot {
    pub fn new(owner_id: impl Into<String>, step: u64, data: serde_json::Value) -> Self {
        Self {
            owner_id: owner_id.into(),
            step,
            data,
        }
    }
}
