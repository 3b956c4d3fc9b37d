//! Write-through progress snapshot cache
//!
//! One storage key per owner. The cache is never authoritative: it only holds
//! what the reconciler has confirmed (or chosen) most recently.

use outbox_core::{ProgressSnapshot, StorageBackend, StorageError};
use std::sync::Arc;
use tracing::warn;

/// Per-owner cached progress snapshots
pub struct SnapshotCache {
    storage: Arc<dyn StorageBackend>,
}

impl SnapshotCache {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn key(owner_id: &str) -> String {
        format!("progress/{}", owner_id)
    }

    /// Load the cached snapshot for an owner
    ///
    /// A corrupt value is treated as absent; an I/O error from the backend is
    /// surfaced so the reconciler never silently picks a fallback.
    pub fn load(&self, owner_id: &str) -> Result<Option<ProgressSnapshot>, StorageError> {
        let bytes = match self.storage.get(&Self::key(owner_id))? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("Corrupt cached snapshot for {}, treating as absent: {}", owner_id, e);
                Ok(None)
            }
        }
    }

    /// Persist a snapshot into the cache
    pub fn store(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(snapshot)
            .map_err(|e| StorageError::Write(e.to_string()))?;
        self.storage.put(&Self::key(&snapshot.owner_id), &bytes)
    }
}
