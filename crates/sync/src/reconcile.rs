//! Progress snapshot reconciliation
//!
//! On resume, the locally cached snapshot and the remote authoritative
//! snapshot are compared and the winner becomes the new cache content.
//! Subsequent progress writes go straight to the remote and reach the cache
//! only after the remote confirms them, so an unconfirmed step is never
//! cached as if committed. This path bypasses the mutation queue entirely.

use outbox_core::{ProgressSnapshot, ReconcileError, RemoteGateway};
use outbox_store::SnapshotCache;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Merges local and remote snapshots and arbitrates progress writes
pub struct Reconciler {
    cache: Arc<SnapshotCache>,
    gateway: Arc<dyn RemoteGateway>,
}

impl Reconciler {
    pub fn new(cache: Arc<SnapshotCache>, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { cache, gateway }
    }

    /// Select the authoritative snapshot for an owner at resume time
    ///
    /// Merge policy, in priority order:
    /// - remote absent, local present: local wins and is published remotely
    /// - local absent, remote present: remote wins
    /// - both present: strictly higher step wins; ties go to the remote,
    ///   which represents a server-confirmed write while the local copy of
    ///   the same step may be an unconfirmed duplicate
    ///
    /// Local storage errors and remote transport errors are surfaced, not
    /// swallowed: silently picking a fallback risks regressing confirmed
    /// progress. The winner is persisted into the write-through cache.
    pub async fn resume(
        &self,
        owner_id: &str,
    ) -> Result<Option<ProgressSnapshot>, ReconcileError> {
        let (local, remote) = tokio::join!(
            async { self.cache.load(owner_id) },
            self.gateway.read(owner_id)
        );
        let local = local?;
        let remote = remote?;

        let winner = match (local, remote) {
            (Some(local), None) => {
                info!(
                    "Remote snapshot absent for {}, publishing local step {}",
                    owner_id, local.step
                );
                // The local winner stands even if the publish fails; the next
                // advance or resume gets another chance to push it.
                if let Err(e) = self
                    .gateway
                    .upsert(owner_id, local.step, &local.data)
                    .await
                {
                    warn!("Failed to publish local snapshot for {}: {}", owner_id, e);
                }
                Some(local)
            }
            (None, Some(remote)) => {
                debug!("No local snapshot for {}, adopting remote step {}", owner_id, remote.step);
                Some(remote)
            }
            (Some(local), Some(remote)) => {
                if local.step > remote.step {
                    debug!(
                        "Local step {} ahead of remote {} for {}",
                        local.step, remote.step, owner_id
                    );
                    Some(local)
                } else {
                    debug!(
                        "Remote step {} wins over local {} for {}",
                        remote.step, local.step, owner_id
                    );
                    Some(remote)
                }
            }
            (None, None) => None,
        };

        if let Some(winner) = &winner {
            self.cache.store(winner)?;
        }
        Ok(winner)
    }

    /// Advance an owner's progress, remote-first
    ///
    /// The remote upsert happens before any local mutation; on failure the
    /// error propagates and the cache stays at its prior step. A cache write
    /// failure after a confirmed remote write is logged and swallowed: a
    /// stale-low cache is safe because the remote wins ties on resume.
    pub async fn advance(
        &self,
        owner_id: &str,
        new_step: u64,
        new_data: Value,
    ) -> Result<(), ReconcileError> {
        self.gateway.upsert(owner_id, new_step, &new_data).await?;

        let confirmed = ProgressSnapshot::new(owner_id, new_step, new_data);
        if let Err(e) = self.cache.store(&confirmed) {
            warn!(
                "Remote confirmed step {} for {} but caching failed: {}",
                new_step, owner_id, e
            );
        }

        debug!("Advanced {} to step {}", owner_id, new_step);
        Ok(())
    }
}
