//! Remote gateway contract
//!
//! The gateway is a thin delivery/read/upsert surface with no retry logic of
//! its own; retry policy belongs entirely to its callers.

use crate::{GatewayError, ProgressSnapshot, Target};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::Value;

/// Contract for reading and upserting the authoritative remote snapshot and
/// delivering queued mutations
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Read the authoritative snapshot for an owner; `None` means not found
    async fn read(&self, owner_id: &str) -> Result<Option<ProgressSnapshot>, GatewayError>;

    /// Upsert an owner's snapshot
    ///
    /// Must be idempotent for a repeated identical `(owner_id, step)` pair
    /// and must never apply a partial update.
    async fn upsert(&self, owner_id: &str, step: u64, data: &Value) -> Result<(), GatewayError>;

    /// Deliver one queued mutation to its target
    async fn deliver(&self, target: &Target, payload: &Value) -> Result<(), GatewayError>;
}

/// In-memory gateway for tests and local development
///
/// Records every delivery and upsert in arrival order, and can be scripted
/// to fail upcoming calls.
#[derive(Default)]
pub struct MemoryGateway {
    snapshots: DashMap<String, ProgressSnapshot>,
    delivered: Mutex<Vec<(Target, Value)>>,
    upserts: Mutex<Vec<(String, u64)>>,
    deliver_failures: Mutex<Vec<GatewayError>>,
    upsert_failures: Mutex<Vec<GatewayError>>,
    read_failures: Mutex<Vec<GatewayError>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a remote snapshot directly
    pub fn seed_snapshot(&self, snapshot: ProgressSnapshot) {
        self.snapshots.insert(snapshot.owner_id.clone(), snapshot);
    }

    /// Script the next `count` deliveries to fail with clones of `error`
    pub fn fail_deliveries(&self, count: usize, error: GatewayError) {
        let mut failures = self.deliver_failures.lock();
        for _ in 0..count {
            failures.push(error.clone());
        }
    }

    /// Script the next `count` upserts to fail with clones of `error`
    pub fn fail_upserts(&self, count: usize, error: GatewayError) {
        let mut failures = self.upsert_failures.lock();
        for _ in 0..count {
            failures.push(error.clone());
        }
    }

    /// Script the next `count` reads to fail with clones of `error`
    pub fn fail_reads(&self, count: usize, error: GatewayError) {
        let mut failures = self.read_failures.lock();
        for _ in 0..count {
            failures.push(error.clone());
        }
    }

    /// Deliveries accepted so far, in arrival order
    pub fn delivered(&self) -> Vec<(Target, Value)> {
        self.delivered.lock().clone()
    }

    /// `(owner_id, step)` pairs of accepted upserts, in arrival order
    pub fn upserts(&self) -> Vec<(String, u64)> {
        self.upserts.lock().clone()
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn read(&self, owner_id: &str) -> Result<Option<ProgressSnapshot>, GatewayError> {
        if let Some(error) = pop_front(&self.read_failures) {
            return Err(error);
        }
        Ok(self.snapshots.get(owner_id).map(|s| s.value().clone()))
    }

    async fn upsert(&self, owner_id: &str, step: u64, data: &Value) -> Result<(), GatewayError> {
        if let Some(error) = pop_front(&self.upsert_failures) {
            return Err(error);
        }

        // An accepted step never decreases; a stale upsert is ignored rather
        // than rejected, which keeps repeated identical upserts idempotent.
        let mut stale = false;
        self.snapshots
            .entry(owner_id.to_string())
            .and_modify(|existing| {
                if step >= existing.step {
                    existing.step = step;
                    existing.data = data.clone();
                } else {
                    stale = true;
                }
            })
            .or_insert_with(|| ProgressSnapshot::new(owner_id, step, data.clone()));

        if !stale {
            self.upserts.lock().push((owner_id.to_string(), step));
        }
        Ok(())
    }

    async fn deliver(&self, target: &Target, payload: &Value) -> Result<(), GatewayError> {
        if let Some(error) = pop_front(&self.deliver_failures) {
            return Err(error);
        }
        self.delivered.lock().push((target.clone(), payload.clone()));
        Ok(())
    }
}

fn pop_front(failures: &Mutex<Vec<GatewayError>>) -> Option<GatewayError> {
    let mut failures = failures.lock();
    if failures.is_empty() {
        None
    } else {
        Some(failures.remove(0))
    }
}
