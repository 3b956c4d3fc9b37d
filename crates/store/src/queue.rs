//! Durable ordered log of pending mutations
//!
//! The entire queue lives under one storage key as a single JSON array, so
//! insertion order is preserved across reloads. Queue persistence is
//! best-effort by design: a failed write is logged and swallowed, which makes
//! the affected enqueue lossy. Callers that need confirmed writes use the
//! reconciler's direct path instead of the queue.

use outbox_core::{QueueItem, StorageBackend, Target};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use ulid::Ulid;

/// Storage key holding the serialized queue
pub const QUEUE_KEY: &str = "pending-queue";

/// Durable FIFO of pending mutations
///
/// Single-owner: exactly one queue instance owns the durable log at a time.
pub struct PersistentQueue {
    storage: Arc<dyn StorageBackend>,
    items: Mutex<Vec<QueueItem>>,
}

impl PersistentQueue {
    /// Open the queue, loading any persisted items
    ///
    /// An absent or corrupt value loads as an empty queue, never an error.
    pub fn open(storage: Arc<dyn StorageBackend>) -> Self {
        let items = match storage.get(QUEUE_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<QueueItem>>(&bytes) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Corrupt queue data, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load queue, starting empty: {}", e);
                Vec::new()
            }
        };

        debug!("Queue opened with {} pending items", items.len());

        Self {
            storage,
            items: Mutex::new(items),
        }
    }

    /// Append a mutation, returning its id
    ///
    /// Returns immediately without waiting for delivery.
    pub fn enqueue(&self, target: Target, payload: Value) -> Ulid {
        let item = QueueItem::new(target, payload);
        let id = item.id;

        let mut items = self.items.lock();
        items.push(item);
        self.persist(&items);

        debug!("Enqueued item {} ({} pending)", id, items.len());
        id
    }

    /// Ordered copy of the current items, without removing them
    pub fn drain(&self) -> Vec<QueueItem> {
        self.items.lock().clone()
    }

    /// Remove exactly one entry by id; a no-op if absent
    pub fn remove(&self, id: &Ulid) {
        let mut items = self.items.lock();
        let before = items.len();
        items.retain(|item| item.id != *id);
        if items.len() != before {
            self.persist(&items);
        }
    }

    /// Increment an item's attempt counter, returning the new count
    pub fn bump_attempts(&self, id: &Ulid) -> Option<u32> {
        let mut items = self.items.lock();
        let attempts = items.iter_mut().find(|item| item.id == *id).map(|item| {
            item.attempts += 1;
            item.attempts
        })?;
        self.persist(&items);
        Some(attempts)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Persist the full ordered collection under the single queue key
    ///
    /// Write failures are swallowed: the queue is best-effort, and failing
    /// the caller here would break the fire-and-forget enqueue contract.
    fn persist(&self, items: &[QueueItem]) {
        let bytes = match serde_json::to_vec(items) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to serialize queue ({} items): {}", items.len(), e);
                return;
            }
        };

        if let Err(e) = self.storage.put(QUEUE_KEY, &bytes) {
            warn!("Failed to persist queue ({} items): {}", items.len(), e);
        }
    }
}
