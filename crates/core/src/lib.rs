//! Shared types and trait seams for the Outbox sync layer
//!
//! This crate provides:
//! - Queue item and progress snapshot data structures
//! - The `RemoteGateway` trait (remote read/upsert/deliver contract)
//! - The `StorageBackend` trait (injected local durable storage handle)
//! - In-memory implementations of both for tests and embedded use

pub mod error;
pub mod gateway;
pub mod item;
pub mod snapshot;
pub mod storage;

// Re-exports
pub use error::{GatewayError, ReconcileError, StorageError};
pub use gateway::{MemoryGateway, RemoteGateway};
pub use item::{QueueItem, Target, Verb};
pub use snapshot::ProgressSnapshot;
pub use storage::{MemoryStorage, StorageBackend};

/// Get current timestamp in milliseconds
pub fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("System time before UNIX epoch")
        .as_millis() as u64
}
