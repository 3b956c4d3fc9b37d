//! Local durable persistence for the Outbox sync layer
//!
//! This crate provides:
//! - `SledStorage`: sled-backed `StorageBackend` implementation
//! - `PersistentQueue`: ordered durable log of pending mutations
//! - `SnapshotCache`: per-owner write-through progress snapshot cache

pub mod cache;
pub mod queue;
pub mod sled_store;

// Re-exports
pub use cache::SnapshotCache;
pub use queue::PersistentQueue;
pub use sled_store::SledStorage;
