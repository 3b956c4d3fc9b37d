//! Offline sync orchestration
//!
//! This crate provides:
//! - `Dispatcher`: drains the persistent queue through the remote gateway
//!   under a bounded retry policy, one drain in flight at a time
//! - `ConnectivityMonitor`: flushes the dispatcher on offline→online edges
//! - `Reconciler`: merges local and remote progress snapshots on resume and
//!   arbitrates confirmed-before-cached progress writes
//!
//! Queued mutations and direct progress writes take independent paths to the
//! remote; there is no defined ordering between a queued mutation and an
//! `advance` call issued around the same time.

pub mod dispatch;
pub mod monitor;
pub mod reconcile;

// Re-exports
pub use dispatch::{Dispatcher, DrainOutcome, DrainReport, RetryPolicy};
pub use monitor::ConnectivityMonitor;
pub use reconcile::Reconciler;
