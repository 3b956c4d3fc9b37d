//! Injected local durable storage handle
//!
//! The queue and snapshot cache never touch a concrete store directly; they
//! receive a `StorageBackend` handle so tests can substitute an in-memory
//! backend for the sled-backed one.

use crate::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Synchronous single-writer key/value storage
///
/// Implementations must make a completed `put` durable across process
/// restarts (in-memory test backends excepted).
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend for tests and ephemeral embedders
#[derive(Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.map.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.write().remove(key);
        Ok(())
    }
}
