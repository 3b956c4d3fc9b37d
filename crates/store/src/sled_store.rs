//! Sled-backed storage handle

use outbox_core::{StorageBackend, StorageError};
use sled::Db;
use std::path::Path;

/// Durable key/value backend on top of an embedded sled database
pub struct SledStorage {
    db: Db,
}

impl SledStorage {
    /// Open or create the database at the given path
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(Self { db })
    }
}

impl StorageBackend for SledStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self
            .db
            .get(key)
            .map_err(|e| StorageError::Read(e.to_string()))?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.db
            .insert(key, value)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        // Flush to ensure durability
        self.db
            .flush()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.db
            .remove(key)
            .map_err(|e| StorageError::Write(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        Ok(())
    }
}
