//! Run-local scratch storage.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::backend::{StorageBackend, StorageError};

/// In-memory key-value scratch space scoped to one run.
///
/// Created when a run starts and dropped with it; nothing written here
/// outlives the run.
#[derive(Default)]
pub struct EphemeralStore {
    entries: Mutex<HashMap<String, String>>,
}

impl EphemeralStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl StorageBackend for EphemeralStore {
    async fn write(&self, key: &str, content: &str) -> Result<(), StorageError> {
        let _ = self
            .entries
            .lock()
            .insert(key.to_string(), content.to_string());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
