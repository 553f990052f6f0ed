//! Process-wide durable memory tier.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::backend::{StorageBackend, StorageError};

/// Key-value memory shared by every run in the process.
///
/// Last writer wins; values survive run teardown but not process restart.
#[derive(Default)]
pub struct DurableStore {
    entries: RwLock<HashMap<String, String>>,
}

impl DurableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for DurableStore {
    async fn write(&self, key: &str, content: &str) -> Result<(), StorageError> {
        let _ = self
            .entries
            .write()
            .insert(key.to_string(), content.to_string());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        self.entries
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
