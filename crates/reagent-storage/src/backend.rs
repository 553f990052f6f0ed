//! The storage backend trait and error type.

use async_trait::async_trait;

/// Failure from a storage operation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No value stored under the key.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The path would resolve outside the sandbox root.
    #[error("path escapes storage root: {0}")]
    Escape(String),

    /// Underlying filesystem failure.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One storage tier.
///
/// Keys are backend-local: the router strips its route prefix before
/// dispatching, so a write to `/disk/report.md` reaches the filesystem
/// backend as `report.md`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `content` under `key`, replacing any previous value.
    async fn write(&self, key: &str, content: &str) -> Result<(), StorageError>;

    /// Fetch the value under `key`.
    async fn read(&self, key: &str) -> Result<String, StorageError>;

    /// List stored keys beginning with `prefix`. An empty prefix lists all.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}
