//! Sandboxed filesystem tier.
//!
//! Real files under a fixed output root. Path validation is purely lexical:
//! `.` and `..` components are normalized without touching the filesystem,
//! and any path that would climb above the root is rejected before any I/O
//! happens. Symlinks are not followed for validation purposes.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::backend::{StorageBackend, StorageError};

/// Resolve `key` against `root`, rejecting any lexical escape.
///
/// Leading separators are ignored so `/report.md` and `report.md` address
/// the same sandbox entry. Returns the absolute on-disk path.
pub fn resolve_sandboxed(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
    let relative = key.trim_start_matches('/');
    let mut resolved = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(StorageError::Escape(key.to_string()));
                }
            }
            // Absolute markers were stripped above; anything left is hostile.
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::Escape(key.to_string()));
            }
        }
    }

    if resolved.as_os_str().is_empty() {
        return Err(StorageError::Escape(key.to_string()));
    }

    Ok(root.join(resolved))
}

/// Filesystem storage rooted at the service output directory.
///
/// Reports land directly under the root; chart images land under
/// `visualizations/`.
pub struct SandboxedFs {
    root: PathBuf,
}

impl SandboxedFs {
    /// Subdirectory chart files are written into.
    pub const VISUALIZATIONS_DIR: &'static str = "visualizations";

    /// Create a sandbox rooted at `root`. The directory is created lazily
    /// on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The sandbox root on disk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the visualization directory.
    #[must_use]
    pub fn visualizations_root(&self) -> PathBuf {
        self.root.join(Self::VISUALIZATIONS_DIR)
    }

    /// Write raw bytes under `key`. Used for chart files.
    pub async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = resolve_sandboxed(&self.root, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(key, bytes = bytes.len(), "sandbox write");
        Ok(path)
    }

    /// Read raw bytes under `key`.
    pub async fn read_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = resolve_sandboxed(&self.root, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[async_trait]
impl StorageBackend for SandboxedFs {
    async fn write(&self, key: &str, content: &str) -> Result<(), StorageError> {
        let _ = self.write_bytes(key, content.as_bytes()).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<String, StorageError> {
        let bytes = self.read_bytes(key).await?;
        String::from_utf8(bytes)
            .map_err(|e| StorageError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        // Shallow listing of the root; reports are flat files there.
        let mut names = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(StorageError::Io(e)),
        };
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(prefix) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
