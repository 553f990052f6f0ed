//! Prefix routing across storage tiers.

use std::sync::Arc;

use crate::backend::{StorageBackend, StorageError};
use crate::durable::DurableStore;
use crate::ephemeral::EphemeralStore;
use crate::sandbox::SandboxedFs;

/// Durable memory route prefix.
pub const MEMORIES_PREFIX: &str = "/memories/";
/// Sandboxed filesystem route prefix.
pub const DISK_PREFIX: &str = "/disk/";

/// Dispatches logical paths to exactly one storage tier.
///
/// The route table is static and ordered; the longest matching prefix wins
/// and is stripped before the call reaches the backend. Paths matching no
/// route go to the ephemeral default.
pub struct StorageRouter {
    routes: Vec<(&'static str, Arc<dyn StorageBackend>)>,
    default: Arc<dyn StorageBackend>,
    disk: Arc<SandboxedFs>,
}

impl StorageRouter {
    /// Standard layout: `/memories/` durable, `/disk/` sandboxed filesystem,
    /// default ephemeral. The durable tier is shared across runs; the
    /// ephemeral tier belongs to this router alone.
    #[must_use]
    pub fn new(durable: Arc<DurableStore>, disk: Arc<SandboxedFs>) -> Self {
        let mut routes: Vec<(&'static str, Arc<dyn StorageBackend>)> = vec![
            (MEMORIES_PREFIX, durable),
            (DISK_PREFIX, Arc::clone(&disk) as Arc<dyn StorageBackend>),
        ];
        // Longest prefix first, so a more specific route always wins.
        routes.sort_by_key(|(p, _)| std::cmp::Reverse(p.len()));
        Self {
            routes,
            default: Arc::new(EphemeralStore::new()),
            disk,
        }
    }

    /// The sandboxed filesystem tier, for direct artifact access.
    #[must_use]
    pub fn disk(&self) -> &Arc<SandboxedFs> {
        &self.disk
    }

    fn resolve<'a>(&'a self, path: &'a str) -> (&'a Arc<dyn StorageBackend>, &'a str, &'static str) {
        for (prefix, backend) in &self.routes {
            if let Some(local) = path.strip_prefix(prefix) {
                return (backend, local, prefix);
            }
        }
        (&self.default, path, "")
    }

    /// Write `content` under the logical `path`.
    pub async fn write(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let (backend, local, _) = self.resolve(path);
        backend.write(local, content).await
    }

    /// Read the value under the logical `path`.
    pub async fn read(&self, path: &str) -> Result<String, StorageError> {
        let (backend, local, _) = self.resolve(path);
        backend.read(local).await
    }

    /// List logical paths under `prefix`, re-joined with their route prefix.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let (backend, local, route) = self.resolve(prefix);
        let keys = backend.list(local).await?;
        Ok(keys.into_iter().map(|k| format!("{route}{k}")).collect())
    }
}
