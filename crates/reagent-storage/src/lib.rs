//! # reagent-storage
//!
//! The tiered storage layer behind the research runtime.
//!
//! Three backends sit behind one [`StorageBackend`] trait:
//!
//! - [`EphemeralStore`] — run-local scratch, dropped with the run
//! - [`DurableStore`] — process-wide key-value memory, survives across runs
//! - [`SandboxedFs`] — real files under a fixed output root, with lexical
//!   path-escape rejection
//!
//! The [`StorageRouter`] dispatches each logical path to exactly one backend
//! by longest matching prefix: `/memories/` to the durable tier, `/disk/` to
//! the sandboxed filesystem, everything else to the ephemeral tier.

#![deny(unsafe_code)]

mod backend;
mod durable;
mod ephemeral;
mod router;
mod sandbox;

pub use backend::{StorageBackend, StorageError};
pub use durable::DurableStore;
pub use ephemeral::EphemeralStore;
pub use router::StorageRouter;
pub use sandbox::{SandboxedFs, resolve_sandboxed};
