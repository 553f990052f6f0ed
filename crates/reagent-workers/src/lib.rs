//! # reagent-workers
//!
//! Budget-governed research delegates.
//!
//! - [`Budget`] — per-run call ceilings with explicit exhaustion actions
//! - [`Worker`] — the governed generation/tool loop behind one capability
//! - [`WorkerRegistry`] — the fixed eight-worker pool
//! - [`DelegationLedger`] — the orchestrator's per-run anti-looping guard
//!
//! Governance here is mechanical: ceilings deny calls rather than advising
//! against them, and a worker's reported absence of data is terminal for
//! the run.

#![deny(unsafe_code)]

mod budget;
mod ledger;
mod registry;
mod worker;

pub use budget::{Budget, BudgetExceeded, BudgetKind, ExhaustedAction};
pub use ledger::{DelegationDenied, DelegationLedger, MAX_CALLS_PER_WORKER};
pub use registry::{MANDATORY_WORKERS, WorkerRegistry};
pub use worker::{SourceRank, Worker, WorkerError, WorkerOutcome, WorkerReport};
