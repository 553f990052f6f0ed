//! Runtime error taxonomy.
//!
//! Only two failures abort a run: an invalid explicit mode and an upstream
//! generation failure. Everything else is absorbed into warnings or report
//! content. Nothing is retried automatically.

use reagent_core::mode::InvalidModeError;
use reagent_core::planner::PlannerError;
use reagent_storage::StorageError;
use reagent_workers::WorkerError;

/// Failure within the runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The client supplied an unrecognized mode override. Fatal to the
    /// current call only; the session ordinal is still consumed.
    #[error(transparent)]
    InvalidMode(#[from] InvalidModeError),

    /// The black-box generation backend failed. Fatal for the run.
    #[error(transparent)]
    Generation(#[from] PlannerError),

    /// Report or artifact persistence failed. Downgraded to a warning by
    /// the orchestrator; surfacing here means a non-persistence storage
    /// path failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No session with the given id.
    #[error("Session not found")]
    SessionNotFound(String),
}

impl From<WorkerError> for RuntimeError {
    fn from(e: WorkerError) -> Self {
        match e {
            WorkerError::Generation(p) => Self::Generation(p),
        }
    }
}
