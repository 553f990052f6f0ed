//! Per-run delegation ledger.
//!
//! The orchestrator's system-wide anti-looping guard, independent of each
//! worker's internal budget: a worker name is admitted at most twice per
//! run, a worker that reported no data is never re-consulted, and an
//! instruction already issued (after normalization) is not issued again.
//! The ledger lives and dies with one orchestrator run.

use std::collections::{HashMap, HashSet};

/// Maximum invocations of one worker per run.
pub const MAX_CALLS_PER_WORKER: u32 = 2;

/// Why a delegation was denied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DelegationDenied {
    /// The worker hit its per-run invocation ceiling.
    #[error("worker '{0}' already invoked {MAX_CALLS_PER_WORKER} times this run")]
    CeilingReached(String),

    /// The worker previously reported no data; the gap is confirmed.
    #[error("worker '{0}' reported no data; not re-consulting")]
    NoDataTerminal(String),

    /// The same instruction was already dispatched this run.
    #[error("duplicate instruction already dispatched this run")]
    DuplicateInstruction,
}

/// Tracks delegations within a single orchestrator run.
#[derive(Default)]
pub struct DelegationLedger {
    calls: HashMap<String, u32>,
    no_data: HashSet<String>,
    instructions: HashSet<String>,
}

fn normalize(instruction: &str) -> String {
    instruction.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl DelegationLedger {
    /// Create an empty ledger for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a delegation, recording it if allowed.
    pub fn admit(&mut self, worker: &str, instruction: &str) -> Result<(), DelegationDenied> {
        if self.no_data.contains(worker) {
            return Err(DelegationDenied::NoDataTerminal(worker.to_string()));
        }
        let count = self.calls.get(worker).copied().unwrap_or(0);
        if count >= MAX_CALLS_PER_WORKER {
            return Err(DelegationDenied::CeilingReached(worker.to_string()));
        }
        let key = normalize(instruction);
        if !self.instructions.insert(key) {
            return Err(DelegationDenied::DuplicateInstruction);
        }
        let _ = self.calls.insert(worker.to_string(), count + 1);
        Ok(())
    }

    /// Record that a worker reported no data for its instruction.
    pub fn mark_no_data(&mut self, worker: &str) {
        let _ = self.no_data.insert(worker.to_string());
    }

    /// Workers that terminally reported no data this run.
    pub fn no_data_workers(&self) -> impl Iterator<Item = &str> {
        self.no_data.iter().map(String::as_str)
    }

    /// Invocations admitted for a worker so far.
    #[must_use]
    pub fn calls(&self, worker: &str) -> u32 {
        self.calls.get(worker).copied().unwrap_or(0)
    }
}
