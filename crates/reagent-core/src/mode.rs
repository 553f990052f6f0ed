//! Agent execution modes.
//!
//! A query is answered by exactly one of two pipelines: the multi-worker
//! deep research run or the single-pass lite responder. Mode strings on the
//! wire are lowercase (`"deep"` / `"lite"`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which pipeline handles a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// Full orchestrated research run with delegated workers.
    Deep,
    /// Single-pass responder over persisted reports.
    Lite,
}

impl AgentMode {
    /// Wire string for this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deep => "deep",
            Self::Lite => "lite",
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error produced when a client supplies an unrecognized mode override.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid agent_type '{0}'. Must be 'deep' or 'lite'.")]
pub struct InvalidModeError(pub String);

impl FromStr for AgentMode {
    type Err = InvalidModeError;

    /// Parse a mode override, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deep" => Ok(Self::Deep),
            "lite" => Ok(Self::Lite),
            _ => Err(InvalidModeError(s.to_string())),
        }
    }
}
