//! Wire events streamed to clients during a run.
//!
//! Every run emits exactly one [`AgentEvent::SessionInfo`] first and exactly
//! one terminal [`AgentEvent::Result`] or [`AgentEvent::Error`] last. `status`,
//! `step`, and `warning` events appear between the two in execution order.
//! Events serialize with a lowercase `type` tag matching the wire protocol.

use serde::{Deserialize, Serialize};

use crate::result::FinalResult;
use crate::step::ExecutionStep;

/// Session context announced at the start of every run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session identifier (client-supplied or generated).
    pub session_id: String,
    /// Ordinal of this query within the session, starting at 1.
    pub query_count: u64,
    /// Resolved pipeline for this query.
    pub agent: String,
    /// Whether this is the session's first query.
    pub is_first_query: bool,
}

/// One event on a run's stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    /// Session context. Always the first event of a run.
    #[serde(rename = "session_info")]
    SessionInfo {
        /// Session payload.
        data: SessionInfo,
    },

    /// Progress note.
    #[serde(rename = "status")]
    Status {
        /// Human-readable progress text.
        content: String,
        /// ISO 8601 timestamp.
        timestamp: String,
    },

    /// One execution trace step.
    #[serde(rename = "step")]
    Step {
        /// The trace entry.
        data: ExecutionStep,
    },

    /// Non-fatal degradation (for example a failed report save).
    #[serde(rename = "warning")]
    Warning {
        /// Human-readable warning text.
        content: String,
    },

    /// Terminal success payload. Always the last event of a successful run.
    #[serde(rename = "result")]
    Result {
        /// The final result.
        data: FinalResult,
    },

    /// Terminal failure. Always the last event of a failed run.
    #[serde(rename = "error")]
    Error {
        /// Human-readable error text.
        content: String,
        /// Session the failure belongs to, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        /// ISO 8601 timestamp, set at transport boundaries.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

impl AgentEvent {
    /// Whether this event terminates a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result { .. } | Self::Error { .. })
    }
}

/// A `session_info` event.
#[must_use]
pub fn session_info_event(data: SessionInfo) -> AgentEvent {
    AgentEvent::SessionInfo { data }
}

/// A `status` event stamped with the current UTC time.
#[must_use]
pub fn status_event(content: impl Into<String>) -> AgentEvent {
    AgentEvent::Status {
        content: content.into(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// A `step` event.
#[must_use]
pub fn step_event(step: ExecutionStep) -> AgentEvent {
    AgentEvent::Step { data: step }
}

/// A `warning` event.
#[must_use]
pub fn warning_event(content: impl Into<String>) -> AgentEvent {
    AgentEvent::Warning {
        content: content.into(),
    }
}

/// A terminal `result` event.
#[must_use]
pub fn result_event(result: FinalResult) -> AgentEvent {
    AgentEvent::Result { data: result }
}

/// A terminal `error` event bound to a session.
#[must_use]
pub fn error_event(content: impl Into<String>, session_id: impl Into<String>) -> AgentEvent {
    AgentEvent::Error {
        content: content.into(),
        session_id: Some(session_id.into()),
        timestamp: None,
    }
}

/// A terminal `error` event with no session context (pre-routing failures).
#[must_use]
pub fn bare_error_event(content: impl Into<String>) -> AgentEvent {
    AgentEvent::Error {
        content: content.into(),
        session_id: None,
        timestamp: None,
    }
}
