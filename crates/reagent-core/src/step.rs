//! Execution trace steps.
//!
//! A deep run produces an append-only sequence of [`ExecutionStep`]s, one per
//! observable state transition. Steps are immutable once recorded and are
//! streamed to clients 1:1 as `step` events.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a trace step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    /// Reasoning output from the orchestrator or a worker.
    Assistant,
    /// A tool invocation result.
    Tool,
    /// Pipeline bookkeeping (phase transitions, policy notes).
    System,
}

/// A tool invocation recorded on a step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Tool name.
    pub name: String,
    /// Arguments as passed to the tool.
    pub args: Value,
}

/// One entry in a run's execution trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// 1-based position in the trace.
    pub step_number: u32,
    /// Who produced the step.
    pub role: StepRole,
    /// Step content. Empty string if the transition carried no text.
    pub content: String,
    /// Originating component (worker name, orchestrator, tool name).
    pub sender: String,
    /// ISO 8601 timestamp.
    pub timestamp: String,
    /// Tool calls issued at this step, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRecord>>,
}

impl ExecutionStep {
    /// Create a step with the current UTC timestamp and no tool calls.
    #[must_use]
    pub fn new(
        step_number: u32,
        role: StepRole,
        sender: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            step_number,
            role,
            content: content.into(),
            sender: sender.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_calls: None,
        }
    }

    /// Attach tool call records to this step.
    #[must_use]
    pub fn with_tool_calls(mut self, calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = Some(calls);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_without_tool_calls_field_when_none() {
        let step = ExecutionStep::new(1, StepRole::Assistant, "orchestrator", "planning");
        let v = serde_json::to_value(&step).unwrap();
        assert_eq!(v["step_number"], 1);
        assert_eq!(v["role"], "assistant");
        assert_eq!(v["sender"], "orchestrator");
        assert!(v.get("tool_calls").is_none());
    }

    #[test]
    fn serializes_tool_calls_when_present() {
        let step = ExecutionStep::new(2, StepRole::Tool, "market-worker", "")
            .with_tool_calls(vec![ToolCallRecord {
                name: "market_insights".into(),
                args: json!({"query": "metformin"}),
            }]);
        let v = serde_json::to_value(&step).unwrap();
        assert_eq!(v["tool_calls"][0]["name"], "market_insights");
        assert_eq!(v["tool_calls"][0]["args"]["query"], "metformin");
    }

    #[test]
    fn roles_use_lowercase_wire_strings() {
        assert_eq!(serde_json::to_string(&StepRole::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&StepRole::Tool).unwrap(), "\"tool\"");
    }
}
