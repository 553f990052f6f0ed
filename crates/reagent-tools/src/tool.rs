//! The tool trait and shared output types.

use async_trait::async_trait;
use serde_json::Value;

use reagent_storage::StorageError;

/// Failure from a tool invocation.
///
/// Absence of data is not an error; tools signal it through
/// [`ToolOutput::no_data`] so budget accounting still applies to the call.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// An external provider failed.
    #[error("provider error: {0}")]
    Provider(String),

    /// A storage-backed tool hit the storage layer's error.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of a tool invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutput {
    /// Rendered text for the worker's context window.
    pub text: String,
    /// Structured payload, when the tool has one.
    pub data: Value,
    /// Whether the tool had nothing for this query.
    pub no_data: bool,
}

impl ToolOutput {
    /// Output with both rendered text and a structured payload.
    #[must_use]
    pub fn with_data(text: impl Into<String>, data: Value) -> Self {
        Self {
            text: text.into(),
            data,
            no_data: false,
        }
    }

    /// Text-only output.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            data: Value::Null,
            no_data: false,
        }
    }

    /// Explicit no-data signal.
    #[must_use]
    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            text: message.into(),
            data: Value::Null,
            no_data: true,
        }
    }
}

/// Object-safe tool interface.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name, as referenced in worker plans.
    fn name(&self) -> &str;

    /// What the tool answers, shown to the planner.
    fn description(&self) -> &str;

    /// Run the tool against a free-text query.
    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_output_carries_message() {
        let out = ToolOutput::no_data("Data not available for this molecule.");
        assert!(out.no_data);
        assert_eq!(out.data, Value::Null);
        assert!(out.text.contains("not available"));
    }

    #[test]
    fn with_data_is_not_no_data() {
        let out = ToolOutput::with_data("x", serde_json::json!({"a": 1}));
        assert!(!out.no_data);
        assert_eq!(out.data["a"], 1);
    }
}
