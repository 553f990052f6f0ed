//! Final run results and materialized artifacts.

use serde::{Deserialize, Serialize};

use crate::mode::AgentMode;

/// A chart image materialized from the visualization directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageArtifact {
    /// File name, without directory components.
    pub filename: String,
    /// MIME type derived from the file extension.
    pub mime_type: String,
    /// Base64-encoded file bytes.
    pub base64: String,
    /// Raw size before encoding.
    pub size_bytes: u64,
}

/// The terminal payload of a successful run.
///
/// Deep runs populate the report fields and `total_steps`; lite runs carry
/// only the answer text with an empty image list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    /// Which pipeline produced the result.
    pub agent: AgentMode,
    /// Response text in markdown format.
    pub text: String,
    /// Materialized chart images.
    pub images: Vec<ImageArtifact>,
    /// Storage path of the persisted report, if one was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Base64-encoded content of the persisted report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_base64: Option<String>,
    /// File name of the persisted report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_filename: Option<String>,
    /// Session the run belongs to.
    pub session_id: String,
    /// ISO 8601 timestamp of completion.
    pub timestamp: String,
    /// Number of trace steps the run produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
}

impl FinalResult {
    /// A lite result: answer text only, no artifacts.
    #[must_use]
    pub fn lite(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            agent: AgentMode::Lite,
            text: text.into(),
            images: Vec::new(),
            file_path: None,
            report_base64: None,
            report_filename: None,
            session_id: session_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            total_steps: None,
        }
    }
}
