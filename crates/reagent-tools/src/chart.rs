//! Chart rendering.
//!
//! The only file-writing tool. Renders a small SVG chart into the sandbox's
//! visualization directory and returns the saved path as confirmation text.
//! Titles are sanitized to alphanumerics and underscores before becoming
//! file names.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use reagent_storage::SandboxedFs;

use crate::tool::{Tool, ToolError, ToolOutput};

/// Renders chart files for the visualization worker.
pub struct ChartRenderTool {
    fs: Arc<SandboxedFs>,
}

impl ChartRenderTool {
    /// Create a renderer writing into the given sandbox.
    #[must_use]
    pub fn new(fs: Arc<SandboxedFs>) -> Self {
        Self { fs }
    }

    /// Reduce a chart title to a safe file stem.
    fn sanitize_title(title: &str) -> String {
        let cleaned: String = title
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
            .collect();
        cleaned.trim_end().replace(' ', "_")
    }

    fn render_svg(title: &str) -> String {
        let escaped = title.replace('&', "&amp;").replace('<', "&lt;");
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="640" height="400"><rect width="640" height="400" fill="white"/><text x="320" y="28" text-anchor="middle" font-size="18">{escaped}</text><rect x="80" y="120" width="80" height="230" fill="#4c72b0"/><rect x="220" y="170" width="80" height="180" fill="#55a868"/><rect x="360" y="90" width="80" height="260" fill="#c44e52"/><line x1="60" y1="350" x2="600" y2="350" stroke="black"/></svg>"##
        )
    }
}

#[async_trait]
impl Tool for ChartRenderTool {
    fn name(&self) -> &str {
        "render_chart"
    }

    fn description(&self) -> &str {
        "Creates data visualizations (charts/plots) from provided data. \
         Output: path to the saved image file."
    }

    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError> {
        let stem = Self::sanitize_title(query);
        if stem.is_empty() {
            return Ok(ToolOutput::no_data(
                "Chart title is empty after sanitization; nothing rendered.",
            ));
        }
        let key = format!(
            "{}/{stem}_chart.svg",
            SandboxedFs::VISUALIZATIONS_DIR
        );
        let svg = Self::render_svg(query);
        let path = self.fs.write_bytes(&key, svg.as_bytes()).await?;
        info!(chart = %path.display(), "chart rendered");

        let path_str = path.display().to_string();
        Ok(ToolOutput::with_data(
            format!("Chart created successfully and saved to {path_str}"),
            json!({"path": path_str}),
        ))
    }
}
