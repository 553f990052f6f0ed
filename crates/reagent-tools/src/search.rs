//! External search boundary.
//!
//! Live search (web, literature databases) is consumed as an opaque
//! capability: the service hands a query to a [`SearchProvider`] and gets
//! ranked hits back. The same [`SearchTool`] wrapper serves both the
//! web-intelligence and literature workers, configured with different
//! names and providers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::tool::{Tool, ToolError, ToolOutput};

/// One ranked search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Source URL or identifier.
    pub url: String,
    /// Extracted snippet.
    pub snippet: String,
}

/// Opaque search capability.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a search, returning ranked hits. An empty result is valid.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolError>;
}

/// Tool adapter over a [`SearchProvider`].
pub struct SearchTool {
    name: String,
    description: String,
    provider: Arc<dyn SearchProvider>,
}

impl SearchTool {
    /// Web search instance.
    #[must_use]
    pub fn web(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            name: "web_search".into(),
            description: "Real-time web search for guidelines, scientific publications, news \
                          and patient forums. Outputs: hyperlinked summaries and quotations \
                          from credible sources."
                .into(),
            provider,
        }
    }

    /// Biomedical literature search instance.
    #[must_use]
    pub fn literature(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            name: "pubmed_search".into(),
            description: "Searches biomedical literature for peer-reviewed evidence. \
                          Outputs: citations with abstracts and identifiers."
                .into(),
            provider,
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError> {
        let hits = self.provider.search(query).await?;
        if hits.is_empty() {
            return Ok(ToolOutput::no_data(format!(
                "No results for '{query}'."
            )));
        }
        let mut text = String::new();
        for hit in &hits {
            text.push_str(&format!("- {} ({})\n  {}\n", hit.title, hit.url, hit.snippet));
        }
        let data = json!(
            hits.iter()
                .map(|h| json!({"title": h.title, "url": h.url, "snippet": h.snippet}))
                .collect::<Vec<_>>()
        );
        Ok(ToolOutput::with_data(text, data))
    }
}
