//! Internal document retrieval boundary.
//!
//! Internal knowledge (strategy decks, field insights) sits behind the
//! opaque [`DocumentIndex`] trait. How documents are indexed and ranked is
//! the provider's concern; the service only consumes scored excerpts.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;

use crate::tool::{Tool, ToolError, ToolOutput};

/// One retrieved document excerpt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentExcerpt {
    /// Source document title.
    pub title: String,
    /// Matched excerpt text.
    pub excerpt: String,
}

/// Opaque retrieval capability over internal documents.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Return the best-matching excerpts for a query. Empty is valid.
    async fn query(&self, query: &str) -> Result<Vec<DocumentExcerpt>, ToolError>;
}

/// Substring-matching index over registered documents.
///
/// Stands in for the production vector index; ranking quality is not part
/// of this service's contract.
#[derive(Default)]
pub struct InMemoryDocumentIndex {
    docs: RwLock<Vec<(String, String)>>,
}

impl InMemoryDocumentIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under a title.
    pub fn add_document(&self, title: impl Into<String>, body: impl Into<String>) {
        self.docs.write().push((title.into(), body.into()));
    }
}

#[async_trait]
impl DocumentIndex for InMemoryDocumentIndex {
    async fn query(&self, query: &str) -> Result<Vec<DocumentExcerpt>, ToolError> {
        let needle = query.to_lowercase();
        let terms: Vec<&str> = needle.split_whitespace().collect();
        let docs = self.docs.read();
        let mut hits = Vec::new();
        for (title, body) in docs.iter() {
            let haystack = format!("{} {}", title.to_lowercase(), body.to_lowercase());
            if terms.iter().any(|t| haystack.contains(t)) {
                hits.push(DocumentExcerpt {
                    title: title.clone(),
                    excerpt: body.chars().take(500).collect(),
                });
            }
        }
        Ok(hits)
    }
}

/// Tool adapter over a [`DocumentIndex`].
pub struct RetrievalTool {
    index: Arc<dyn DocumentIndex>,
}

impl RetrievalTool {
    /// Wrap an index.
    #[must_use]
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for RetrievalTool {
    fn name(&self) -> &str {
        "internal_documents"
    }

    fn description(&self) -> &str {
        "Retrieves and summarizes internal documents (strategy decks, field insights). \
         Outputs: key takeaways and comparative excerpts."
    }

    async fn invoke(&self, query: &str) -> Result<ToolOutput, ToolError> {
        let hits = self.index.query(query).await?;
        if hits.is_empty() {
            return Ok(ToolOutput::no_data(
                "No internal documents matched the query.",
            ));
        }
        let mut text = String::new();
        for hit in &hits {
            text.push_str(&format!("## {}\n{}\n\n", hit.title, hit.excerpt));
        }
        let data = json!(
            hits.iter()
                .map(|h| json!({"title": h.title, "excerpt": h.excerpt}))
                .collect::<Vec<_>>()
        );
        Ok(ToolOutput::with_data(text, data))
    }
}
