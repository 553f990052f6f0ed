//! The text-generation boundary.
//!
//! Orchestrator phases and workers obtain reasoning text through the
//! [`Planner`] trait. The service treats generation as a black box: it sends
//! a system framing, accumulated context, and the query, and receives text.
//! Providers live behind `Arc<dyn Planner>` so the runtime never depends on
//! a concrete backend.

use async_trait::async_trait;

/// A single generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerRequest {
    /// Role framing for the request (orchestrator phase or worker charter).
    pub system: String,
    /// Accumulated context: trace excerpts, tool outputs, stored reports.
    pub context: String,
    /// The instruction or user query to answer.
    pub query: String,
}

impl PlannerRequest {
    /// Build a request.
    #[must_use]
    pub fn new(
        system: impl Into<String>,
        context: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            system: system.into(),
            context: context.into(),
            query: query.into(),
        }
    }
}

/// Failure from the generation backend.
///
/// Any planner failure is terminal for the run that issued it; the runtime
/// never retries generation.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// The upstream provider rejected or failed the request.
    #[error("generation failed: {0}")]
    Upstream(String),

    /// The provider returned content the caller could not use.
    #[error("unusable generation output: {0}")]
    Malformed(String),
}

/// Object-safe text-generation provider.
#[async_trait]
pub trait Planner: Send + Sync {
    /// Produce a completion for the request.
    async fn complete(&self, req: PlannerRequest) -> Result<String, PlannerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct EchoPlanner;

    #[async_trait]
    impl Planner for EchoPlanner {
        async fn complete(&self, req: PlannerRequest) -> Result<String, PlannerError> {
            Ok(format!("{}|{}", req.system, req.query))
        }
    }

    #[tokio::test]
    async fn planner_is_object_safe() {
        let planner: Arc<dyn Planner> = Arc::new(EchoPlanner);
        let out = planner
            .complete(PlannerRequest::new("sys", "", "q"))
            .await
            .unwrap();
        assert_eq!(out, "sys|q");
    }

    #[test]
    fn errors_render() {
        let e = PlannerError::Upstream("rate limited".into());
        assert_eq!(e.to_string(), "generation failed: rate limited");
    }
}
