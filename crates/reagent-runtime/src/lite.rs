//! The lite responder.
//!
//! Single-pass answers for follow-up queries: all persisted reports are
//! loaded as a fixed context prefix, generation runs once, and one optional
//! search consult is allowed when the planner signals the reports are
//! insufficient. No workers, no budgets, no trace.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use reagent_core::planner::{Planner, PlannerRequest};
use reagent_storage::StorageRouter;
use reagent_tools::SearchProvider;

use crate::error::RuntimeError;

const LITE_SYSTEM: &str = "You are a research assistant. Answer from the report documents in \
    your context first; they are your primary knowledge. Only if they are insufficient, reply \
    with exactly {\"action\":\"search\",\"query\":\"<query>\"} to consult the internet once. \
    Otherwise reply with the answer directly. Never invent facts; if neither the reports nor \
    the search results contain the answer, say so. Treat the reports as built-in knowledge.";

/// Answers follow-up queries from persisted reports.
pub struct LiteResponder {
    planner: Arc<dyn Planner>,
    search: Arc<dyn SearchProvider>,
}

impl LiteResponder {
    /// Build a responder.
    #[must_use]
    pub fn new(planner: Arc<dyn Planner>, search: Arc<dyn SearchProvider>) -> Self {
        Self { planner, search }
    }

    async fn load_reports(storage: &StorageRouter) -> String {
        let mut context = String::new();
        let Ok(paths) = storage.list("/disk/").await else {
            return context;
        };
        for path in paths.iter().filter(|p| p.ends_with(".md")) {
            if let Ok(body) = storage.read(path).await {
                let name = path.rsplit('/').next().unwrap_or(path);
                context.push_str(&format!("\n\n--- FILE: {name} ---\n{body}"));
            }
        }
        context
    }

    /// Produce one answer for the query.
    #[instrument(skip(self, storage))]
    pub async fn answer(&self, query: &str, storage: &StorageRouter) -> Result<String, RuntimeError> {
        let reports = Self::load_reports(storage).await;
        let reply = self
            .planner
            .complete(PlannerRequest::new(LITE_SYSTEM, &reports, query))
            .await?;

        let Some(search_query) = parse_search_request(&reply) else {
            return Ok(reply);
        };

        // One consult, then the answer is final either way.
        debug!(search_query, "lite responder consulting search");
        let hits = match self.search.search(&search_query).await {
            Ok(hits) => hits,
            Err(e) => {
                debug!(error = %e, "search consult failed; answering from reports");
                Vec::new()
            }
        };
        let mut context = reports;
        context.push_str("\n\n--- SEARCH RESULTS ---\n");
        if hits.is_empty() {
            context.push_str("No results.\n");
        }
        for hit in hits {
            context.push_str(&format!("- {} ({})\n  {}\n", hit.title, hit.url, hit.snippet));
        }
        let answer = self
            .planner
            .complete(PlannerRequest::new(LITE_SYSTEM, &context, query))
            .await?;
        Ok(answer)
    }
}

fn parse_search_request(reply: &str) -> Option<String> {
    let v: Value = serde_json::from_str(reply.trim()).ok()?;
    if v.get("action").and_then(Value::as_str) == Some("search") {
        return v.get("query").and_then(Value::as_str).map(String::from);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reagent_core::planner::PlannerError;
    use reagent_storage::{DurableStore, SandboxedFs};
    use reagent_tools::{SearchHit, ToolError};

    struct ScriptedPlanner {
        replies: Mutex<Vec<String>>,
        seen_context: Mutex<Vec<String>>,
    }

    impl ScriptedPlanner {
        fn new(replies: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
                seen_context: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Planner for ScriptedPlanner {
        async fn complete(&self, req: PlannerRequest) -> Result<String, PlannerError> {
            self.seen_context.lock().push(req.context);
            self.replies
                .lock()
                .pop()
                .ok_or_else(|| PlannerError::Upstream("script exhausted".into()))
        }
    }

    struct OneHitProvider;

    #[async_trait]
    impl SearchProvider for OneHitProvider {
        async fn search(&self, _q: &str) -> Result<Vec<SearchHit>, ToolError> {
            Ok(vec![SearchHit {
                title: "Fresh news".into(),
                url: "https://example.org/news".into(),
                snippet: "latest figures".into(),
            }])
        }
    }

    async fn storage_with_report(dir: &std::path::Path) -> StorageRouter {
        let storage = StorageRouter::new(
            Arc::new(DurableStore::new()),
            Arc::new(SandboxedFs::new(dir)),
        );
        storage
            .write("/disk/deep_report_s1.md", "# Report\nCAGR is -2.1%.")
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn answers_from_reports_in_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with_report(dir.path()).await;
        let planner = ScriptedPlanner::new(vec!["CAGR is -2.1% per the latest report."]);
        let lite = LiteResponder::new(planner.clone(), Arc::new(OneHitProvider));

        let answer = lite.answer("what is the cagr", &storage).await.unwrap();
        assert_eq!(answer, "CAGR is -2.1% per the latest report.");
        // Report text was in the fixed context prefix.
        assert!(planner.seen_context.lock()[0].contains("CAGR is -2.1%"));
        assert!(planner.seen_context.lock()[0].contains("deep_report_s1.md"));
    }

    #[tokio::test]
    async fn insufficiency_triggers_single_search_consult() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with_report(dir.path()).await;
        let planner = ScriptedPlanner::new(vec![
            r#"{"action":"search","query":"latest cagr"}"#,
            "Latest figures say otherwise.",
        ]);
        let lite = LiteResponder::new(planner.clone(), Arc::new(OneHitProvider));

        let answer = lite.answer("latest cagr", &storage).await.unwrap();
        assert_eq!(answer, "Latest figures say otherwise.");
        let contexts = planner.seen_context.lock();
        assert_eq!(contexts.len(), 2);
        assert!(contexts[1].contains("SEARCH RESULTS"));
        assert!(contexts[1].contains("Fresh news"));
    }

    #[tokio::test]
    async fn second_search_request_is_not_honored() {
        // If the planner asks to search again, the raw directive becomes
        // the answer; the consult happens at most once.
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with_report(dir.path()).await;
        let planner = ScriptedPlanner::new(vec![
            r#"{"action":"search","query":"one"}"#,
            r#"{"action":"search","query":"two"}"#,
        ]);
        let lite = LiteResponder::new(planner, Arc::new(OneHitProvider));

        let answer = lite.answer("q", &storage).await.unwrap();
        assert!(answer.contains("two"));
    }

    #[tokio::test]
    async fn empty_report_dir_still_answers() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageRouter::new(
            Arc::new(DurableStore::new()),
            Arc::new(SandboxedFs::new(dir.path())),
        );
        let planner = ScriptedPlanner::new(vec!["No prior research available."]);
        let lite = LiteResponder::new(planner, Arc::new(OneHitProvider));
        let answer = lite.answer("q", &storage).await.unwrap();
        assert_eq!(answer, "No prior research available.");
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage_with_report(dir.path()).await;
        let planner = ScriptedPlanner::new(vec![]);
        let lite = LiteResponder::new(planner, Arc::new(OneHitProvider));
        let err = lite.answer("q", &storage).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Generation(_)));
    }
}
