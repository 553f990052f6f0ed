//! Offline provider implementations.
//!
//! The generation and search boundaries are external collaborators; this
//! binary ships deterministic offline implementations so the service runs
//! self-contained. `OfflinePlanner` steers every phase with fixed rules
//! keyed off the phase framing, and `CuratedSearch` answers from a small
//! curated corpus. Swap these for real backends at the same seams.

use async_trait::async_trait;
use serde_json::json;

use reagent_core::planner::{Planner, PlannerError, PlannerRequest};
use reagent_tools::{SearchHit, SearchProvider, ToolError};

/// Deterministic planner for offline operation.
///
/// Workers: consult their first tool once, then hand the gathered context
/// back as the answer. Planning: delegate by query keyword. Drafting:
/// assemble the validated findings into a markdown report.
pub struct OfflinePlanner;

fn first_tool(system: &str) -> Option<&str> {
    let rest = system.split("Available tools:\n").nth(1)?;
    let line = rest.lines().next()?.strip_prefix("- ")?;
    line.split(':').next().map(str::trim)
}

fn keyword_delegations(query: &str) -> Vec<(&'static str, bool)> {
    let q = query.to_lowercase();
    let matches = |terms: &[&str]| terms.iter().any(|t| q.contains(t));
    vec![
        ("iqvia-insights-agent", matches(&["market", "sales", "cagr", "revenue", "prescription"])),
        ("patent-landscape-agent", matches(&["patent", "exclusivity", "intellectual property"])),
        ("clinical-trials-agent", matches(&["trial", "clinical", "nct", "phase"])),
        ("exim-trends-agent", matches(&["export", "import", "trade", "shipment"])),
        ("internal-knowledge-agent", matches(&["internal", "memo", "strategy"])),
        ("visualization-agent", matches(&["chart", "visualiz", "graph", "plot"])),
    ]
}

#[async_trait]
impl Planner for OfflinePlanner {
    async fn complete(&self, req: PlannerRequest) -> Result<String, PlannerError> {
        // Worker protocol: one tool consult, then the context is the answer.
        if req.system.contains("Available tools:") {
            if req.context.trim().is_empty() {
                if let Some(tool) = first_tool(&req.system) {
                    return Ok(
                        json!({"action": "tool", "tool": tool, "query": req.query}).to_string()
                    );
                }
                return Ok(json!({"action": "no_data"}).to_string());
            }
            return Ok(json!({"action": "final", "answer": req.context}).to_string());
        }

        if req.system.contains("planning research delegations") {
            let delegations: Vec<_> = keyword_delegations(&req.query)
                .into_iter()
                .filter(|(_, hit)| *hit)
                .map(|(worker, _)| json!({"worker": worker, "instruction": req.query}))
                .collect();
            return Ok(serde_json::Value::Array(delegations).to_string());
        }

        if req.system.contains("interpreting") {
            return Ok(format!("Research objective: {}", req.query));
        }

        if req.system.contains("reconciling") {
            return Ok(req.context);
        }

        if req.system.contains("drafting") {
            return Ok(format!(
                "# Deep Research Report\n\n## Objective\n{}\n\n## Findings\n{}",
                req.query, req.context
            ));
        }

        // Lite responder and anything else: answer from whatever context
        // is available.
        if req.context.trim().is_empty() {
            return Ok("No prior research is available for this session.".to_string());
        }
        Ok(format!(
            "Based on the available research context:\n{}",
            req.context
        ))
    }
}

/// Search provider backed by a small curated corpus.
pub struct CuratedSearch {
    hits: Vec<(&'static [&'static str], SearchHit)>,
}

impl CuratedSearch {
    /// Web flavor: guidelines and news.
    #[must_use]
    pub fn web() -> Self {
        Self {
            hits: vec![
                (
                    &["minocycline", "depression"],
                    SearchHit {
                        title: "Minocycline as adjunct therapy in MDD: meta-analysis".into(),
                        url: "https://example.org/minocycline-mdd-meta".into(),
                        snippet: "Pooled analyses report modest but consistent benefit as an \
                                  adjunct in treatment-resistant depression."
                            .into(),
                    },
                ),
                (
                    &["telmisartan"],
                    SearchHit {
                        title: "Telmisartan repurposing review".into(),
                        url: "https://example.org/telmisartan-repurposing".into(),
                        snippet: "PPAR-gamma modulation underlies interest in metabolic and \
                                  fibrotic indications."
                            .into(),
                    },
                ),
                (
                    &["metformin", "aging"],
                    SearchHit {
                        title: "TAME trial framework".into(),
                        url: "https://example.org/tame-framework".into(),
                        snippet: "Targeting Aging with Metformin outlines endpoints for \
                                  geroprotective labeling."
                            .into(),
                    },
                ),
            ],
        }
    }

    /// Literature flavor: indexed publications.
    #[must_use]
    pub fn literature() -> Self {
        Self {
            hits: vec![
                (
                    &["minocycline"],
                    SearchHit {
                        title: "Anti-inflammatory mechanisms of minocycline in CNS disorders".into(),
                        url: "https://pubmed.example.org/38112211".into(),
                        snippet: "Microglial inhibition and MMP-9 suppression support CNS \
                                  repositioning hypotheses."
                            .into(),
                    },
                ),
                (
                    &["telmisartan", "fibrosis"],
                    SearchHit {
                        title: "ARBs in hepatic fibrosis: preclinical evidence".into(),
                        url: "https://pubmed.example.org/36671852".into(),
                        snippet: "Telmisartan reduced stellate cell activation in rodent NASH \
                                  models."
                            .into(),
                    },
                ),
            ],
        }
    }
}

#[async_trait]
impl SearchProvider for CuratedSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolError> {
        let q = query.to_lowercase();
        Ok(self
            .hits
            .iter()
            .filter(|(terms, _)| terms.iter().any(|t| q.contains(t)))
            .map(|(_, hit)| hit.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn worker_framing_gets_tool_directive_first() {
        let system = "You are a test delegate.\n\nAvailable tools:\n- market_insights: curated market data\n\nReply with exactly one JSON object per turn:";
        let reply = OfflinePlanner
            .complete(PlannerRequest::new(system, "", "metformin market"))
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(v["action"], "tool");
        assert_eq!(v["tool"], "market_insights");
        assert_eq!(v["query"], "metformin market");
    }

    #[tokio::test]
    async fn worker_framing_finalizes_from_context() {
        let system = "charter\n\nAvailable tools:\n- t: stub";
        let reply = OfflinePlanner
            .complete(PlannerRequest::new(system, "## t(q)\ndata\n", "q"))
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(v["action"], "final");
        assert!(v["answer"].as_str().unwrap().contains("data"));
    }

    #[tokio::test]
    async fn planning_delegates_by_keyword() {
        let reply = OfflinePlanner
            .complete(PlannerRequest::new(
                "planning research delegations",
                "",
                "minocycline market size and patent cliff",
            ))
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_str(&reply).unwrap();
        let workers: Vec<&str> = v
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["worker"].as_str().unwrap())
            .collect();
        assert!(workers.contains(&"iqvia-insights-agent"));
        assert!(workers.contains(&"patent-landscape-agent"));
        assert!(!workers.contains(&"exim-trends-agent"));
    }

    #[tokio::test]
    async fn drafting_wraps_findings_in_report() {
        let reply = OfflinePlanner
            .complete(PlannerRequest::new("drafting", "findings body", "the question"))
            .await
            .unwrap();
        assert!(reply.starts_with("# Deep Research Report"));
        assert!(reply.contains("findings body"));
        assert!(reply.contains("the question"));
    }

    #[tokio::test]
    async fn curated_web_search_matches_topics() {
        let hits = CuratedSearch::web()
            .search("minocycline in depression")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].title.contains("Minocycline"));

        let none = CuratedSearch::web().search("zzz unknown").await.unwrap();
        assert!(none.is_empty());
    }
}
