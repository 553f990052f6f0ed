//! The governed worker loop.
//!
//! A worker wraps one domain capability: a charter, a small fixed toolset,
//! and a budget template. Each `invoke` runs an isolated loop of generation
//! and tool dispatch under a fresh budget. The planner steers the loop with
//! small JSON directives; anything unparseable is taken as the final answer,
//! so a plain-text reply still terminates the run.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use reagent_core::planner::{Planner, PlannerError, PlannerRequest};
use reagent_tools::Tool;

use crate::budget::{Budget, ExhaustedAction};

/// Evidence precedence class of a worker's sources.
///
/// Lower ranks win conflicts during validation: peer-reviewed literature
/// over guidelines, guidelines over official registries, registries over
/// market and internal data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceRank {
    /// Peer-reviewed literature.
    Literature,
    /// Regulatory and clinical guidelines.
    Guidelines,
    /// Official registries (trials, patents).
    Registries,
    /// Market, trade, and internal data.
    Market,
}

/// What a worker run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// A usable answer.
    Answer(String),
    /// The worker's sources had nothing for this instruction.
    NoData,
}

/// Structured result of one worker invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerReport {
    /// Worker name.
    pub worker: String,
    /// Answer or explicit absence.
    pub outcome: WorkerOutcome,
    /// Generation calls spent.
    pub model_calls: u32,
    /// Tool dispatches spent.
    pub tool_calls: u32,
    /// Whether the run was cut short by its model-call ceiling.
    pub budget_exhausted: bool,
    /// Evidence precedence of this worker's sources.
    pub source_rank: SourceRank,
}

/// Failure from a worker invocation.
///
/// Only generation failures propagate; tool failures are folded into the
/// worker's context and the loop continues.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The generation backend failed. Fatal for the surrounding run.
    #[error(transparent)]
    Generation(#[from] PlannerError),
}

/// Directive parsed from a planner reply.
#[derive(Debug, PartialEq, Eq)]
enum Directive {
    Tool { name: String, query: String },
    Final(String),
    NoData,
}

fn parse_directive(text: &str) -> Directive {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        match v.get("action").and_then(Value::as_str) {
            Some("tool") => {
                if let (Some(name), Some(query)) = (
                    v.get("tool").and_then(Value::as_str),
                    v.get("query").and_then(Value::as_str),
                ) {
                    return Directive::Tool {
                        name: name.to_string(),
                        query: query.to_string(),
                    };
                }
            }
            Some("no_data") => return Directive::NoData,
            Some("final") => {
                if let Some(answer) = v.get("answer").and_then(Value::as_str) {
                    return Directive::Final(answer.to_string());
                }
            }
            _ => {}
        }
    }
    Directive::Final(text.trim().to_string())
}

/// A bounded, budget-governed research delegate.
pub struct Worker {
    name: String,
    description: String,
    charter: String,
    tools: Vec<Arc<dyn Tool>>,
    planner: Arc<dyn Planner>,
    budget_template: Budget,
    source_rank: SourceRank,
}

impl Worker {
    /// Build a worker.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        charter: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
        planner: Arc<dyn Planner>,
        budget_template: Budget,
        source_rank: SourceRank,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            charter: charter.into(),
            tools,
            planner,
            budget_template,
            source_rank,
        }
    }

    /// Worker name, as referenced by the orchestrator's plan.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability summary shown to the planning phase.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Evidence precedence of this worker's sources.
    #[must_use]
    pub fn source_rank(&self) -> SourceRank {
        self.source_rank
    }

    fn system_framing(&self) -> String {
        let tool_list = self
            .tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{charter}\n\nAvailable tools:\n{tool_list}\n\n\
             Reply with exactly one JSON object per turn:\n\
             {{\"action\":\"tool\",\"tool\":\"<name>\",\"query\":\"<query>\"}} to consult a tool,\n\
             {{\"action\":\"final\",\"answer\":\"<markdown>\"}} when done,\n\
             {{\"action\":\"no_data\"}} if your sources cannot answer.",
            charter = self.charter
        )
    }

    fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Run the worker against one instruction under a fresh budget.
    #[instrument(skip(self), fields(worker = %self.name))]
    pub async fn invoke(&self, instruction: &str) -> Result<WorkerReport, WorkerError> {
        let mut budget = self.budget_template.clone();
        let system = self.system_framing();
        let mut context = String::new();
        let mut tools_suppressed = false;
        let mut budget_exhausted = false;
        let mut all_tools_empty = true;
        let mut any_tool_called = false;

        let outcome = loop {
            if budget.consume_model().is_err() {
                // Model overrun ends the run; keep whatever was gathered.
                warn!(worker = %self.name, "model call budget exhausted");
                budget_exhausted = true;
                break if context.is_empty() {
                    WorkerOutcome::NoData
                } else {
                    WorkerOutcome::Answer(context.clone())
                };
            }

            let reply = self
                .planner
                .complete(PlannerRequest::new(&system, &context, instruction))
                .await?;

            match parse_directive(&reply) {
                Directive::Final(answer) => break WorkerOutcome::Answer(answer),
                Directive::NoData => break WorkerOutcome::NoData,
                Directive::Tool { name, query } => {
                    if tools_suppressed {
                        context.push_str("\n[tool dispatch suppressed: budget exhausted]");
                        continue;
                    }
                    match budget.consume_tool() {
                        Err(e) if e.action == ExhaustedAction::Continue => {
                            tools_suppressed = true;
                            context.push_str(
                                "\n[tool call budget exhausted; answer from gathered context]",
                            );
                            continue;
                        }
                        Err(_) => {
                            budget_exhausted = true;
                            break if context.is_empty() {
                                WorkerOutcome::NoData
                            } else {
                                WorkerOutcome::Answer(context.clone())
                            };
                        }
                        Ok(()) => {}
                    }
                    any_tool_called = true;
                    let Some(tool) = self.tool(&name) else {
                        context.push_str(&format!("\n[unknown tool: {name}]"));
                        continue;
                    };
                    match tool.invoke(&query).await {
                        Ok(out) => {
                            if !out.no_data {
                                all_tools_empty = false;
                            }
                            debug!(tool = %name, no_data = out.no_data, "tool dispatched");
                            context.push_str(&format!("\n## {name}({query})\n{}\n", out.text));
                        }
                        Err(e) => {
                            // Tool failure is content, not a run failure.
                            warn!(tool = %name, error = %e, "tool failed");
                            context.push_str(&format!("\n[tool {name} failed: {e}]"));
                        }
                    }
                }
            }
        };

        // A worker whose every tool came back empty has no grounding for
        // an answer; report the gap instead of fabricating one.
        let outcome = match outcome {
            WorkerOutcome::Answer(a) if a.trim().is_empty() => WorkerOutcome::NoData,
            WorkerOutcome::Answer(a) if any_tool_called && all_tools_empty => {
                debug!(worker = %self.name, answer_len = a.len(), "all tools empty, reporting no data");
                WorkerOutcome::NoData
            }
            other => other,
        };

        Ok(WorkerReport {
            worker: self.name.clone(),
            outcome,
            model_calls: budget.model_calls(),
            tool_calls: budget.tool_calls(),
            budget_exhausted,
            source_rank: self.source_rank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reagent_tools::{ToolError, ToolOutput};
    use std::sync::Mutex;

    /// Planner that replays scripted replies.
    struct ScriptedPlanner {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedPlanner {
        fn new(replies: Vec<&str>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().map(String::from).collect()),
            })
        }
    }

    #[async_trait]
    impl Planner for ScriptedPlanner {
        async fn complete(&self, _req: PlannerRequest) -> Result<String, PlannerError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| PlannerError::Upstream("script exhausted".into()))
        }
    }

    struct StubTool {
        name: &'static str,
        output: ToolOutput,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "stub"
        }
        async fn invoke(&self, _query: &str) -> Result<ToolOutput, ToolError> {
            Ok(self.output.clone())
        }
    }

    fn worker(planner: Arc<dyn Planner>, tools: Vec<Arc<dyn Tool>>, budget: Budget) -> Worker {
        Worker::new(
            "test-agent",
            "test delegate",
            "You are a test delegate.",
            tools,
            planner,
            budget,
            SourceRank::Market,
        )
    }

    #[tokio::test]
    async fn final_directive_ends_run() {
        let planner = ScriptedPlanner::new(vec![r#"{"action":"final","answer":"done"}"#]);
        let w = worker(planner, vec![], Budget::standard());
        let report = w.invoke("q").await.unwrap();
        assert_eq!(report.outcome, WorkerOutcome::Answer("done".into()));
        assert_eq!(report.model_calls, 1);
        assert_eq!(report.tool_calls, 0);
        assert!(!report.budget_exhausted);
    }

    #[tokio::test]
    async fn plain_text_reply_is_final() {
        let planner = ScriptedPlanner::new(vec!["Just an answer."]);
        let w = worker(planner, vec![], Budget::standard());
        let report = w.invoke("q").await.unwrap();
        assert_eq!(report.outcome, WorkerOutcome::Answer("Just an answer.".into()));
    }

    #[tokio::test]
    async fn tool_then_final() {
        let planner = ScriptedPlanner::new(vec![
            r#"{"action":"tool","tool":"market_insights","query":"metformin"}"#,
            r#"{"action":"final","answer":"market is small"}"#,
        ]);
        let tool: Arc<dyn Tool> = Arc::new(StubTool {
            name: "market_insights",
            output: ToolOutput::text("size 0.8bn"),
        });
        let w = worker(planner, vec![tool], Budget::standard());
        let report = w.invoke("metformin market").await.unwrap();
        assert_eq!(report.tool_calls, 1);
        assert_eq!(report.model_calls, 2);
        assert_eq!(report.outcome, WorkerOutcome::Answer("market is small".into()));
    }

    #[tokio::test]
    async fn tool_budget_continue_suppresses_but_finishes() {
        // Budget of 1 tool call; second request is suppressed, worker still
        // produces a final answer.
        let planner = ScriptedPlanner::new(vec![
            r#"{"action":"tool","tool":"t","query":"a"}"#,
            r#"{"action":"tool","tool":"t","query":"b"}"#,
            r#"{"action":"final","answer":"from gathered context"}"#,
        ]);
        let tool: Arc<dyn Tool> = Arc::new(StubTool {
            name: "t",
            output: ToolOutput::text("data"),
        });
        let w = worker(
            planner,
            vec![tool],
            Budget::new(10, ExhaustedAction::Halt, 1, ExhaustedAction::Continue),
        );
        let report = w.invoke("q").await.unwrap();
        assert_eq!(report.outcome, WorkerOutcome::Answer("from gathered context".into()));
        assert_eq!(report.tool_calls, 1);
        assert!(!report.budget_exhausted);
    }

    #[tokio::test]
    async fn model_budget_halt_keeps_partial() {
        // One model call allowed: it requests a tool, then the next model
        // call is denied and the gathered context becomes the partial answer.
        let planner = ScriptedPlanner::new(vec![
            r#"{"action":"tool","tool":"t","query":"a"}"#,
        ]);
        let tool: Arc<dyn Tool> = Arc::new(StubTool {
            name: "t",
            output: ToolOutput::text("partial data"),
        });
        let w = worker(
            planner,
            vec![tool],
            Budget::new(1, ExhaustedAction::Halt, 3, ExhaustedAction::Continue),
        );
        let report = w.invoke("q").await.unwrap();
        assert!(report.budget_exhausted);
        match report.outcome {
            WorkerOutcome::Answer(text) => assert!(text.contains("partial data")),
            WorkerOutcome::NoData => panic!("partial context should be kept"),
        }
    }

    #[tokio::test]
    async fn no_data_directive() {
        let planner = ScriptedPlanner::new(vec![r#"{"action":"no_data"}"#]);
        let w = worker(planner, vec![], Budget::standard());
        let report = w.invoke("q").await.unwrap();
        assert_eq!(report.outcome, WorkerOutcome::NoData);
    }

    #[tokio::test]
    async fn all_tools_empty_downgrades_answer_to_no_data() {
        let planner = ScriptedPlanner::new(vec![
            r#"{"action":"tool","tool":"t","query":"x"}"#,
            r#"{"action":"final","answer":"made up text"}"#,
        ]);
        let tool: Arc<dyn Tool> = Arc::new(StubTool {
            name: "t",
            output: ToolOutput::no_data("nothing"),
        });
        let w = worker(planner, vec![tool], Budget::standard());
        let report = w.invoke("q").await.unwrap();
        assert_eq!(report.outcome, WorkerOutcome::NoData);
    }

    #[tokio::test]
    async fn planner_failure_propagates() {
        let planner = ScriptedPlanner::new(vec![]);
        let w = worker(planner, vec![], Budget::standard());
        let err = w.invoke("q").await.unwrap_err();
        assert!(matches!(err, WorkerError::Generation(_)));
    }

    #[test]
    fn directive_parser_handles_fences() {
        let d = parse_directive("```json\n{\"action\":\"no_data\"}\n```");
        assert_eq!(d, Directive::NoData);
    }
}
