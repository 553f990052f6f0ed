//! The deep-run orchestrator.
//!
//! One run walks a fixed state sequence: interpret the query, plan the
//! minimum set of delegations, delegate sequentially under the ledger's
//! anti-looping rules, validate findings by source precedence, draft the
//! report, persist it, and materialize artifacts. Worker budgets and the
//! per-run delegation ledger are enforced mechanically here, not left to
//! generated text.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde_json::Value;
use tracing::{info, instrument, warn};

use reagent_core::events::{status_event, step_event, warning_event};
use reagent_core::mode::AgentMode;
use reagent_core::planner::{Planner, PlannerRequest};
use reagent_core::result::FinalResult;
use reagent_core::step::{ExecutionStep, StepRole, ToolCallRecord};
use reagent_storage::{DurableStore, SandboxedFs, StorageRouter};
use reagent_workers::{DelegationLedger, MANDATORY_WORKERS, WorkerOutcome, WorkerRegistry};

use crate::artifacts::ArtifactMaterializer;
use crate::error::RuntimeError;
use crate::stream::{EventSink, StreamClosed};

/// Literal gap statement required in the report for every need a worker
/// could not satisfy.
pub const GAP_STATEMENT: &str = "Data not available from subagent sources.";

const INTERPRET_SYSTEM: &str = "You are the orchestrator of a pharmaceutical research service, \
    interpreting a user query. Identify the molecule, proposed indication, and whether the focus \
    is commercial, clinical, scientific, IP, or sourcing. Reply with a short interpretation.";

const PLAN_SYSTEM: &str = "You are the orchestrator planning research delegations. Choose only \
    the workers that are essential, batch each worker's needs into one comprehensive \
    instruction, and reply with a JSON array of {\"worker\": \"<name>\", \
    \"instruction\": \"<comprehensive instruction>\"} objects and nothing else.";

const VALIDATE_SYSTEM: &str = "You are the orchestrator reconciling research findings. Findings \
    are listed in source-precedence order: peer-reviewed literature first, then guidelines, then \
    official registries, then market and internal data. Where findings conflict, the earlier \
    source wins. Reply with validated findings and note discarded conflicts.";

const DRAFT_SYSTEM: &str = "You are the orchestrator drafting the final strategic report in \
    markdown. Balance scientific credibility, commercial potential, regulatory and IP \
    feasibility, clinical evidence, and unmet needs. Cite the identifiers present in the \
    findings. Never invent numbers, identifiers, or mechanisms.";

/// A planned delegation.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Delegation {
    worker: String,
    instruction: String,
}

/// Why a run stopped before producing a result.
enum RunStop {
    /// Client went away; unwind silently.
    Closed,
    /// Fatal runtime failure; becomes the terminal error event.
    Fatal(RuntimeError),
}

impl From<StreamClosed> for RunStop {
    fn from(_: StreamClosed) -> Self {
        Self::Closed
    }
}

impl From<RuntimeError> for RunStop {
    fn from(e: RuntimeError) -> Self {
        Self::Fatal(e)
    }
}

/// Numbered step emission for one run.
struct StepTracer {
    count: u32,
}

impl StepTracer {
    fn new() -> Self {
        Self { count: 0 }
    }

    async fn emit(
        &mut self,
        sink: &EventSink,
        role: StepRole,
        sender: &str,
        content: impl Into<String>,
        tool_calls: Option<Vec<ToolCallRecord>>,
    ) -> Result<(), StreamClosed> {
        self.count += 1;
        let mut step = ExecutionStep::new(self.count, role, sender, content);
        if let Some(calls) = tool_calls {
            step = step.with_tool_calls(calls);
        }
        sink.emit(step_event(step)).await
    }
}

/// Coordinates one deep research run end to end.
pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    registry: Arc<WorkerRegistry>,
    durable: Arc<DurableStore>,
    disk: Arc<SandboxedFs>,
}

impl Orchestrator {
    /// Build an orchestrator over the shared storage tiers and worker pool.
    #[must_use]
    pub fn new(
        planner: Arc<dyn Planner>,
        registry: Arc<WorkerRegistry>,
        durable: Arc<DurableStore>,
        disk: Arc<SandboxedFs>,
    ) -> Self {
        Self {
            planner,
            registry,
            durable,
            disk,
        }
    }

    /// Execute a deep run, emitting progress on `sink`.
    ///
    /// Returns `Ok(None)` when the client disconnected mid-run.
    #[instrument(skip(self, sink), fields(session_id))]
    pub async fn run(
        &self,
        query: &str,
        session_id: &str,
        sink: &EventSink,
    ) -> Result<Option<FinalResult>, RuntimeError> {
        counter!("reagent_runs_deep_total").increment(1);
        match self.run_inner(query, session_id, sink).await {
            Ok(result) => Ok(Some(result)),
            Err(RunStop::Closed) => {
                info!(session_id, "client disconnected; run abandoned");
                Ok(None)
            }
            Err(RunStop::Fatal(e)) => Err(e),
        }
    }

    async fn run_inner(
        &self,
        query: &str,
        session_id: &str,
        sink: &EventSink,
    ) -> Result<FinalResult, RunStop> {
        sink.emit(status_event("Initiating Deep Research Agent...")).await?;

        // Per-run storage view: fresh ephemeral tier over the shared
        // durable and disk tiers.
        let storage = StorageRouter::new(Arc::clone(&self.durable), Arc::clone(&self.disk));
        let mut tracer = StepTracer::new();
        let mut ledger = DelegationLedger::new();

        // Existing reports inform interpretation and planning, so a need
        // already answered on disk is not re-delegated.
        let existing_reports = storage.list("/disk/").await.unwrap_or_default();
        let mut report_context = if existing_reports.is_empty() {
            String::from("No previously produced reports.")
        } else {
            format!("Previously produced reports: {}", existing_reports.join(", "))
        };
        let memories = storage.list("/memories/").await.unwrap_or_default();
        if !memories.is_empty() {
            report_context.push_str(&format!("\nLong-term memory keys: {}", memories.join(", ")));
        }

        // INTERPRET
        let interpretation = self
            .planner
            .complete(PlannerRequest::new(INTERPRET_SYSTEM, &report_context, query))
            .await
            .map_err(RuntimeError::from)?;
        tracer
            .emit(sink, StepRole::Assistant, "orchestrator", &interpretation, None)
            .await?;

        // PLAN
        let plan_context = format!(
            "Interpretation:\n{interpretation}\n\nAvailable workers:\n{}\n\n{report_context}",
            self.registry.roster()
        );
        let plan_reply = self
            .planner
            .complete(PlannerRequest::new(PLAN_SYSTEM, &plan_context, query))
            .await
            .map_err(RuntimeError::from)?;
        let plan = parse_plan(&plan_reply, query);
        tracer
            .emit(
                sink,
                StepRole::Assistant,
                "orchestrator",
                format!("Planned {} delegation(s).", plan.len()),
                Some(
                    plan.iter()
                        .map(|d| ToolCallRecord {
                            name: d.worker.clone(),
                            args: serde_json::json!({"instruction": d.instruction}),
                        })
                        .collect(),
                ),
            )
            .await?;

        // DELEGATE — sequential, one worker call in flight at a time.
        let mut findings: Vec<(String, reagent_workers::SourceRank, String)> = Vec::new();
        for delegation in plan {
            if let Err(denied) = ledger.admit(&delegation.worker, &delegation.instruction) {
                tracer
                    .emit(
                        sink,
                        StepRole::System,
                        "orchestrator",
                        format!("Delegation to {} skipped: {denied}", delegation.worker),
                        None,
                    )
                    .await?;
                continue;
            }
            let Some(worker) = self.registry.get(&delegation.worker) else {
                tracer
                    .emit(
                        sink,
                        StepRole::System,
                        "orchestrator",
                        format!("Unknown worker '{}' in plan; skipped.", delegation.worker),
                        None,
                    )
                    .await?;
                continue;
            };

            let report = worker
                .invoke(&delegation.instruction)
                .await
                .map_err(RuntimeError::from)?;
            if report.budget_exhausted {
                warn!(worker = %report.worker, "worker budget exhausted; partial result retained");
            }

            match &report.outcome {
                WorkerOutcome::Answer(answer) => {
                    // Raw worker output goes to the run-local scratch tier.
                    let key = format!("subagents/{}-{}", report.worker, ledger.calls(&report.worker));
                    storage.write(&key, answer).await.map_err(RuntimeError::from)?;
                    findings.push((report.worker.clone(), report.source_rank, answer.clone()));
                    tracer
                        .emit(sink, StepRole::Assistant, &report.worker, answer, None)
                        .await?;
                }
                WorkerOutcome::NoData => {
                    ledger.mark_no_data(&report.worker);
                    tracer
                        .emit(sink, StepRole::Assistant, &report.worker, "No data found.", None)
                        .await?;
                }
            }
        }

        // VALIDATE — findings ordered by source precedence before review.
        findings.sort_by_key(|(_, rank, _)| *rank);
        let findings_block = findings
            .iter()
            .map(|(worker, rank, text)| format!("=== {worker} ({rank:?}) ===\n{text}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let validated = self
            .planner
            .complete(PlannerRequest::new(VALIDATE_SYSTEM, &findings_block, query))
            .await
            .map_err(RuntimeError::from)?;
        tracer
            .emit(sink, StepRole::Assistant, "orchestrator", &validated, None)
            .await?;

        // DRAFT
        let draft_context = format!("Validated findings:\n{validated}\n\nRaw findings:\n{findings_block}");
        let mut report_text = self
            .planner
            .complete(PlannerRequest::new(DRAFT_SYSTEM, &draft_context, query))
            .await
            .map_err(RuntimeError::from)?;

        // Confirmed gaps are stated mechanically, never left to generation.
        let gaps: Vec<&str> = ledger.no_data_workers().collect();
        if !gaps.is_empty() {
            report_text.push_str("\n\n## Data Gaps\n");
            for worker in gaps {
                report_text.push_str(&format!("- {worker}: {GAP_STATEMENT}\n"));
            }
        }
        tracer
            .emit(sink, StepRole::Assistant, "orchestrator", &report_text, None)
            .await?;

        // PERSIST — failure downgrades to a warning; the run still completes.
        let report_filename = format!(
            "deep_report_{session_id}_{}.md",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let mut file_path = None;
        let mut report_base64 = None;
        let mut saved_filename = None;
        match storage.write(&format!("/disk/{report_filename}"), &report_text).await {
            Ok(()) => {
                let on_disk = self.disk.root().join(&report_filename);
                sink.emit(status_event(format!("Report saved to {report_filename}")))
                    .await?;
                report_base64 = self.encode_report(&report_filename).await;
                file_path = Some(on_disk.display().to_string());
                saved_filename = Some(report_filename);
            }
            Err(e) => {
                warn!(error = %e, "failed to save report");
                sink.emit(warning_event(format!("Could not save report file: {e}")))
                    .await?;
            }
        }

        // Artifacts
        sink.emit(status_event("Processing visualizations...")).await?;
        let materializer = ArtifactMaterializer::for_output_dir(self.disk.root());
        let images = materializer.collect().await;
        if !images.is_empty() {
            sink.emit(status_event(format!("Found {} visualization(s)", images.len())))
                .await?;
        }

        info!(steps = tracer.count, images = images.len(), "deep run complete");

        Ok(FinalResult {
            agent: AgentMode::Deep,
            text: report_text,
            images,
            file_path,
            report_base64,
            report_filename: saved_filename,
            session_id: session_id.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            total_steps: Some(tracer.count),
        })
    }

    async fn encode_report(&self, filename: &str) -> Option<String> {
        use base64::Engine as _;
        match self.disk.read_bytes(filename).await {
            Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Err(e) => {
                warn!(error = %e, "failed to encode report to base64");
                None
            }
        }
    }
}

/// Parse the planner's delegation plan.
///
/// Mandatory workers are appended with the raw query as instruction when
/// the plan omits them; an unparseable plan degrades to the mandatory
/// workers alone.
fn parse_plan(reply: &str, query: &str) -> Vec<Delegation> {
    let trimmed = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let mut plan: Vec<Delegation> = Vec::new();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        for item in items {
            if let (Some(worker), Some(instruction)) = (
                item.get("worker").and_then(Value::as_str),
                item.get("instruction").and_then(Value::as_str),
            ) {
                plan.push(Delegation {
                    worker: worker.to_string(),
                    instruction: instruction.to_string(),
                });
            }
        }
    }

    for name in MANDATORY_WORKERS {
        if !plan.iter().any(|d| d.worker == name) {
            plan.push(Delegation {
                worker: name.to_string(),
                instruction: query.to_string(),
            });
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reagent_core::events::AgentEvent;
    use reagent_core::planner::PlannerError;
    use reagent_tools::{InMemoryDocumentIndex, SearchHit, SearchProvider, ToolError};
    use tokio::sync::mpsc::Receiver;

    /// Planner that answers by phase marker and scripts worker directives.
    struct PhasePlanner {
        plan_reply: String,
        fail_on_draft: bool,
        worker_replies: Mutex<Vec<String>>,
    }

    impl PhasePlanner {
        fn new(plan_reply: &str, worker_replies: Vec<&str>) -> Self {
            Self {
                plan_reply: plan_reply.to_string(),
                fail_on_draft: false,
                worker_replies: Mutex::new(
                    worker_replies.into_iter().rev().map(String::from).collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl Planner for PhasePlanner {
        async fn complete(&self, req: PlannerRequest) -> Result<String, PlannerError> {
            if req.system.starts_with("You are the orchestrator") {
                if req.system.contains("interpreting") {
                    return Ok("Molecule: minocycline; focus: repurposing.".into());
                }
                if req.system.contains("planning research delegations") {
                    return Ok(self.plan_reply.clone());
                }
                if req.system.contains("reconciling") {
                    return Ok("Validated findings.".into());
                }
                if req.system.contains("drafting") {
                    if self.fail_on_draft {
                        return Err(PlannerError::Upstream("provider down".into()));
                    }
                    return Ok("# Strategic Report\nFindings body.".into());
                }
            }
            // Worker loop call.
            Ok(self
                .worker_replies
                .lock()
                .pop()
                .unwrap_or_else(|| r#"{"action":"final","answer":"worker answer"}"#.into()))
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl SearchProvider for EmptyProvider {
        async fn search(&self, _q: &str) -> Result<Vec<SearchHit>, ToolError> {
            Ok(vec![SearchHit {
                title: "hit".into(),
                url: "https://example.org".into(),
                snippet: "snippet".into(),
            }])
        }
    }

    fn orchestrator(dir: &std::path::Path, planner: Arc<dyn Planner>) -> Orchestrator {
        let disk = Arc::new(SandboxedFs::new(dir));
        let registry = Arc::new(WorkerRegistry::standard(
            Arc::clone(&planner),
            Arc::new(EmptyProvider),
            Arc::new(EmptyProvider),
            Arc::new(InMemoryDocumentIndex::new()),
            Arc::clone(&disk),
        ));
        Orchestrator::new(planner, registry, Arc::new(DurableStore::new()), disk)
    }

    async fn drain(mut rx: Receiver<AgentEvent>) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        events
    }

    #[tokio::test]
    async fn run_produces_report_and_persists_it() {
        let dir = tempfile::tempdir().unwrap();
        let planner: Arc<dyn Planner> = Arc::new(PhasePlanner::new(
            r#"[{"worker":"web-intelligence-agent","instruction":"search guidelines"},
                {"worker":"pubmed-agent","instruction":"search literature"}]"#,
            vec![
                r#"{"action":"final","answer":"guideline summary"}"#,
                r#"{"action":"final","answer":"literature summary"}"#,
            ],
        ));
        let orch = orchestrator(dir.path(), planner);
        let (sink, rx) = EventSink::channel();
        let consumer = tokio::spawn(drain(rx));

        let result = orch.run("q", "s1", &sink).await.unwrap().unwrap();
        drop(sink);
        let events = consumer.await.unwrap();
        assert_eq!(result.agent, AgentMode::Deep);
        assert!(result.text.contains("Strategic Report"));
        assert!(result.report_filename.as_deref().unwrap().starts_with("deep_report_s1_"));
        assert!(result.report_base64.is_some());
        assert!(result.total_steps.unwrap() >= 5);

        // The report really landed under the sandbox root.
        let saved = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("deep_report_"))
            .count();
        assert_eq!(saved, 1);

        let statuses: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::Status { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect();
        assert!(statuses[0].contains("Initiating Deep Research Agent"));
        assert!(statuses.iter().any(|s| s.contains("Report saved to")));
    }

    #[tokio::test]
    async fn mandatory_workers_are_added_to_sparse_plans() {
        let plan = parse_plan(r#"[{"worker":"iqvia-insights-agent","instruction":"market"}]"#, "q");
        let names: Vec<&str> = plan.iter().map(|d| d.worker.as_str()).collect();
        assert!(names.contains(&"web-intelligence-agent"));
        assert!(names.contains(&"pubmed-agent"));
        assert_eq!(names[0], "iqvia-insights-agent");
    }

    #[tokio::test]
    async fn unparseable_plan_degrades_to_mandatory_workers() {
        let plan = parse_plan("I will research broadly.", "the query");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].instruction, "the query");
    }

    #[tokio::test]
    async fn no_data_worker_yields_gap_statement() {
        let dir = tempfile::tempdir().unwrap();
        // exim worker consults its tool with an unknown molecule and then
        // relays no data; plan also repeats the worker to check the ledger.
        let planner: Arc<dyn Planner> = Arc::new(PhasePlanner::new(
            r#"[{"worker":"exim-trends-agent","instruction":"imports of unobtainium"},
                {"worker":"exim-trends-agent","instruction":"imports again"}]"#,
            vec![
                r#"{"action":"no_data"}"#,
                r#"{"action":"final","answer":"web summary"}"#,
                r#"{"action":"final","answer":"pubmed summary"}"#,
            ],
        ));
        let orch = orchestrator(dir.path(), planner);
        let (sink, rx) = EventSink::channel();
        let consumer = tokio::spawn(drain(rx));

        let result = orch.run("q", "s1", &sink).await.unwrap().unwrap();
        drop(sink);
        let events = consumer.await.unwrap();

        assert!(result.text.contains(GAP_STATEMENT));
        // Second delegation to the same worker was denied by the ledger.
        let skipped = events.iter().any(|e| {
            matches!(e, AgentEvent::Step { data } if data.content.contains("skipped")
                && data.content.contains("exim-trends-agent"))
        });
        assert!(skipped);
    }

    #[tokio::test]
    async fn generation_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut planner = PhasePlanner::new("[]", vec![]);
        planner.fail_on_draft = true;
        let orch = orchestrator(dir.path(), Arc::new(planner));
        let (sink, rx) = EventSink::channel();
        let consumer = tokio::spawn(drain(rx));

        let err = orch.run("q", "s1", &sink).await.unwrap_err();
        drop(sink);
        let _ = consumer.await.unwrap();
        assert!(matches!(err, RuntimeError::Generation(_)));
    }

    #[tokio::test]
    async fn disconnect_abandons_run_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let planner: Arc<dyn Planner> = Arc::new(PhasePlanner::new("[]", vec![]));
        let orch = orchestrator(dir.path(), planner);
        let (sink, rx) = EventSink::channel();
        drop(rx);

        let result = orch.run("q", "s1", &sink).await.unwrap();
        assert!(result.is_none());
    }
}
