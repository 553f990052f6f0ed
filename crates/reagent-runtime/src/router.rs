//! Session-based query routing.
//!
//! One routed call is one independent run. The router admits the query into
//! its session, resolves the pipeline (an explicit override wins, otherwise
//! the session's first query goes deep and the rest lite), announces the
//! session on the stream, and drives the chosen pipeline behind an error
//! boundary that turns any fatal failure into a terminal error event.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{error, info};

use reagent_core::events::{
    AgentEvent, SessionInfo, bare_error_event, error_event, result_event, session_info_event,
    status_event,
};
use reagent_core::mode::AgentMode;
use reagent_core::result::FinalResult;
use reagent_storage::{DurableStore, SandboxedFs, StorageRouter};

use crate::lite::LiteResponder;
use crate::orchestrator::Orchestrator;
use crate::session::{SessionStore, SessionTicket};
use crate::stream::EventSink;

/// One routed query.
#[derive(Clone, Debug)]
pub struct QueryRequest {
    /// The research question.
    pub query: String,
    /// Optional pipeline override, `"deep"` or `"lite"`.
    pub agent_type: Option<String>,
    /// Session to continue; a new one is created when absent or unknown.
    pub session_id: Option<String>,
}

/// Routes queries to the deep or lite pipeline per session state.
pub struct SessionRouter {
    sessions: Arc<SessionStore>,
    orchestrator: Orchestrator,
    lite: LiteResponder,
    durable: Arc<DurableStore>,
    disk: Arc<SandboxedFs>,
}

impl SessionRouter {
    /// Build the router over shared session and storage state.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionStore>,
        orchestrator: Orchestrator,
        lite: LiteResponder,
        durable: Arc<DurableStore>,
        disk: Arc<SandboxedFs>,
    ) -> Self {
        Self {
            sessions,
            orchestrator,
            lite,
            durable,
            disk,
        }
    }

    /// The shared session table.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Start a run for the request, returning its event stream.
    ///
    /// The run executes on its own task; dropping the receiver stops it at
    /// the next emit.
    pub fn route(self: &Arc<Self>, request: QueryRequest) -> mpsc::Receiver<AgentEvent> {
        let (sink, rx) = EventSink::channel();
        let this = Arc::clone(self);
        drop(tokio::spawn(async move {
            this.execute(request, sink).await;
        }));
        rx
    }

    async fn execute(&self, request: QueryRequest, sink: EventSink) {
        // The ordinal is consumed before validation, so a rejected
        // override still advances the session.
        let ticket = self.sessions.begin_query(request.session_id.as_deref());

        let mode = match request.agent_type.as_deref() {
            Some(raw) => match raw.parse::<AgentMode>() {
                Ok(mode) => mode,
                Err(e) => {
                    let _ = sink.emit(bare_error_event(e.to_string())).await;
                    return;
                }
            },
            None => {
                if ticket.is_first_query {
                    AgentMode::Deep
                } else {
                    AgentMode::Lite
                }
            }
        };

        counter!("reagent_queries_routed_total", "agent" => mode.as_str()).increment(1);
        info!(
            session_id = %ticket.session_id,
            query_count = ticket.query_count,
            agent = %mode,
            "routing query"
        );

        if sink
            .emit(session_info_event(SessionInfo {
                session_id: ticket.session_id.clone(),
                query_count: ticket.query_count,
                agent: mode.to_string(),
                is_first_query: ticket.is_first_query,
            }))
            .await
            .is_err()
        {
            return;
        }

        match mode {
            AgentMode::Deep => self.run_deep(&request.query, &ticket, &sink).await,
            AgentMode::Lite => self.run_lite(&request.query, &ticket, &sink).await,
        }
    }

    async fn run_deep(&self, query: &str, ticket: &SessionTicket, sink: &EventSink) {
        match self.orchestrator.run(query, &ticket.session_id, sink).await {
            Ok(Some(result)) => {
                let _ = sink.emit(result_event(result)).await;
            }
            Ok(None) => {}
            Err(e) => {
                error!(session_id = %ticket.session_id, error = %e, "deep run failed");
                let _ = sink
                    .emit(error_event(
                        format!("Deep Agent failed: {e}"),
                        &ticket.session_id,
                    ))
                    .await;
            }
        }
    }

    async fn run_lite(&self, query: &str, ticket: &SessionTicket, sink: &EventSink) {
        if sink
            .emit(status_event("Consulting Lite Agent..."))
            .await
            .is_err()
        {
            return;
        }
        let storage = StorageRouter::new(Arc::clone(&self.durable), Arc::clone(&self.disk));
        match self.lite.answer(query, &storage).await {
            Ok(text) => {
                let result = FinalResult::lite(text, &ticket.session_id);
                let _ = sink.emit(result_event(result)).await;
            }
            Err(e) => {
                error!(session_id = %ticket.session_id, error = %e, "lite run failed");
                let _ = sink
                    .emit(error_event(
                        format!("Lite Agent failed: {e}"),
                        &ticket.session_id,
                    ))
                    .await;
            }
        }
    }
}
