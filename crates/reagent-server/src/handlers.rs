//! HTTP handlers for the query and session endpoints.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use reagent_core::events::AgentEvent;
use reagent_runtime::QueryRequest;

use crate::server::AppState;

/// Pause between streamed events so proxies flush each frame separately.
const EVENT_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Body for `POST /api/query` and `POST /api/query/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryBody {
    /// The research question.
    pub query: String,
    /// Optional pipeline override, `"deep"` or `"lite"`.
    #[serde(default)]
    pub agent_type: Option<String>,
    /// Session to continue.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl From<QueryBody> for QueryRequest {
    fn from(body: QueryBody) -> Self {
        Self {
            query: body.query,
            agent_type: body.agent_type,
            session_id: body.session_id,
        }
    }
}

/// `POST /api/query` — run to completion, return the terminal event as JSON.
///
/// Intermediate events are drained and dropped; a terminal error maps to
/// a 500 with an `error` body.
pub async fn query_handler(State(state): State<AppState>, Json(body): Json<QueryBody>) -> Response {
    let mut rx = state.router.route(body.into());
    while let Some(event) = rx.recv().await {
        match event {
            AgentEvent::Result { data } => return Json(data).into_response(),
            AgentEvent::Error { content, .. } => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": content })),
                )
                    .into_response();
            }
            _ => {}
        }
    }
    warn!("run ended without a terminal event");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Run ended without a result" })),
    )
        .into_response()
}

/// `POST /api/query/stream` — stream every event as SSE frames.
///
/// Each event is one `data:` frame carrying its JSON encoding. The stream
/// ends after the terminal event; dropping the connection stops the run at
/// its next emit.
pub async fn query_stream_handler(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.router.route(body.into());
    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            let data = serde_json::to_string(&event).unwrap_or_default();
            yield Ok(Event::default().data(data));
            tokio::time::sleep(EVENT_FLUSH_INTERVAL).await;
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "sessions_active": state.router.sessions().active(),
    }))
}

/// `GET /api/sessions/{session_id}`
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.router.sessions().get(&session_id) {
        Some(query_count) => Json(json!({
            "session_id": session_id,
            "query_count": query_count,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
        .into_response(),
        None => session_not_found(),
    }
}

/// `DELETE /api/sessions/{session_id}`
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    if state.router.sessions().delete(&session_id) {
        Json(json!({ "status": "deleted", "session_id": session_id })).into_response()
    } else {
        session_not_found()
    }
}

fn session_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Session not found" })),
    )
        .into_response()
}
