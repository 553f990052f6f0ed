//! `AgentServer` — the Axum HTTP + SSE surface over a session router.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use reagent_runtime::SessionRouter;

use crate::config::ServerConfig;
use crate::handlers::{
    delete_session_handler, get_session_handler, health_handler, query_handler,
    query_stream_handler,
};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The session router every query goes through.
    pub router: Arc<SessionRouter>,
    /// When the server started.
    pub start_time: Instant,
}

/// The research service HTTP server.
pub struct AgentServer {
    config: ServerConfig,
    router: Arc<SessionRouter>,
    start_time: Instant,
}

impl AgentServer {
    /// Create a new server over a session router.
    #[must_use]
    pub fn new(config: ServerConfig, router: Arc<SessionRouter>) -> Self {
        Self {
            config,
            router,
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    ///
    /// CORS is permissive; the service fronts a trusted dashboard.
    #[must_use]
    pub fn router(&self) -> Router {
        let state = AppState {
            router: Arc::clone(&self.router),
            start_time: self.start_time,
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/api/query", post(query_handler))
            .route("/api/query/stream", post(query_stream_handler))
            .route("/api/sessions/{session_id}", get(get_session_handler))
            .route("/api/sessions/{session_id}", delete(delete_session_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Get the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind and serve until interrupted.
    pub async fn serve(self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr()).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "research server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
