//! # reagent-server
//!
//! Axum HTTP + SSE surface over the session router.
//!
//! - `POST /api/query` — run to completion, return the terminal event
//! - `POST /api/query/stream` — every event as an SSE `data:` frame
//! - `GET /health` — liveness plus live session count
//! - `GET`/`DELETE /api/sessions/{id}` — session inspection and reset
//! - Graceful shutdown via `tokio::signal`

#![deny(unsafe_code)]

pub mod config;
pub mod handlers;
pub mod server;

// Re-export main public API
pub use config::ServerConfig;
pub use server::{AgentServer, AppState};
