//! # reagent-runtime
//!
//! Session routing, run orchestration, and the streaming adapter.
//!
//! - **Session router**: Resolves session + pipeline, frames the event stream
//! - **Orchestrator**: Phased deep run: interpret → plan → delegate → validate → draft → persist
//! - **Lite responder**: Single-pass answers over persisted reports
//! - **Session store**: Concurrent session table with per-query ordinals
//! - **Event sink**: Bounded per-run channel; disconnect unwinds the producer
//! - **Artifact materializer**: Scans chart output into encoded images
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: reagent-core, reagent-storage, reagent-tools,
//! reagent-workers.
//! Depended on by: reagent-server.

#![deny(unsafe_code)]

pub mod artifacts;
pub mod error;
pub mod lite;
pub mod orchestrator;
pub mod router;
pub mod session;
pub mod stream;

// Re-export main public API
pub use artifacts::ArtifactMaterializer;
pub use error::RuntimeError;
pub use lite::LiteResponder;
pub use orchestrator::{GAP_STATEMENT, Orchestrator};
pub use router::{QueryRequest, SessionRouter};
pub use session::{SessionStore, SessionTicket};
pub use stream::{EVENT_CHANNEL_CAPACITY, EventSink, StreamClosed};
