//! # reagent
//!
//! Research agent server binary — wires the planner, tools, workers,
//! session router, and HTTP surface, then serves until interrupted.

#![deny(unsafe_code)]

mod providers;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use reagent_core::planner::Planner;
use reagent_runtime::{LiteResponder, Orchestrator, SessionRouter, SessionStore};
use reagent_server::{AgentServer, ServerConfig};
use reagent_storage::{DurableStore, SandboxedFs};
use reagent_tools::{InMemoryDocumentIndex, SearchProvider};
use reagent_workers::WorkerRegistry;

use providers::{CuratedSearch, OfflinePlanner};

/// Research agent server.
#[derive(Parser, Debug)]
#[command(name = "reagent", about = "Session-aware research agent server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "8000")]
    port: u16,

    /// Directory for persisted reports and visualizations.
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Seed the internal knowledge index from `*.md`/`*.txt` files here.
    #[arg(long)]
    knowledge_dir: Option<PathBuf>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn seed_knowledge(index: &InMemoryDocumentIndex, dir: &std::path::Path) -> Result<usize> {
    let mut loaded = 0;
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read knowledge dir: {}", dir.display()))?
    {
        let path = entry?.path();
        let is_doc = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("txt"));
        if !is_doc {
            continue;
        }
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        index.add_document(title, body);
        loaded += 1;
    }
    Ok(loaded)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.output_dir.display()
        )
    })?;

    // Offline providers; swap at these seams for real backends.
    let planner: Arc<dyn Planner> = Arc::new(OfflinePlanner);
    let web: Arc<dyn SearchProvider> = Arc::new(CuratedSearch::web());
    let literature: Arc<dyn SearchProvider> = Arc::new(CuratedSearch::literature());

    let index = Arc::new(InMemoryDocumentIndex::new());
    if let Some(ref dir) = args.knowledge_dir {
        let loaded = seed_knowledge(&index, dir)?;
        tracing::info!(count = loaded, dir = %dir.display(), "knowledge index seeded");
    }

    let durable = Arc::new(DurableStore::new());
    let disk = Arc::new(SandboxedFs::new(&args.output_dir));

    let registry = Arc::new(WorkerRegistry::standard(
        Arc::clone(&planner),
        Arc::clone(&web),
        literature,
        index,
        Arc::clone(&disk),
    ));
    tracing::info!(workers = registry.len(), "worker registry ready");

    let orchestrator = Orchestrator::new(
        Arc::clone(&planner),
        registry,
        Arc::clone(&durable),
        Arc::clone(&disk),
    );
    let lite = LiteResponder::new(planner, web);
    let session_router = Arc::new(SessionRouter::new(
        Arc::new(SessionStore::new()),
        orchestrator,
        lite,
        durable,
        disk,
    ));

    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    AgentServer::new(config, session_router)
        .serve()
        .await
        .context("Server failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}
