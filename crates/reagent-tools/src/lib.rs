//! # reagent-tools
//!
//! The tool boundary workers call through during a research run.
//!
//! Every tool implements the object-safe [`Tool`] trait and is stateless
//! from the worker's point of view. Data tools answer from curated reference
//! datasets; search and retrieval tools delegate to opaque providers behind
//! traits; the chart tool is the only one that writes files.
//!
//! A query no tool recognizes produces an explicit no-data output, never an
//! error. Errors are reserved for infrastructure failures.

#![deny(unsafe_code)]

mod chart;
mod market;
mod patents;
mod retrieval;
mod search;
mod tool;
mod trade;
mod trials;

pub use chart::ChartRenderTool;
pub use market::MarketInsightsTool;
pub use patents::PatentSearchTool;
pub use retrieval::{DocumentIndex, InMemoryDocumentIndex, RetrievalTool};
pub use search::{SearchHit, SearchProvider, SearchTool};
pub use tool::{Tool, ToolError, ToolOutput};
pub use trade::TradeFlowsTool;
pub use trials::ClinicalTrialsTool;
