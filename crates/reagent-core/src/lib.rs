//! # reagent-core
//!
//! Foundation types for the reagent research service.
//!
//! This crate provides the shared vocabulary that all other reagent crates
//! depend on:
//!
//! - **Modes**: [`mode::AgentMode`] — the deep/lite pipeline selector
//! - **Events**: [`events::AgentEvent`] — the tagged wire-event enum streamed
//!   to clients, with factory helpers
//! - **Steps**: [`step::ExecutionStep`] — append-only trace entries for a run
//! - **Results**: [`result::FinalResult`] and [`result::ImageArtifact`]
//! - **Planner**: [`planner::Planner`] — the black-box text-generation boundary
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other reagent crates.

#![deny(unsafe_code)]

pub mod events;
pub mod mode;
pub mod planner;
pub mod result;
pub mod step;
