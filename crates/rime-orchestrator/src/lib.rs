//! # RIME Orchestrator
//!
//! Decides which providers to consult for an intent, runs them, and merges
//! their proposals into one deduplicated, dependency-ordered action list.

pub mod merge;
pub mod orchestrator;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
