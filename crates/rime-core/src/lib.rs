//! # RIME Core
//!
//! Core primitives and types for the RIME orchestration engine.
//!
//! This crate provides the fundamental building blocks:
//! - [`Intent`] - A user request awaiting handling
//! - [`ScreenContext`] - Snapshot of the user's on-screen activity
//! - [`Action`] - An approvable unit of proposed work
//! - [`OrchestrationResult`] - The merged output of one orchestration pass
//! - [`RimeError`] - Engine error types

pub mod action;
pub mod agent;
pub mod context;
pub mod error;
pub mod intent;
pub mod scenario;

// Re-exports for convenience
pub use action::{Action, ActionStatus, ActionType, OrchestrationMetadata, OrchestrationResult, ProviderFailure};
pub use agent::{AgentId, AgentResult, AgentState, AgentStatus};
pub use context::{
    ActivityType, ApplicationType, BrowserContext, CodeContext, CodeIssue, IssueSeverity,
    PageType, ScreenCapture, ScreenContext, VisionAnalysis,
};
pub use error::{Result, RimeError};
pub use intent::{Intent, IntentBuilder, IntentType};
pub use scenario::Scenario;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::action::{Action, ActionStatus, ActionType, OrchestrationResult};
    pub use crate::agent::{AgentId, AgentResult, AgentState, AgentStatus};
    pub use crate::context::ScreenContext;
    pub use crate::error::{Result, RimeError};
    pub use crate::intent::{Intent, IntentBuilder, IntentType};
}
