//! # RIME Agents
//!
//! The capability provider contract and the reference providers.

pub mod code;
pub mod communication;
pub mod provider;
pub mod research;

use std::sync::Arc;

pub use code::CodeAgent;
pub use communication::CommunicationAgent;
pub use provider::{CapabilityProvider, ExecutionGuard, StatusTracker};
pub use research::ResearchAgent;

/// The default provider set, in registration order.
pub fn default_providers() -> Vec<Arc<dyn CapabilityProvider>> {
    vec![
        Arc::new(ResearchAgent::new()),
        Arc::new(CodeAgent::new()),
        Arc::new(CommunicationAgent::new()),
    ]
}
