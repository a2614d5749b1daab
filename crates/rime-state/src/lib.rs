//! # RIME State
//!
//! Shared mutable state behind the orchestrator:
//! - [`ActionStore`] - the authoritative action map and its lifecycle
//! - [`EventBus`] - fan-out of [`RimeEvent`]s to connected observers
//! - [`ContextProvider`] - where the current screen context comes from

pub mod context;
pub mod store;
pub mod subscription;

pub use context::{ContextProvider, ScenarioContextProvider, SessionContextStore};
pub use store::{ActionStore, DEFAULT_SETTLE_DELAY};
pub use subscription::{
    ClientCommand, EventBus, EventFilter, EventKind, EventSubscription, RimeEvent,
    WorkflowProposed,
};
