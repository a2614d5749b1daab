//! Capability provider trait and shared helpers.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use rime_core::{AgentId, AgentResult, AgentState, AgentStatus, Intent, Result, ScreenContext};

/// A pluggable handler that can propose actions for an intent.
///
/// `can_handle` and `confidence` must be cheap and free of side effects;
/// the orchestrator may call them concurrently with other providers.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Stable identity, used in actions and metadata.
    fn id(&self) -> &AgentId;

    /// Human-readable name, used in explanations.
    fn name(&self) -> &str;

    /// Capability phrases matched against query keywords.
    fn capabilities(&self) -> &[&'static str];

    /// Eligibility verdict for this intent.
    async fn can_handle(&self, intent: &Intent, context: &ScreenContext) -> bool;

    /// Fitness score in [0, 1]. Deterministic for identical inputs.
    async fn confidence(&self, intent: &Intent, context: &ScreenContext) -> f32;

    /// Produce proposed actions. Must leave the agent state idle on return.
    async fn execute(&self, intent: &Intent, context: &ScreenContext) -> Result<AgentResult>;

    /// Current status snapshot.
    async fn state(&self) -> AgentState;
}

/// Provider-owned agent state with timestamped updates.
///
/// Blocking lock: `ExecutionGuard::drop` writes through it.
pub struct StatusTracker {
    state: RwLock<AgentState>,
}

impl StatusTracker {
    /// Create a tracker in the idle state.
    pub fn new(id: AgentId) -> Self {
        Self {
            state: RwLock::new(AgentState::idle(id)),
        }
    }

    /// Update status, progress and message.
    pub fn set(&self, status: AgentStatus, progress: u8, message: impl Into<String>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.status = status;
        state.progress = progress.min(100);
        state.message = message.into();
        state.last_update = Utc::now();
    }

    /// Enter `thinking` for one execution.
    ///
    /// The returned guard puts the agent back to idle when finished or dropped.
    pub fn begin(&self, message: impl Into<String>) -> ExecutionGuard<'_> {
        self.set(AgentStatus::Thinking, 0, message);
        ExecutionGuard {
            tracker: self,
            settled: false,
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> AgentState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Resets the agent to idle when an execution ends, however it ends.
pub struct ExecutionGuard<'a> {
    tracker: &'a StatusTracker,
    settled: bool,
}

impl ExecutionGuard<'_> {
    /// Record the outcome and return to idle.
    pub fn finish<T>(mut self, outcome: &Result<T>, done_message: &str) {
        match outcome {
            Ok(_) => self.tracker.set(AgentStatus::Idle, 100, done_message),
            Err(e) => self.tracker.set(AgentStatus::Idle, 0, format!("Failed: {e}")),
        }
        self.settled = true;
    }
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker
                .set(AgentStatus::Idle, 0, INTERRUPTED_MESSAGE);
        }
    }
}

const INTERRUPTED_MESSAGE: &str = "Failed: execution interrupted";

const STOP_WORDS: [&str; 11] = [
    "a", "an", "the", "is", "are", "was", "were", "this", "that", "how", "what",
];

/// Significant lowercase words of a query.
pub fn extract_keywords(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}

/// True when any query keyword occurs inside one of the capability phrases.
pub fn matches_capabilities(capabilities: &[&str], query: &str) -> bool {
    let keywords = extract_keywords(query);
    capabilities.iter().any(|capability| {
        let capability = capability.to_lowercase();
        keywords.iter().any(|keyword| capability.contains(keyword.as_str()))
    })
}

/// True when the lowercased query contains any trigger phrase.
pub fn contains_any(query: &str, triggers: &[&str]) -> bool {
    let query = query.to_lowercase();
    triggers.iter().any(|trigger| query.contains(trigger))
}
