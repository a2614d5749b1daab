//! Research agent: web and documentation searches.

use std::time::Duration;

use async_trait::async_trait;
use rime_core::{
    Action, ActionType, ActivityType, AgentId, AgentResult, AgentState, AgentStatus, Intent,
    PageType, Result, ScreenContext,
};
use serde_json::json;
use tracing::debug;

use crate::provider::{contains_any, matches_capabilities, CapabilityProvider, StatusTracker};

const TRIGGERS: [&str; 12] = [
    "search", "find", "lookup", "documentation", "docs", "how to", "how do", "stackoverflow",
    "github", "examples", "tutorial", "guide",
];

/// Proposes web and documentation searches.
pub struct ResearchAgent {
    id: AgentId,
    status: StatusTracker,
    latency: Duration,
}

impl ResearchAgent {
    pub fn new() -> Self {
        let id = AgentId::from("research");
        Self {
            status: StatusTracker::new(id.clone()),
            id,
            latency: Duration::from_millis(500),
        }
    }

    /// Override the simulated search latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn propose(&self, intent: &Intent, context: &ScreenContext) -> Vec<Action> {
        if let Some((code, error)) = context.first_error() {
            return vec![
                Action::new(
                    &self.id,
                    ActionType::WebSearch,
                    "Search for error solution",
                    format!("Search for: \"{}\" in {}", error.message, code.language),
                    json!({
                        "query": format!("{} {}", error.message, code.language),
                        "sources": ["stackoverflow", "github", "web"],
                    }),
                    0.85,
                ),
                Action::new(
                    &self.id,
                    ActionType::WebSearch,
                    "Search documentation",
                    format!("Find official docs for {}", code.language),
                    json!({
                        "query": format!("{} documentation {}", code.language, error.message),
                        "sources": ["official_docs"],
                    }),
                    0.75,
                ),
            ];
        }

        vec![Action::new(
            &self.id,
            ActionType::WebSearch,
            "Web search",
            format!("Search for: \"{}\"", intent.query),
            json!({
                "query": intent.query,
                "sources": ["web", "stackoverflow", "github"],
            }),
            0.8,
        )]
    }
}

impl Default for ResearchAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for ResearchAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "Research Agent"
    }

    fn capabilities(&self) -> &[&'static str] {
        &[
            "web search",
            "documentation lookup",
            "stackoverflow search",
            "github issues",
            "find solutions",
            "search",
            "lookup",
        ]
    }

    async fn can_handle(&self, intent: &Intent, _context: &ScreenContext) -> bool {
        contains_any(&intent.query, &TRIGGERS)
            || matches_capabilities(self.capabilities(), &intent.query)
    }

    async fn confidence(&self, intent: &Intent, context: &ScreenContext) -> f32 {
        let mut confidence: f32 = 0.5;

        if contains_any(&intent.query, &["search", "find"]) {
            confidence += 0.3;
        }
        if context.analysis.user_activity == ActivityType::Debugging {
            confidence += 0.2;
        }
        if context.page_type() == Some(PageType::Stackoverflow) {
            confidence += 0.1;
        }
        if context.has_code_errors() {
            confidence += 0.15;
        }

        confidence.min(1.0)
    }

    async fn execute(&self, intent: &Intent, context: &ScreenContext) -> Result<AgentResult> {
        let guard = self.status.begin("Analyzing research query...");

        let actions = self.propose(intent, context);
        debug!(intent_id = %intent.id, count = actions.len(), "research actions proposed");

        self.status.set(AgentStatus::Working, 50, "Preparing search queries...");
        tokio::time::sleep(self.latency).await;

        let result = Ok(AgentResult {
            agent_id: self.id.clone(),
            confidence: self.confidence(intent, context).await,
            actions,
            explanation: "I can search for solutions and documentation related to your query."
                .to_string(),
            metadata: json!({
                "searchTerms": [intent.query],
                "sources": ["web", "stackoverflow", "github", "docs"],
            }),
        });

        guard.finish(&result, "Research complete");
        result
    }

    async fn state(&self) -> AgentState {
        self.status.snapshot()
    }
}
