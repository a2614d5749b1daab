//! The orchestration pipeline.
//!
//! One pass runs: score all providers (barrier) -> select top-K ->
//! execute selected providers (barrier) -> dedup -> prioritize -> annotate.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rime_agents::CapabilityProvider;
use rime_core::{
    AgentId, AgentResult, AgentState, Intent, OrchestrationMetadata, OrchestrationResult,
    ProviderFailure, Result, RimeError, ScreenContext,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::merge;

/// Identity used for results produced by the orchestrator itself.
pub const ORCHESTRATOR_ID: &str = "meta";

const FALLBACK_EXPLANATION: &str =
    "I'm not sure how to help with that. Could you rephrase your request?";

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Providers must score strictly above this to be selected.
    pub confidence_threshold: f32,

    /// Maximum number of providers executed per intent.
    pub max_providers: usize,

    /// Confidence reported when no provider qualifies.
    pub fallback_confidence: f32,

    /// Per-provider execution time limit in milliseconds. Zero disables it.
    pub provider_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            max_providers: 3,
            fallback_confidence: 0.3,
            provider_timeout_ms: 10_000,
        }
    }
}

impl OrchestratorConfig {
    /// Execution time limit, if enabled.
    pub fn provider_timeout(&self) -> Option<Duration> {
        (self.provider_timeout_ms > 0).then(|| Duration::from_millis(self.provider_timeout_ms))
    }
}

/// Outcome of the scoring pass for one provider.
struct Candidate {
    provider: Arc<dyn CapabilityProvider>,
    can_handle: bool,
    confidence: f32,
}

/// Routes intents to capability providers and merges their proposals.
pub struct Orchestrator {
    providers: Vec<Arc<dyn CapabilityProvider>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with no providers.
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            providers: Vec::new(),
            config,
        }
    }

    /// Create an orchestrator with the reference providers registered.
    pub fn with_default_providers(config: OrchestratorConfig) -> Self {
        let mut orchestrator = Self::new(config);
        for provider in rime_agents::default_providers() {
            orchestrator.register(provider);
        }
        orchestrator
    }

    /// Register a provider. Registration order breaks confidence ties.
    pub fn register(&mut self, provider: Arc<dyn CapabilityProvider>) {
        info!(agent_id = %provider.id(), "registered provider");
        self.providers.push(provider);
    }

    /// Registered providers.
    pub fn providers(&self) -> &[Arc<dyn CapabilityProvider>] {
        &self.providers
    }

    /// Get the orchestrator configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Status of every registered provider, in registration order.
    pub async fn agent_states(&self) -> Vec<AgentState> {
        join_all(self.providers.iter().map(|p| p.state())).await
    }

    /// Run one orchestration pass.
    ///
    /// Provider failures are folded into the result metadata; only
    /// pass-level problems (an invalid intent) surface as errors.
    pub async fn orchestrate(
        &self,
        intent: &Intent,
        context: &ScreenContext,
    ) -> Result<OrchestrationResult> {
        intent.validate()?;
        info!(intent_id = %intent.id, providers = self.providers.len(), "orchestrating intent");

        let candidates = self.score(intent, context).await;
        let selected = self.select(candidates);

        let Some(top_confidence) = selected.first().map(|c| c.confidence) else {
            info!(intent_id = %intent.id, "no provider qualified");
            return Ok(self.fallback());
        };

        let outcomes = self.execute_selected(&selected, intent, context).await;

        let mut proposed = Vec::new();
        let mut failures = Vec::new();
        for (candidate, outcome) in selected.iter().zip(outcomes) {
            match outcome {
                Ok(result) => proposed.extend(result.actions),
                Err(e) => {
                    warn!(
                        intent_id = %intent.id,
                        agent_id = %candidate.provider.id(),
                        error = %e,
                        "provider failed"
                    );
                    failures.push(ProviderFailure {
                        agent_id: candidate.provider.id().clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let total_actions_proposed = proposed.len();
        let mut actions = merge::dedup(proposed);
        merge::prioritize(&mut actions, context.has_code_errors());
        merge::annotate_dependencies(&mut actions);

        let names: Vec<&str> = selected.iter().map(|c| c.provider.name()).collect();
        let explanation = if failures.len() == selected.len() {
            format!(
                "I couldn't get an answer from the {}. Could you try again?",
                names.join(" and ")
            )
        } else {
            explain(&names, actions.len())
        };

        info!(
            intent_id = %intent.id,
            proposed = total_actions_proposed,
            merged = actions.len(),
            failed = failures.len(),
            "orchestration complete"
        );

        Ok(OrchestrationResult {
            agent_id: AgentId::from(ORCHESTRATOR_ID),
            confidence: top_confidence,
            actions,
            explanation,
            metadata: OrchestrationMetadata {
                agents_used: selected.iter().map(|c| c.provider.id().clone()).collect(),
                total_actions_proposed,
                failed_agents: failures,
            },
        })
    }

    /// Poll every provider for eligibility and confidence, all at once.
    async fn score(&self, intent: &Intent, context: &ScreenContext) -> Vec<Candidate> {
        let scoring = self.providers.iter().map(|provider| async move {
            let (can_handle, confidence) = tokio::join!(
                provider.can_handle(intent, context),
                provider.confidence(intent, context)
            );
            let confidence = sanitize(confidence);
            debug!(agent_id = %provider.id(), can_handle, confidence, "scored provider");
            Candidate {
                provider: Arc::clone(provider),
                can_handle,
                confidence,
            }
        });

        join_all(scoring).await
    }

    /// Eligible providers above the threshold, best first, at most `max_providers`.
    fn select(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let mut selected: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.can_handle && c.confidence > self.config.confidence_threshold)
            .collect();
        selected.sort_by(|a, b| merge::by_confidence_desc(a.confidence, b.confidence));
        selected.truncate(self.config.max_providers);
        selected
    }

    /// Execute the selected providers concurrently; each fails independently.
    async fn execute_selected(
        &self,
        selected: &[Candidate],
        intent: &Intent,
        context: &ScreenContext,
    ) -> Vec<Result<AgentResult>> {
        let timeout = self.config.provider_timeout();
        let runs = selected.iter().map(|candidate| async move {
            let provider = &candidate.provider;
            let execution = provider.execute(intent, context);
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, execution).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(RimeError::Timeout {
                        duration_ms: limit.as_millis() as u64,
                        message: format!("agent {} did not respond", provider.id()),
                    }),
                },
                None => execution.await,
            }
        });

        join_all(runs).await
    }

    fn fallback(&self) -> OrchestrationResult {
        OrchestrationResult {
            agent_id: AgentId::from(ORCHESTRATOR_ID),
            confidence: self.config.fallback_confidence,
            actions: Vec::new(),
            explanation: FALLBACK_EXPLANATION.to_string(),
            metadata: OrchestrationMetadata::default(),
        }
    }
}

fn sanitize(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

fn explain(names: &[&str], action_count: usize) -> String {
    match names {
        [] => "I couldn't find any agents to help with that.".to_string(),
        [only] => format!("I'll help you with that using the {only}."),
        _ => format!(
            "I'll coordinate the {} to help you. {} action{} proposed.",
            names.join(" and "),
            action_count,
            if action_count == 1 { "" } else { "s" }
        ),
    }
}
