//! Intent processing shared by the HTTP and WebSocket surfaces.

use rime_core::{Intent, OrchestrationResult, Result};
use rime_state::{RimeEvent, WorkflowProposed};
use tracing::{error, info};

use crate::state::AppState;

/// Run one orchestration pass and commit its actions.
///
/// The intent's own context wins over the configured provider. Actions are
/// registered only after the pass succeeds, then `workflow:proposed` is
/// published with a fresh agent snapshot.
pub async fn process_intent(state: &AppState, intent: Intent) -> Result<OrchestrationResult> {
    let context = match &intent.context {
        Some(context) => context.clone(),
        None => state.current_context(Some(&intent.session_id)).await?,
    };

    let result = match state.orchestrator.orchestrate(&intent, &context).await {
        Ok(result) => result,
        Err(e) => {
            error!(intent_id = %intent.id, error = %e, "orchestration failed");
            return Err(e);
        }
    };

    state.actions.register(&result.actions).await;
    info!(
        intent_id = %intent.id,
        actions = result.actions.len(),
        confidence = result.confidence,
        "workflow proposed"
    );

    let agents = state.orchestrator.agent_states().await;
    state
        .events
        .publish(RimeEvent::WorkflowProposed(Box::new(WorkflowProposed {
            intent,
            result: result.clone(),
            agents,
        })));

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use rime_core::{ActionStatus, Scenario};
    use rime_state::EventFilter;

    fn mock_state(scenario: &str) -> AppState {
        let mut config = AppConfig::default();
        config.features.mock = true;
        config.features.mock_scenario = scenario.to_string();
        AppState::from_config(&config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_registers_actions_and_publishes() {
        let state = mock_state("coding");
        let mut sub = state.events.subscribe(EventFilter::default());

        let intent = Intent::builder().query("fix this error").build().unwrap();
        let result = process_intent(&state, intent).await.unwrap();

        assert!(!result.actions.is_empty());
        assert_eq!(state.actions.len().await, result.actions.len());
        for action in &result.actions {
            let stored = state.actions.get(action.id).await.unwrap();
            assert_eq!(stored.status, ActionStatus::Pending);
        }
        match sub.recv().await {
            Some(RimeEvent::WorkflowProposed(proposed)) => {
                assert_eq!(proposed.result.actions.len(), result.actions.len());
                assert_eq!(proposed.agents.len(), 3);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_intent_context_overrides_provider() {
        let state = mock_state("research");
        let intent = Intent::builder()
            .query("fix this error")
            .context(Scenario::coding().context)
            .build()
            .unwrap();

        let result = process_intent(&state, intent).await.unwrap();
        assert!(result.metadata.agents_used.iter().any(|a| a.as_str() == "code"));
        assert!(result.actions[0].title.starts_with("Fix:"));
    }

    #[tokio::test]
    async fn test_failed_pass_commits_nothing() {
        let state = mock_state("coding");
        let mut intent = Intent::builder().query("fix").build().unwrap();
        intent.query = " ".to_string();

        assert!(process_intent(&state, intent).await.is_err());
        assert!(state.actions.is_empty().await);
    }
}
