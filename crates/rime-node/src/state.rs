//! Application state.

use std::sync::Arc;

use rime_core::{Result, ScreenContext};
use rime_orchestrator::Orchestrator;
use rime_state::{
    ActionStore, ContextProvider, EventBus, ScenarioContextProvider, SessionContextStore,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The orchestrator and its registered providers.
    pub orchestrator: Arc<Orchestrator>,

    /// Authoritative action map.
    pub actions: ActionStore,

    /// Push-channel fan-out.
    pub events: EventBus,

    /// Contexts pushed by the collector.
    pub contexts: SessionContextStore,

    /// Canned context source, set in mock mode.
    pub scenario: Option<Arc<ScenarioContextProvider>>,
}

impl AppState {
    /// Build state from configuration, registering the default providers.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let orchestrator = Orchestrator::with_default_providers(config.orchestrator.clone());
        Self::with_orchestrator(config, orchestrator)
    }

    /// Build state around an existing orchestrator.
    pub fn with_orchestrator(config: &AppConfig, orchestrator: Orchestrator) -> Result<Self> {
        let events = EventBus::new();
        let scenario = if config.features.mock {
            Some(Arc::new(ScenarioContextProvider::new(
                &config.features.mock_scenario,
            )?))
        } else {
            None
        };

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            actions: ActionStore::with_settle_delay(events.clone(), config.lifecycle.settle_delay()),
            contexts: SessionContextStore::new(events.clone()),
            events,
            scenario,
        })
    }

    /// Whether canned scenario contexts are being served.
    pub fn is_mock(&self) -> bool {
        self.scenario.is_some()
    }

    /// The active context source.
    pub fn context_provider(&self) -> &dyn ContextProvider {
        match &self.scenario {
            Some(scenario) => scenario.as_ref(),
            None => &self.contexts,
        }
    }

    /// Current context for a session.
    pub async fn current_context(&self, session_id: Option<&str>) -> Result<ScreenContext> {
        self.context_provider().current(session_id).await
    }
}
