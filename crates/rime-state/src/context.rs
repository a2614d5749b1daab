//! Screen-context sources.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rime_core::{Result, RimeError, Scenario, ScreenContext};
use tokio::sync::RwLock;
use tracing::debug;

use crate::subscription::{EventBus, RimeEvent};

/// Supplies the screen context an intent is evaluated against.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Current context, optionally for a specific session.
    async fn current(&self, session_id: Option<&str>) -> Result<ScreenContext>;
}

/// Contexts pushed by the external collector, kept per session.
#[derive(Clone)]
pub struct SessionContextStore {
    sessions: Arc<RwLock<HashMap<String, ScreenContext>>>,
    latest: Arc<RwLock<Option<ScreenContext>>>,
    events: EventBus,
}

impl SessionContextStore {
    /// Create an empty store publishing updates to `events`.
    pub fn new(events: EventBus) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            latest: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Record a new context and announce it.
    pub async fn update(&self, session_id: Option<&str>, context: ScreenContext) {
        if let Some(session) = session_id {
            self.sessions
                .write()
                .await
                .insert(session.to_string(), context.clone());
        }
        *self.latest.write().await = Some(context.clone());

        debug!(session_id = ?session_id, application = ?context.analysis.application, "context updated");
        self.events
            .publish(RimeEvent::ContextUpdate(Box::new(context)));
    }

    /// Number of sessions with a stored context.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl ContextProvider for SessionContextStore {
    async fn current(&self, session_id: Option<&str>) -> Result<ScreenContext> {
        if let Some(session) = session_id {
            if let Some(context) = self.sessions.read().await.get(session) {
                return Ok(context.clone());
            }
        }

        Ok(self
            .latest
            .read()
            .await
            .clone()
            .unwrap_or_else(ScreenContext::idle))
    }
}

/// Serves a built-in demo scenario regardless of session.
pub struct ScenarioContextProvider {
    scenario: Scenario,
}

impl ScenarioContextProvider {
    /// Provider for the named scenario.
    pub fn new(scenario_id: &str) -> Result<Self> {
        let scenario = Scenario::by_id(scenario_id).ok_or_else(|| RimeError::NotFound {
            resource_type: "scenario".to_string(),
            id: scenario_id.to_string(),
        })?;
        Ok(Self { scenario })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }
}

#[async_trait]
impl ContextProvider for ScenarioContextProvider {
    async fn current(&self, _session_id: Option<&str>) -> Result<ScreenContext> {
        Ok(self.scenario.context.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::EventFilter;
    use rime_core::{ActivityType, ApplicationType};

    #[tokio::test]
    async fn test_fallback_order() {
        let store = SessionContextStore::new(EventBus::new());

        let idle = store.current(None).await.unwrap();
        assert_eq!(idle.analysis.application, ApplicationType::Unknown);
        assert_eq!(idle.state, ActivityType::Active);

        let coding = Scenario::coding().context;
        let chat = Scenario::communication().context;
        store.update(Some("alice"), coding.clone()).await;
        store.update(None, chat.clone()).await;

        assert_eq!(store.current(Some("alice")).await.unwrap(), coding);
        assert_eq!(store.current(Some("bob")).await.unwrap(), chat);
        assert_eq!(store.current(None).await.unwrap(), chat);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_publishes_event() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(EventFilter::default());
        let store = SessionContextStore::new(bus);

        store.update(None, Scenario::research().context).await;
        assert!(matches!(sub.recv().await, Some(RimeEvent::ContextUpdate(_))));
    }

    #[tokio::test]
    async fn test_scenario_provider() {
        let provider = ScenarioContextProvider::new("coding").unwrap();
        let ctx = provider.current(Some("anyone")).await.unwrap();
        assert!(ctx.has_code_errors());
        assert_eq!(provider.scenario().query, "fix this error");

        assert!(matches!(
            ScenarioContextProvider::new("gaming"),
            Err(RimeError::NotFound { .. })
        ));
    }
}
