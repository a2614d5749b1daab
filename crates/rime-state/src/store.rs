//! The authoritative action map and its lifecycle transitions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rime_core::{Action, ActionStatus, Result, RimeError};
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::subscription::{EventBus, RimeEvent};

/// Time between an action starting execution and its completion.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(2000);

const COMPLETION_MESSAGE: &str = "Action completed successfully";
const CANCELLED_MESSAGE: &str = "execution cancelled";

/// In-memory action store.
///
/// Every transition happens under the map's write lock, so concurrent
/// callers never move an action out of a stale status. Lock order is
/// always `timers` before `actions`.
#[derive(Clone)]
pub struct ActionStore {
    actions: Arc<RwLock<HashMap<Uuid, Action>>>,
    timers: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
    events: EventBus,
    settle_delay: Duration,
}

impl ActionStore {
    /// Create a store publishing to `events` with the default settle delay.
    pub fn new(events: EventBus) -> Self {
        Self::with_settle_delay(events, DEFAULT_SETTLE_DELAY)
    }

    /// Create a store with a custom settle delay.
    pub fn with_settle_delay(events: EventBus, settle_delay: Duration) -> Self {
        Self {
            actions: Arc::new(RwLock::new(HashMap::new())),
            timers: Arc::new(Mutex::new(HashMap::new())),
            events,
            settle_delay,
        }
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Add freshly proposed actions. They enter as `pending`.
    pub async fn register(&self, proposed: &[Action]) {
        let mut actions = self.actions.write().await;
        for action in proposed {
            let mut action = action.clone();
            action.status = ActionStatus::Pending;
            actions.insert(action.id, action);
        }
        debug!(count = proposed.len(), total = actions.len(), "actions registered");
    }

    /// Get an action by ID.
    pub async fn get(&self, id: Uuid) -> Option<Action> {
        self.actions.read().await.get(&id).cloned()
    }

    /// All actions, oldest first.
    pub async fn list(&self) -> Vec<Action> {
        let mut all: Vec<Action> = self.actions.read().await.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        all
    }

    /// Number of stored actions.
    pub async fn len(&self) -> usize {
        self.actions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Approve a pending action and start executing it.
    ///
    /// `pending -> approved -> executing` is applied as one step and
    /// announced once. Completion follows after the settle delay.
    pub async fn approve(&self, id: Uuid) -> Result<Action> {
        let mut timers = self.timers.lock().await;

        let snapshot = {
            let mut actions = self.actions.write().await;
            let action = actions.get_mut(&id).ok_or(RimeError::ActionNotFound(id))?;
            action.transition(ActionStatus::Approved)?;
            action.transition(ActionStatus::Executing)?;
            action.executed_at = Some(Utc::now());
            action.clone()
        };

        info!(action_id = %id, "action approved, executing");
        self.events
            .publish(RimeEvent::ActionUpdated(Box::new(snapshot.clone())));

        let store = self.clone();
        let delay = self.settle_delay;
        timers.insert(
            id,
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                store.complete(id).await;
            }),
        );

        Ok(snapshot)
    }

    /// Reject a pending action.
    pub async fn reject(&self, id: Uuid) -> Result<Action> {
        let snapshot = {
            let mut actions = self.actions.write().await;
            let action = actions.get_mut(&id).ok_or(RimeError::ActionNotFound(id))?;
            action.transition(ActionStatus::Rejected)?;
            action.clone()
        };

        info!(action_id = %id, "action rejected");
        self.events
            .publish(RimeEvent::ActionUpdated(Box::new(snapshot.clone())));
        Ok(snapshot)
    }

    /// Stop an executing action before its settle timer fires.
    pub async fn cancel(&self, id: Uuid) -> Result<Action> {
        let mut timers = self.timers.lock().await;

        let snapshot = {
            let mut actions = self.actions.write().await;
            let action = actions.get_mut(&id).ok_or(RimeError::ActionNotFound(id))?;
            let Some(timer) = timers.remove(&id) else {
                return Err(RimeError::InvalidTransition {
                    action_id: id,
                    from: action.status,
                    to: ActionStatus::Failed,
                });
            };
            timer.abort();
            action.transition(ActionStatus::Failed)?;
            action.error = Some(CANCELLED_MESSAGE.to_string());
            action.clone()
        };

        warn!(action_id = %id, "action execution cancelled");
        self.events
            .publish(RimeEvent::ActionUpdated(Box::new(snapshot.clone())));
        Ok(snapshot)
    }

    /// Settle-timer body: finish an executing action.
    async fn complete(&self, id: Uuid) {
        let mut timers = self.timers.lock().await;
        timers.remove(&id);

        let snapshot = {
            let mut actions = self.actions.write().await;
            let Some(action) = actions.get_mut(&id) else {
                return;
            };
            if let Err(e) = action.transition(ActionStatus::Completed) {
                debug!(action_id = %id, error = %e, "settle timer found action already settled");
                return;
            }
            action.result = Some(json!({ "message": COMPLETION_MESSAGE }));
            action.clone()
        };
        drop(timers);

        info!(action_id = %id, "action completed");
        self.events
            .publish(RimeEvent::ActionUpdated(Box::new(snapshot)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::{EventFilter, EventSubscription};
    use rime_core::ActionType;

    fn action(title: &str) -> Action {
        Action::new("code", ActionType::CodeFix, title, "", serde_json::Value::Null, 0.9)
    }

    async fn store_with(actions: &[Action]) -> (ActionStore, EventSubscription) {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventFilter::default());
        let store = ActionStore::new(bus);
        store.register(actions).await;
        (store, sub)
    }

    async fn next_action(sub: &mut EventSubscription) -> Action {
        match sub.recv().await {
            Some(RimeEvent::ActionUpdated(action)) => *action,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_approve_executes_then_completes() {
        let a = action("Fix");
        let (store, mut sub) = store_with(&[a.clone()]).await;

        let started = tokio::time::Instant::now();
        let approved = store.approve(a.id).await.unwrap();
        assert_eq!(approved.status, ActionStatus::Executing);
        assert!(approved.executed_at.is_some());

        let first = next_action(&mut sub).await;
        assert_eq!(first.status, ActionStatus::Executing);

        let second = next_action(&mut sub).await;
        assert_eq!(second.status, ActionStatus::Completed);
        assert_eq!(second.result.unwrap()["message"], COMPLETION_MESSAGE);
        assert!(started.elapsed() >= DEFAULT_SETTLE_DELAY);

        assert_eq!(store.get(a.id).await.unwrap().status, ActionStatus::Completed);
        assert!(sub.receiver.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_approve_twice_fails_without_mutation() {
        let a = action("Fix");
        let (store, mut sub) = store_with(&[a.clone()]).await;

        store.approve(a.id).await.unwrap();
        let err = store.approve(a.id).await.unwrap_err();
        assert!(matches!(
            err,
            RimeError::InvalidTransition { from: ActionStatus::Executing, .. }
        ));

        let _ = next_action(&mut sub).await;
        assert_eq!(next_action(&mut sub).await.status, ActionStatus::Completed);

        let err = store.approve(a.id).await.unwrap_err();
        assert!(matches!(
            err,
            RimeError::InvalidTransition { from: ActionStatus::Completed, .. }
        ));
        assert!(sub.receiver.is_empty());
    }

    #[tokio::test]
    async fn test_reject_is_terminal() {
        let a = action("Fix");
        let (store, mut sub) = store_with(&[a.clone()]).await;

        let rejected = store.reject(a.id).await.unwrap();
        assert_eq!(rejected.status, ActionStatus::Rejected);
        assert_eq!(next_action(&mut sub).await.status, ActionStatus::Rejected);

        assert!(store.approve(a.id).await.is_err());
        assert!(store.reject(a.id).await.is_err());
        assert_eq!(store.get(a.id).await.unwrap().status, ActionStatus::Rejected);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (store, _sub) = store_with(&[]).await;
        let id = action("ghost").id;

        assert!(matches!(store.approve(id).await, Err(RimeError::ActionNotFound(x)) if x == id));
        assert!(matches!(store.reject(id).await, Err(RimeError::ActionNotFound(_))));
        assert!(matches!(store.cancel(id).await, Err(RimeError::ActionNotFound(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_settle_timer() {
        let a = action("Fix");
        let (store, mut sub) = store_with(&[a.clone()]).await;

        store.approve(a.id).await.unwrap();
        let cancelled = store.cancel(a.id).await.unwrap();
        assert_eq!(cancelled.status, ActionStatus::Failed);
        assert_eq!(cancelled.error.as_deref(), Some(CANCELLED_MESSAGE));

        assert_eq!(next_action(&mut sub).await.status, ActionStatus::Executing);
        assert_eq!(next_action(&mut sub).await.status, ActionStatus::Failed);

        tokio::time::sleep(DEFAULT_SETTLE_DELAY * 2).await;
        assert_eq!(store.get(a.id).await.unwrap().status, ActionStatus::Failed);
        assert!(sub.receiver.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_pending_is_invalid() {
        let a = action("Fix");
        let (store, _sub) = store_with(&[a.clone()]).await;

        let err = store.cancel(a.id).await.unwrap_err();
        assert!(matches!(err, RimeError::InvalidTransition { from: ActionStatus::Pending, .. }));
        assert_eq!(store.get(a.id).await.unwrap().status, ActionStatus::Pending);
    }

    #[tokio::test]
    async fn test_register_and_list() {
        let mut done = action("Old");
        done.status = ActionStatus::Completed;
        let (store, _sub) = store_with(&[done.clone(), action("New")]).await;

        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(done.id).await.unwrap().status, ActionStatus::Pending);
        assert!(store.list().await.iter().all(|a| a.status == ActionStatus::Pending));
    }
}
