//! Event bus and push-channel messages.

use std::fmt;

use rime_core::{Action, AgentState, Intent, OrchestrationResult, ScreenContext};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

/// Events buffered per subscriber before it starts lagging.
pub const EVENT_CAPACITY: usize = 1000;

/// Payload of a `workflow:proposed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowProposed {
    pub intent: Intent,
    pub result: OrchestrationResult,
    pub agents: Vec<AgentState>,
}

/// A server-to-client event, framed as `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum RimeEvent {
    #[serde(rename = "agents:status")]
    AgentsStatus(Vec<AgentState>),

    #[serde(rename = "workflow:proposed")]
    WorkflowProposed(Box<WorkflowProposed>),

    #[serde(rename = "action:updated")]
    ActionUpdated(Box<Action>),

    #[serde(rename = "context:update")]
    ContextUpdate(Box<ScreenContext>),

    #[serde(rename = "error")]
    Error { message: String },
}

impl RimeEvent {
    /// Kind of this event, for filtering.
    pub fn kind(&self) -> EventKind {
        match self {
            RimeEvent::AgentsStatus(_) => EventKind::AgentsStatus,
            RimeEvent::WorkflowProposed(_) => EventKind::WorkflowProposed,
            RimeEvent::ActionUpdated(_) => EventKind::ActionUpdated,
            RimeEvent::ContextUpdate(_) => EventKind::ContextUpdate,
            RimeEvent::Error { .. } => EventKind::Error,
        }
    }

    /// Shorthand for an `error` event.
    pub fn error(message: impl Into<String>) -> Self {
        RimeEvent::Error {
            message: message.into(),
        }
    }
}

/// Event names without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "agents:status")]
    AgentsStatus,
    #[serde(rename = "workflow:proposed")]
    WorkflowProposed,
    #[serde(rename = "action:updated")]
    ActionUpdated,
    #[serde(rename = "context:update")]
    ContextUpdate,
    #[serde(rename = "error")]
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::AgentsStatus,
        EventKind::WorkflowProposed,
        EventKind::ActionUpdated,
        EventKind::ContextUpdate,
        EventKind::Error,
    ];

    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::AgentsStatus => "agents:status",
            EventKind::WorkflowProposed => "workflow:proposed",
            EventKind::ActionUpdated => "action:updated",
            EventKind::ContextUpdate => "context:update",
            EventKind::Error => "error",
        }
    }

    /// Look up a kind by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Filter for subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Event kinds to deliver. `None` delivers everything.
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    /// Create a filter for specific kinds.
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self { kinds: Some(kinds) }
    }

    /// Parse a comma-separated list of event names. Unknown names are skipped.
    pub fn parse(names: &str) -> Self {
        let kinds = names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .filter_map(|n| {
                let kind = EventKind::from_name(n);
                if kind.is_none() {
                    debug!(name = n, "ignoring unknown event name in filter");
                }
                kind
            })
            .collect();
        Self::kinds(kinds)
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &RimeEvent) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind()),
            None => true,
        }
    }
}

/// A client-to-server command on the push channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "intent:submit")]
    SubmitIntent {
        query: String,
        #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    #[serde(rename = "action:approve")]
    Approve {
        #[serde(rename = "actionId")]
        action_id: Uuid,
    },

    #[serde(rename = "action:reject")]
    Reject {
        #[serde(rename = "actionId")]
        action_id: Uuid,
    },
}

/// A filtered receiver on the event bus.
pub struct EventSubscription {
    /// Unique ID for this subscription.
    pub id: Uuid,

    /// Filter for this subscription.
    pub filter: EventFilter,

    pub(crate) receiver: broadcast::Receiver<RimeEvent>,
}

impl EventSubscription {
    /// Next event passing the filter. `None` once the bus is gone.
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<RimeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(subscription = %self.id, skipped, "subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Broadcasts events to every subscriber. Publishing never blocks.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<RimeEvent>,
}

impl EventBus {
    /// Create a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribe with a filter.
    pub fn subscribe(&self, filter: EventFilter) -> EventSubscription {
        EventSubscription {
            id: Uuid::new_v4(),
            filter,
            receiver: self.sender.subscribe(),
        }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: RimeEvent) {
        let kind = event.kind();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = %kind, receivers, "event published"),
            Err(_) => debug!(event = %kind, "event dropped, no subscribers"),
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
