//! Actions, their lifecycle status, and the orchestration result.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::error::{Result, RimeError};

/// Closed set of action kinds a provider may propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    WebSearch,
    CodeFix,
    DraftMessage,
    ScheduleEvent,
    OpenFile,
    RunCommand,
    Explain,
}

/// Lifecycle status of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Proposed and awaiting a decision.
    #[default]
    Pending,
    /// Accepted by the user, about to run.
    Approved,
    /// Declined by the user.
    Rejected,
    /// Running.
    Executing,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl ActionStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionStatus::Rejected | ActionStatus::Completed | ActionStatus::Failed
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        matches!(
            (self, next),
            (ActionStatus::Pending, ActionStatus::Approved)
                | (ActionStatus::Pending, ActionStatus::Rejected)
                | (ActionStatus::Approved, ActionStatus::Executing)
                | (ActionStatus::Executing, ActionStatus::Completed)
                | (ActionStatus::Executing, ActionStatus::Failed)
        )
    }

    fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Approved => "approved",
            ActionStatus::Rejected => "rejected",
            ActionStatus::Executing => "executing",
            ActionStatus::Completed => "completed",
            ActionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discrete, approvable unit of proposed work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: Uuid,
    pub agent_id: AgentId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub title: String,
    pub description: String,
    /// Provider-specific payload.
    #[serde(default)]
    pub payload: serde_json::Value,
    pub confidence: f32,
    pub status: ActionStatus,
    /// Actions that must complete before this one. Advisory only.
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Action {
    /// Create a pending action.
    pub fn new(
        agent_id: impl Into<AgentId>,
        action_type: ActionType,
        title: impl Into<String>,
        description: impl Into<String>,
        payload: serde_json::Value,
        confidence: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            action_type,
            title: title.into(),
            description: description.into(),
            payload,
            confidence,
            status: ActionStatus::Pending,
            dependencies: Vec::new(),
            created_at: Utc::now(),
            executed_at: None,
            result: None,
            error: None,
        }
    }

    /// Dedup key: two actions with the same type and title are the same proposal.
    pub fn signature(&self) -> (ActionType, &str) {
        (self.action_type, self.title.as_str())
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: ActionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(RimeError::InvalidTransition {
                action_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// A provider that was selected but failed to produce actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFailure {
    pub agent_id: AgentId,
    pub error: String,
}

/// Bookkeeping about one orchestration pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationMetadata {
    /// Providers whose `Execute` was invoked, in selection order.
    pub agents_used: Vec<AgentId>,
    /// Actions proposed before deduplication.
    pub total_actions_proposed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_agents: Vec<ProviderFailure>,
}

/// The Orchestrator's return value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub agent_id: AgentId,
    pub confidence: f32,
    pub actions: Vec<Action>,
    pub explanation: String,
    pub metadata: OrchestrationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action() -> Action {
        Action::new(
            "research",
            ActionType::WebSearch,
            "Web search",
            "Search for: \"hooks\"",
            serde_json::json!({"query": "hooks"}),
            0.8,
        )
    }

    #[test]
    fn test_action_status_terminal() {
        assert!(ActionStatus::Completed.is_terminal());
        assert!(ActionStatus::Failed.is_terminal());
        assert!(ActionStatus::Rejected.is_terminal());
        assert!(!ActionStatus::Executing.is_terminal());
        assert!(!ActionStatus::Pending.is_terminal());
    }

    #[test]
    fn test_transition_table() {
        use ActionStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Executing));
        assert!(Executing.can_transition_to(Completed));
        assert!(Executing.can_transition_to(Failed));

        assert!(!Pending.can_transition_to(Executing));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Completed.can_transition_to(Executing));
        assert!(!Executing.can_transition_to(Rejected));
    }

    #[test]
    fn test_transition_leaves_state_on_error() {
        let mut a = action();
        a.transition(ActionStatus::Rejected).unwrap();
        let err = a.transition(ActionStatus::Approved).unwrap_err();
        assert!(matches!(err, RimeError::InvalidTransition { .. }));
        assert_eq!(a.status, ActionStatus::Rejected);
    }

    #[test]
    fn test_action_wire_format() {
        let json = serde_json::to_value(action()).unwrap();
        assert_eq!(json["type"], "web_search");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["agentId"], "research");
        assert!(json.get("executedAt").is_none());
    }

    #[test]
    fn test_signature() {
        let a = action();
        let mut b = action();
        b.description = "different".into();
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.id, b.id);
    }
}
