//! Error types for the RIME engine.

use thiserror::Error;
use uuid::Uuid;

use crate::action::ActionStatus;

/// Main error type for RIME operations.
#[derive(Error, Debug, Clone)]
pub enum RimeError {
    /// Intent validation failed.
    #[error("Intent validation failed: {message}")]
    IntentInvalid { intent_id: Option<Uuid>, message: String },

    /// No action is registered under the given id.
    #[error("Action not found: {0}")]
    ActionNotFound(Uuid),

    /// A lifecycle transition is not allowed from the action's current status.
    #[error("Invalid transition for action {action_id}: {from} -> {to}")]
    InvalidTransition {
        action_id: Uuid,
        from: ActionStatus,
        to: ActionStatus,
    },

    /// A capability provider failed while executing.
    #[error("Agent {agent_id} failed: {message}")]
    ProviderFailed { agent_id: String, message: String },

    /// Operation timed out.
    #[error("Operation timed out after {duration_ms}ms: {message}")]
    Timeout { duration_ms: u64, message: String },

    /// No screen context could be produced.
    #[error("Screen context unavailable: {0}")]
    ContextUnavailable(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Resource not found.
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

impl RimeError {
    /// Returns true if this error is recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RimeError::Timeout { .. }
                | RimeError::ConnectionError(_)
                | RimeError::ProviderFailed { .. }
        )
    }

    /// Returns the action ID if available.
    pub fn action_id(&self) -> Option<Uuid> {
        match self {
            RimeError::ActionNotFound(id) => Some(*id),
            RimeError::InvalidTransition { action_id, .. } => Some(*action_id),
            _ => None,
        }
    }

    /// Shorthand for a provider failure.
    pub fn provider(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        RimeError::ProviderFailed {
            agent_id: agent_id.into(),
            message: message.into(),
        }
    }
}

/// Convenience Result type for RIME operations.
pub type Result<T> = std::result::Result<T, RimeError>;

impl From<serde_json::Error> for RimeError {
    fn from(err: serde_json::Error) -> Self {
        RimeError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let id = Uuid::nil();
        let err = RimeError::InvalidTransition {
            action_id: id,
            from: ActionStatus::Completed,
            to: ActionStatus::Executing,
        };
        assert_eq!(
            err.to_string(),
            format!("Invalid transition for action {id}: completed -> executing")
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(RimeError::provider("code", "boom").is_recoverable());
        assert!(RimeError::Timeout { duration_ms: 10, message: "slow".into() }.is_recoverable());
        assert!(!RimeError::ActionNotFound(Uuid::nil()).is_recoverable());
    }

    #[test]
    fn test_action_id() {
        let id = Uuid::new_v4();
        assert_eq!(RimeError::ActionNotFound(id).action_id(), Some(id));
        assert_eq!(RimeError::Internal("x".into()).action_id(), None);
    }
}
