//! Intent types and builder.
//!
//! An Intent is a free-form user request together with who asked and when.
//! It is immutable once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ScreenContext;
use crate::error::{Result, RimeError};

/// Coarse classification of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    /// Imperative request ("fix this error").
    #[default]
    Command,
    /// Information request ("how do hooks work?").
    Question,
    /// Direct action request ("open the file").
    Action,
}

/// A user request awaiting handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Unique identifier for this intent.
    pub id: Uuid,

    /// Free-text query as typed or spoken by the user.
    pub query: String,

    /// Request classifier.
    #[serde(rename = "type")]
    pub intent_type: IntentType,

    /// Context snapshot attached by the caller, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ScreenContext>,

    /// Originating user.
    pub user_id: String,

    /// Originating session.
    pub session_id: String,

    /// Timestamp when the intent was created.
    pub created_at: DateTime<Utc>,
}

/// Builder for creating Intents with a fluent API.
#[derive(Debug, Default)]
pub struct IntentBuilder {
    query: Option<String>,
    intent_type: IntentType,
    context: Option<ScreenContext>,
    user_id: Option<String>,
    session_id: Option<String>,
}

impl IntentBuilder {
    /// Create a new IntentBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query text.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the intent type.
    pub fn intent_type(mut self, intent_type: IntentType) -> Self {
        self.intent_type = intent_type;
        self
    }

    /// Attach a context snapshot.
    pub fn context(mut self, context: ScreenContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the originating user.
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the originating session.
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Build the Intent.
    ///
    /// Missing user defaults to `"default"`, a missing session gets a fresh id.
    pub fn build(self) -> Result<Intent> {
        let query = self.query.ok_or_else(|| RimeError::IntentInvalid {
            intent_id: None,
            message: "Query is required".to_string(),
        })?;

        let intent = Intent {
            id: Uuid::new_v4(),
            query,
            intent_type: self.intent_type,
            context: self.context,
            user_id: self.user_id.unwrap_or_else(|| "default".to_string()),
            session_id: self
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            created_at: Utc::now(),
        };
        intent.validate()?;

        Ok(intent)
    }
}

impl Intent {
    /// Create a new IntentBuilder.
    pub fn builder() -> IntentBuilder {
        IntentBuilder::new()
    }

    /// Validate the intent.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(RimeError::IntentInvalid {
                intent_id: Some(self.id),
                message: "Query cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Lowercased query, used by keyword matching.
    pub fn normalized_query(&self) -> String {
        self.query.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_builder() {
        let intent = Intent::builder()
            .query("fix this error")
            .intent_type(IntentType::Command)
            .user("demo-user")
            .session("s-1")
            .build()
            .unwrap();

        assert_eq!(intent.query, "fix this error");
        assert_eq!(intent.user_id, "demo-user");
        assert_eq!(intent.session_id, "s-1");
        assert!(intent.context.is_none());
    }

    #[test]
    fn test_intent_builder_defaults() {
        let intent = Intent::builder().query("hello").build().unwrap();
        assert_eq!(intent.intent_type, IntentType::Command);
        assert_eq!(intent.user_id, "default");
        assert!(Uuid::parse_str(&intent.session_id).is_ok());
    }

    #[test]
    fn test_intent_builder_missing_query() {
        let result = Intent::builder().build();
        assert!(matches!(result, Err(RimeError::IntentInvalid { .. })));
    }

    #[test]
    fn test_blank_query_rejected() {
        let result = Intent::builder().query("   ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_type_serializes_as_type() {
        let intent = Intent::builder()
            .query("why?")
            .intent_type(IntentType::Question)
            .build()
            .unwrap();
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], "question");
        assert!(json.get("sessionId").is_some());
        assert!(json.get("context").is_none());
    }
}
