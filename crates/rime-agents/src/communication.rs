//! Communication agent: drafts messages and schedules meetings.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use rime_core::{
    Action, ActionType, ActivityType, AgentId, AgentResult, AgentState, AgentStatus,
    ApplicationType, Intent, Result, ScreenContext,
};
use serde_json::json;
use tracing::debug;

use crate::provider::{contains_any, matches_capabilities, CapabilityProvider, StatusTracker};

const TRIGGERS: [&str; 14] = [
    "tell", "message", "send", "email", "slack", "notify", "schedule", "meeting", "calendar",
    "remind", "ask", "draft", "write to", "contact",
];

fn recipient_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)(?:tell|message|send to|email|ask)\s+(\w+)")
                .expect("Invalid recipient regex"),
            Regex::new(r"(?i)(?:for|with)\s+(\w+)").expect("Invalid recipient regex"),
        ]
    })
}

fn subject_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)about\s+(.+)").expect("Invalid subject regex"))
}

/// First name-like token following a verb such as "tell" or "email".
pub fn extract_recipient(query: &str) -> Option<String> {
    recipient_patterns()
        .iter()
        .find_map(|re| re.captures(query))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Text after "about", or the first five words.
pub fn extract_subject(query: &str) -> String {
    match subject_pattern().captures(query).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => query.split_whitespace().take(5).collect::<Vec<_>>().join(" "),
    }
}

/// Drafts messages and meeting invites.
pub struct CommunicationAgent {
    id: AgentId,
    status: StatusTracker,
    latency: Duration,
}

impl CommunicationAgent {
    pub fn new() -> Self {
        let id = AgentId::from("communication");
        Self {
            status: StatusTracker::new(id.clone()),
            id,
            latency: Duration::from_millis(400),
        }
    }

    /// Override the simulated drafting latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn propose(&self, intent: &Intent, context: &ScreenContext) -> Vec<Action> {
        let query = intent.normalized_query();
        let recipient = extract_recipient(&intent.query);
        let subject = extract_subject(&intent.query);

        if query.contains("schedule") || query.contains("meeting") {
            let description = match &recipient {
                Some(r) => format!("Create calendar invite for {r}"),
                None => "Create calendar invite".to_string(),
            };
            return vec![Action::new(
                &self.id,
                ActionType::ScheduleEvent,
                "Schedule meeting",
                description,
                json!({
                    "recipient": recipient.as_deref().unwrap_or("team"),
                    "subject": subject,
                    "suggestedTimes": [
                        "Tomorrow at 2:00 PM",
                        "Tomorrow at 3:30 PM",
                        "Day after tomorrow at 10:00 AM",
                    ],
                }),
                0.75,
            )];
        }

        let title = match &recipient {
            Some(r) => format!("Draft message to {r}"),
            None => "Draft message".to_string(),
        };
        let mut actions = vec![Action::new(
            &self.id,
            ActionType::DraftMessage,
            title,
            "AI-generated message based on your intent",
            json!({
                "recipient": recipient.as_deref().unwrap_or("Unknown"),
                "subject": subject,
                "message": draft_message(&intent.query, recipient.as_deref(), context),
                "suggestedChannel": suggest_channel(context),
            }),
            0.8,
        )];

        if query.contains("bug") || query.contains("issue") {
            actions.push(Action::new(
                &self.id,
                ActionType::DraftMessage,
                "Add follow-up reminder",
                "Set reminder to check for response",
                json!({
                    "reminderTime": "2 hours",
                    "message": format!(
                        "Check if {} responded",
                        recipient.as_deref().unwrap_or("recipient")
                    ),
                }),
                0.6,
            ));
        }

        actions
    }
}

fn draft_message(query: &str, recipient: Option<&str>, context: &ScreenContext) -> String {
    let mut message = format!("Hey {},\n\n", recipient.unwrap_or("there"));

    match context.first_error() {
        Some((_, error)) => {
            message.push_str(&format!(
                "I'm encountering an issue: \"{}\" on line {}. ",
                error.message, error.line
            ));
            message.push_str("Could you take a look when you get a chance?\n\n");
        }
        None => {
            message.push_str(query);
            message.push_str("\n\n");
        }
    }

    message.push_str("Thanks!");
    message
}

fn suggest_channel(context: &ScreenContext) -> &'static str {
    if context.has_code_errors() {
        "#engineering-help"
    } else {
        "#general"
    }
}

impl Default for CommunicationAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for CommunicationAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "Communication Agent"
    }

    fn capabilities(&self) -> &[&'static str] {
        &[
            "draft message",
            "send message",
            "schedule meeting",
            "calendar",
            "email",
            "slack",
            "notify",
            "remind",
        ]
    }

    async fn can_handle(&self, intent: &Intent, _context: &ScreenContext) -> bool {
        contains_any(&intent.query, &TRIGGERS)
            || matches_capabilities(self.capabilities(), &intent.query)
    }

    async fn confidence(&self, intent: &Intent, context: &ScreenContext) -> f32 {
        let mut confidence: f32 = 0.3;

        if contains_any(&intent.query, &["message", "tell"]) {
            confidence += 0.4;
        }
        if contains_any(&intent.query, &["schedule", "meeting"]) {
            confidence += 0.3;
        }
        if context.analysis.application == ApplicationType::Chat {
            confidence += 0.2;
        }
        if context.analysis.user_activity == ActivityType::Typing {
            confidence += 0.1;
        }
        if extract_recipient(&intent.query).is_some() {
            confidence += 0.2;
        }

        confidence.min(1.0)
    }

    async fn execute(&self, intent: &Intent, context: &ScreenContext) -> Result<AgentResult> {
        let guard = self.status.begin("Understanding communication intent...");

        let actions = self.propose(intent, context);
        debug!(intent_id = %intent.id, count = actions.len(), "communication actions proposed");

        self.status.set(AgentStatus::Working, 60, "Drafting message...");
        tokio::time::sleep(self.latency).await;

        let kind = if intent.normalized_query().contains("schedule") {
            "meeting"
        } else {
            "message"
        };
        let result = Ok(AgentResult {
            agent_id: self.id.clone(),
            confidence: self.confidence(intent, context).await,
            actions,
            explanation: "I can help you communicate effectively.".to_string(),
            metadata: json!({
                "recipient": extract_recipient(&intent.query),
                "communicationType": kind,
            }),
        });

        guard.finish(&result, "Draft ready");
        result
    }

    async fn state(&self) -> AgentState {
        self.status.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rime_core::Scenario;

    fn agent() -> CommunicationAgent {
        CommunicationAgent::new().with_latency(Duration::ZERO)
    }

    fn intent(query: &str) -> Intent {
        Intent::builder().query(query).build().unwrap()
    }

    #[test]
    fn test_extract_recipient() {
        assert_eq!(extract_recipient("tell Sarah about this bug").as_deref(), Some("Sarah"));
        assert_eq!(extract_recipient("set up a sync with Bob").as_deref(), Some("Bob"));
        assert_eq!(extract_recipient("hello"), None);
    }

    #[test]
    fn test_extract_subject() {
        assert_eq!(extract_subject("tell Sarah about this bug"), "this bug");
        assert_eq!(
            extract_subject("schedule a quick sync next week please"),
            "schedule a quick sync next"
        );
    }

    #[tokio::test]
    async fn test_confidence_communication_scenario() {
        let s = Scenario::communication();
        let c = agent().confidence(&intent(s.query), &s.context).await;
        assert_eq!(c, 1.0);
    }

    #[tokio::test]
    async fn test_execute_bug_message_adds_reminder() {
        let agent = agent();
        let s = Scenario::communication();
        let result = agent.execute(&intent(s.query), &s.context).await.unwrap();

        assert_eq!(result.actions.len(), 2);
        assert_eq!(result.actions[0].title, "Draft message to Sarah");
        assert_eq!(result.actions[1].title, "Add follow-up reminder");
        assert_eq!(result.actions[0].payload["suggestedChannel"], "#general");
        assert_eq!(agent.state().await.status, AgentStatus::Idle);
    }

    #[tokio::test]
    async fn test_execute_meeting() {
        let result = agent()
            .execute(&intent("schedule a meeting with Alex"), &ScreenContext::idle())
            .await
            .unwrap();
        assert_eq!(result.actions.len(), 1);
        assert_eq!(result.actions[0].action_type, ActionType::ScheduleEvent);
        assert_eq!(result.actions[0].payload["recipient"], "Alex");
    }
}
