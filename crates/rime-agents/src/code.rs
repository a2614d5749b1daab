//! Code agent: fixes, explanations and commands for the code on screen.

use std::time::Duration;

use async_trait::async_trait;
use rime_core::{
    Action, ActionType, AgentId, AgentResult, AgentState, AgentStatus, ApplicationType, Intent,
    Result, ScreenContext,
};
use serde_json::json;
use tracing::debug;

use crate::provider::{contains_any, matches_capabilities, CapabilityProvider, StatusTracker};

const TRIGGERS: [&str; 11] = [
    "fix", "error", "bug", "debug", "explain", "refactor", "compile", "run", "test", "crash",
    "exception",
];

const PROBLEM_WORDS: [&str; 4] = ["fix", "error", "bug", "debug"];

/// Proposes code fixes and explanations grounded in editor diagnostics.
pub struct CodeAgent {
    id: AgentId,
    status: StatusTracker,
    latency: Duration,
}

impl CodeAgent {
    pub fn new() -> Self {
        let id = AgentId::from("code");
        Self {
            status: StatusTracker::new(id.clone()),
            id,
            latency: Duration::from_millis(600),
        }
    }

    /// Override the simulated analysis latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn propose(&self, intent: &Intent, context: &ScreenContext) -> Vec<Action> {
        let mut actions = Vec::new();

        if let Some((code, error)) = context.first_error() {
            actions.push(Action::new(
                &self.id,
                ActionType::CodeFix,
                format!("Fix: {}", error.message),
                format!("Apply a fix in {} at line {}", code.file_name, error.line),
                json!({
                    "fileName": code.file_name,
                    "line": error.line,
                    "language": code.language,
                    "snippet": code.code_snippet,
                    "error": error.message,
                }),
                0.9,
            ));
            actions.push(Action::new(
                &self.id,
                ActionType::Explain,
                "Explain error",
                format!("Explain why \"{}\" happens", error.message),
                json!({ "error": error.message, "language": code.language }),
                0.7,
            ));
            actions.push(Action::new(
                &self.id,
                ActionType::OpenFile,
                format!("Open {}:{}", code.file_name, error.line),
                "Jump to the failing line".to_string(),
                json!({ "fileName": code.file_name, "line": error.line }),
                0.6,
            ));
            return actions;
        }

        if contains_any(&intent.query, &["run", "test", "compile"]) {
            actions.push(Action::new(
                &self.id,
                ActionType::RunCommand,
                "Run project checks",
                "Run the build and test suite in the terminal",
                json!({ "command": suggested_command(context) }),
                0.65,
            ));
        }

        actions.push(Action::new(
            &self.id,
            ActionType::Explain,
            "Explain code",
            format!("Explain: \"{}\"", intent.query),
            json!({
                "query": intent.query,
                "snippet": context
                    .analysis
                    .code_context
                    .as_ref()
                    .and_then(|c| c.code_snippet.clone()),
            }),
            0.6,
        ));

        actions
    }
}

fn suggested_command(context: &ScreenContext) -> &'static str {
    match context.analysis.code_context.as_ref().map(|c| c.language.as_str()) {
        Some("rust") => "cargo test",
        Some("python") => "pytest",
        Some("go") => "go test ./...",
        _ => "npm test",
    }
}

impl Default for CodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityProvider for CodeAgent {
    fn id(&self) -> &AgentId {
        &self.id
    }

    fn name(&self) -> &str {
        "Code Agent"
    }

    fn capabilities(&self) -> &[&'static str] {
        &[
            "fix errors",
            "debug code",
            "explain code",
            "refactor",
            "run tests",
            "open file",
        ]
    }

    async fn can_handle(&self, intent: &Intent, _context: &ScreenContext) -> bool {
        contains_any(&intent.query, &TRIGGERS)
            || matches_capabilities(self.capabilities(), &intent.query)
    }

    async fn confidence(&self, intent: &Intent, context: &ScreenContext) -> f32 {
        let mut confidence: f32 = 0.4;

        if contains_any(&intent.query, &PROBLEM_WORDS) {
            confidence += 0.3;
        }
        if context.has_code_errors() {
            confidence += 0.2;
        }
        if matches!(
            context.analysis.application,
            ApplicationType::Editor | ApplicationType::Terminal
        ) {
            confidence += 0.1;
        }

        confidence.min(1.0)
    }

    async fn execute(&self, intent: &Intent, context: &ScreenContext) -> Result<AgentResult> {
        let guard = self.status.begin("Reading code context...");

        let actions = self.propose(intent, context);
        debug!(intent_id = %intent.id, count = actions.len(), "code actions proposed");

        self.status.set(AgentStatus::Working, 60, "Preparing code changes...");
        tokio::time::sleep(self.latency).await;

        let file = context
            .analysis
            .code_context
            .as_ref()
            .map(|c| c.file_name.clone());
        let result = Ok(AgentResult {
            agent_id: self.id.clone(),
            confidence: self.confidence(intent, context).await,
            actions,
            explanation: "I can analyze the code on screen and propose fixes.".to_string(),
            metadata: json!({
                "file": file,
                "errorCount": context
                    .analysis
                    .code_context
                    .as_ref()
                    .map_or(0, |c| c.errors.len()),
            }),
        });

        guard.finish(&result, "Code analysis complete");
        result
    }

    async fn state(&self) -> AgentState {
        self.status.snapshot()
    }
}
