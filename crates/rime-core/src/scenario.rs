//! Built-in demo scenarios used in mock mode and tests.

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::context::{
    ActivityType, ApplicationType, BrowserContext, CodeContext, CodeIssue, IssueSeverity,
    PageType, ScreenCapture, ScreenContext, VisionAnalysis,
};

/// Names of the built-in scenarios.
pub const SCENARIO_IDS: [&str; 4] = ["coding", "debugging", "research", "communication"];

/// A canned screen context paired with a representative query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub query: &'static str,
    pub context: ScreenContext,
}

impl Scenario {
    /// Look up a built-in scenario.
    pub fn by_id(id: &str) -> Option<Scenario> {
        match id {
            "coding" => Some(Self::coding()),
            "debugging" => Some(Self::debugging()),
            "research" => Some(Self::research()),
            "communication" => Some(Self::communication()),
            _ => None,
        }
    }

    /// All built-in scenarios, in a stable order.
    pub fn all() -> Vec<Scenario> {
        SCENARIO_IDS.iter().filter_map(|id| Self::by_id(id)).collect()
    }

    /// Editing a React component with a type error.
    pub fn coding() -> Scenario {
        Scenario {
            id: "coding",
            name: "Coding Scenario",
            description: "User coding in an editor with a TypeScript error",
            query: "fix this error",
            context: context(
                ApplicationType::Editor,
                "App.tsx - my-react-app",
                ActivityType::Coding,
                0.9,
                &["import React", "useState", "useEffect", "function App"],
                Some(CodeContext {
                    language: "typescript".into(),
                    file_name: "App.tsx".into(),
                    line_number: Some(24),
                    code_snippet: Some("const items = data.results.map(item => item.id);".into()),
                    errors: vec![issue(
                        "Property 'map' does not exist on type 'never'",
                        24,
                        IssueSeverity::Error,
                    )],
                }),
                None,
            ),
        }
    }

    /// Debugging a backend with several diagnostics.
    pub fn debugging() -> Scenario {
        Scenario {
            id: "debugging",
            name: "Debugging Scenario",
            description: "User debugging with multiple errors",
            query: "help me debug this",
            context: context(
                ApplicationType::Editor,
                "index.ts - backend",
                ActivityType::Debugging,
                0.85,
                &["express", "router", "middleware", "async"],
                Some(CodeContext {
                    language: "typescript".into(),
                    file_name: "index.ts".into(),
                    line_number: Some(42),
                    code_snippet: None,
                    errors: vec![
                        issue("Cannot find module dotenv", 1, IssueSeverity::Error),
                        issue("Async function lacks await expression", 42, IssueSeverity::Warning),
                    ],
                }),
                None,
            ),
        }
    }

    /// Reading documentation in a browser.
    pub fn research() -> Scenario {
        Scenario {
            id: "research",
            name: "Research Scenario",
            description: "User searching for documentation",
            query: "search for React hooks documentation",
            context: context(
                ApplicationType::Browser,
                "React Hooks - React Documentation",
                ActivityType::Reading,
                0.9,
                &["useState", "useEffect", "useContext", "documentation"],
                None,
                Some(BrowserContext {
                    url: "https://react.dev/reference/react".into(),
                    title: "React Hooks - React Documentation".into(),
                    page_type: PageType::Documentation,
                }),
            ),
        }
    }

    /// Typing in a team chat.
    pub fn communication() -> Scenario {
        Scenario {
            id: "communication",
            name: "Communication Scenario",
            description: "User wants to message a teammate",
            query: "tell Sarah about this bug",
            context: context(
                ApplicationType::Chat,
                "Slack - Engineering Team",
                ActivityType::Typing,
                0.85,
                &["#engineering", "#general", "Sarah Chen", "Message"],
                None,
                None,
            ),
        }
    }
}

fn issue(message: &str, line: u32, severity: IssueSeverity) -> CodeIssue {
    CodeIssue {
        message: message.to_string(),
        line,
        severity,
    }
}

fn context(
    application: ApplicationType,
    window_title: &str,
    activity: ActivityType,
    confidence: f32,
    visible_text: &[&str],
    code_context: Option<CodeContext>,
    browser_context: Option<BrowserContext>,
) -> ScreenContext {
    let now = Utc::now();
    ScreenContext {
        capture: ScreenCapture {
            id: Uuid::new_v4(),
            timestamp: now,
            image_data: String::new(),
            width: 1920,
            height: 1080,
        },
        analysis: VisionAnalysis {
            application,
            window_title: window_title.to_string(),
            user_activity: activity,
            confidence,
            visible_text: visible_text.iter().map(|s| s.to_string()).collect(),
            code_context,
            browser_context,
            timestamp: now,
        },
        state: activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_scenarios_resolve() {
        let all = Scenario::all();
        assert_eq!(all.len(), SCENARIO_IDS.len());
        for (scenario, id) in all.iter().zip(SCENARIO_IDS) {
            assert_eq!(scenario.id, id);
        }
        assert!(Scenario::by_id("nope").is_none());
    }

    #[test]
    fn test_coding_scenario_has_error() {
        let s = Scenario::coding();
        assert!(s.context.has_code_errors());
        assert_eq!(s.context.analysis.application, ApplicationType::Editor);
    }
}
