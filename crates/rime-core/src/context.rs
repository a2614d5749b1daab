//! Screen context snapshot types.
//!
//! Produced by the external context-collection subsystem and treated as
//! read-only input to provider confidence scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the user appears to be doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Idle,
    #[default]
    Active,
    Coding,
    Debugging,
    Reading,
    Typing,
    Communicating,
}

/// Foreground application class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    #[serde(alias = "vscode")]
    Editor,
    #[serde(alias = "chrome")]
    Browser,
    #[serde(alias = "slack")]
    Chat,
    Terminal,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Severity of a detected code issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// A diagnostic visible in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeIssue {
    pub message: String,
    pub line: u32,
    pub severity: IssueSeverity,
}

/// Sub-context present while the user is editing code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeContext {
    pub language: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default)]
    pub errors: Vec<CodeIssue>,
}

/// Kind of page open in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Documentation,
    Github,
    Stackoverflow,
    #[default]
    Generic,
}

/// Sub-context present while the user is browsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserContext {
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub page_type: PageType,
}

/// Derived analysis of a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionAnalysis {
    #[serde(default)]
    pub application: ApplicationType,
    #[serde(default)]
    pub window_title: String,
    #[serde(default)]
    pub user_activity: ActivityType,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub visible_text: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_context: Option<CodeContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser_context: Option<BrowserContext>,
    pub timestamp: DateTime<Utc>,
}

/// Reference to the raw screen capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenCapture {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Base64 image data; empty when only the analysis is forwarded.
    #[serde(default)]
    pub image_data: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ScreenCapture {
    /// A capture with no image attached.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            image_data: String::new(),
            width: 0,
            height: 0,
        }
    }
}

/// A snapshot of the user's current on-screen activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenContext {
    pub capture: ScreenCapture,
    pub analysis: VisionAnalysis,
    pub state: ActivityType,
}

impl ScreenContext {
    /// Context used when nothing has been collected yet.
    pub fn idle() -> Self {
        let now = Utc::now();
        Self {
            capture: ScreenCapture::empty(),
            analysis: VisionAnalysis {
                application: ApplicationType::Unknown,
                window_title: String::new(),
                user_activity: ActivityType::Active,
                confidence: 0.5,
                visible_text: Vec::new(),
                code_context: None,
                browser_context: None,
                timestamp: now,
            },
            state: ActivityType::Active,
        }
    }

    /// True when the code sub-context reports at least one diagnostic.
    pub fn has_code_errors(&self) -> bool {
        self.analysis
            .code_context
            .as_ref()
            .is_some_and(|code| !code.errors.is_empty())
    }

    /// The first reported diagnostic, with its code sub-context.
    pub fn first_error(&self) -> Option<(&CodeContext, &CodeIssue)> {
        let code = self.analysis.code_context.as_ref()?;
        code.errors.first().map(|issue| (code, issue))
    }

    /// Page type of the browser sub-context, if browsing.
    pub fn page_type(&self) -> Option<PageType> {
        self.analysis.browser_context.as_ref().map(|b| b.page_type)
    }
}

impl Default for ScreenContext {
    fn default() -> Self {
        Self::idle()
    }
}
