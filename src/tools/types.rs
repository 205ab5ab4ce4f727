use serde::{Deserialize, Serialize};
use std::fmt;

use crate::llm::prompts;

/// The four code tools offered in the tool view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Generate,
    Explain,
    Debug,
    Optimize,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Generate,
        ToolKind::Explain,
        ToolKind::Debug,
        ToolKind::Optimize,
    ];

    /// Display label for the tool selector
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::Generate => "Code Generation",
            ToolKind::Explain => "Explanation",
            ToolKind::Debug => "Debugging",
            ToolKind::Optimize => "Optimization",
        }
    }

    /// Hint shown in the empty input pane
    pub fn placeholder(&self) -> &'static str {
        match self {
            ToolKind::Generate => "e.g., a login form with validation",
            ToolKind::Explain => "Paste your code here for an explanation...",
            ToolKind::Debug => "Paste your buggy code here...",
            ToolKind::Optimize => "Paste code to be optimized...",
        }
    }

    /// Caption of the run button
    pub fn run_label(&self) -> String {
        format!("Run {}", self.label())
    }

    /// Parse a loose user-supplied name ("explain", "Debugging", ...)
    pub fn parse(name: &str) -> Option<ToolKind> {
        let name = name.trim().to_ascii_lowercase();
        ToolKind::ALL.into_iter().find(|kind| {
            let short = format!("{kind:?}").to_ascii_lowercase();
            name == short || name == kind.label().to_ascii_lowercase()
        })
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Languages offered by the language picker, paired with the identifier the
/// syntax highlighter understands.
pub const LANGUAGES: [(&str, &str); 21] = [
    ("JavaScript", "javascript"),
    ("TypeScript", "typescript"),
    ("Python", "python"),
    ("Java", "java"),
    ("C", "c"),
    ("C++", "cpp"),
    ("C#", "csharp"),
    ("Go", "go"),
    ("Rust", "rust"),
    ("PHP", "php"),
    ("Ruby", "ruby"),
    ("Swift", "swift"),
    ("Kotlin", "kotlin"),
    ("HTML", "html"),
    ("CSS", "css"),
    ("SQL", "sql"),
    ("Node.js", "javascript"),
    ("React.js", "jsx"),
    ("Kafka", "text"),
    ("R", "r"),
    ("Shell", "shell"),
];

pub const DEFAULT_LANGUAGE: &str = "JavaScript";

/// Names of all supported languages, in picker order
pub fn supported_languages() -> impl Iterator<Item = &'static str> {
    LANGUAGES.iter().map(|(name, _)| *name)
}

pub fn is_supported_language(language: &str) -> bool {
    LANGUAGES.iter().any(|(name, _)| *name == language)
}

/// Highlighter id for `language`; unsupported languages fall back to plain text.
pub fn highlighter_for(language: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|(name, _)| *name == language)
        .map(|(_, id)| *id)
        .unwrap_or("text")
}

/// A submitted tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRequest {
    pub kind: ToolKind,
    pub source_text: String,
    pub language: String,
}

impl ToolRequest {
    pub fn new(kind: ToolKind, source_text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            kind,
            source_text: source_text.into(),
            language: language.into(),
        }
    }

    /// Requests with blank source are rejected before any gateway call.
    pub fn is_valid(&self) -> bool {
        !self.source_text.trim().is_empty()
    }

    pub fn prompt(&self) -> String {
        prompts::tool_prompt(self.kind, &self.source_text, &self.language)
    }
}

/// Outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ToolResult {
    Success(String),
    Failure(String),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    /// Text for the output pane. Failures get the same channel as success.
    pub fn display_text(&self) -> String {
        match self {
            ToolResult::Success(text) => text.clone(),
            ToolResult::Failure(message) => prompts::tool_failure_text(message),
        }
    }
}

/// Status of a tool controller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ToolState {
    #[default]
    Idle,
    Submitting,
    Done(ToolResult),
}

impl ToolState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, ToolState::Submitting)
    }

    pub fn result(&self) -> Option<&ToolResult> {
        match self {
            ToolState::Done(result) => Some(result),
            _ => None,
        }
    }
}

impl fmt::Display for ToolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolState::Idle => write!(f, "Idle"),
            ToolState::Submitting => write!(f, "Processing..."),
            ToolState::Done(ToolResult::Success(_)) => write!(f, "Done"),
            ToolState::Done(ToolResult::Failure(_)) => write!(f, "Failed"),
        }
    }
}
