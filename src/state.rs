//! Unified application state for presentation consumers
//!
//! - **Orchestrator**: writes a fresh snapshot after every processed input
//! - **Presentation**: reads snapshots for rendering, sends commands
//!
//! State is queried from `SharedAppState`; events only say that something
//! changed or carry data worth reacting to (a finished tool run, a new turn).

use crate::messages::ConversationTurn;
use crate::tools::{highlighter_for, ToolKind, ToolResult, ToolState};
use crate::voice::VoiceSessionState;
use parking_lot::RwLock;
use std::sync::Arc;

/// What the tool view renders
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolView {
    pub kind: ToolKind,
    pub input: String,
    pub language: String,
    pub status: ToolState,
}

impl ToolView {
    pub fn placeholder(&self) -> &'static str {
        self.kind.placeholder()
    }

    pub fn highlighter(&self) -> &'static str {
        highlighter_for(&self.language)
    }

    pub fn result(&self) -> Option<&ToolResult> {
        self.status.result()
    }

    /// The run button is disabled while submitting or with blank input
    pub fn can_submit(&self, input: &str) -> bool {
        !self.status.is_submitting() && !input.trim().is_empty()
    }
}

/// Unified application state
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub tool: ToolView,
    pub voice: VoiceSessionState,
    pub transcript: Vec<ConversationTurn>,
    /// Latest display-only notice (capture unsupported, recognition error)
    pub notice: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if neither workflow has work outstanding
    pub fn is_idle(&self) -> bool {
        !self.tool.status.is_submitting() && self.voice.is_idle()
    }
}

/// Thread-safe shared application state
#[derive(Clone, Default)]
pub struct SharedAppState {
    inner: Arc<RwLock<AppState>>,
}

impl SharedAppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current state (no lock held after return)
    pub fn snapshot(&self) -> AppState {
        self.inner.read().clone()
    }

    pub(crate) fn replace(&self, state: AppState) {
        *self.inner.write() = state;
    }

    pub fn voice_state(&self) -> VoiceSessionState {
        self.inner.read().voice
    }

    pub fn tool_status(&self) -> ToolState {
        self.inner.read().tool.status.clone()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.read().is_idle()
    }
}

/// Intents forwarded by presentation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppCommand {
    /// Switch the active code tool
    SelectTool(ToolKind),
    /// Run the active tool on `source_text`
    Submit {
        source_text: String,
        language: String,
    },
    /// Tap the microphone
    StartCapture,
    /// Stop listening early
    StopCapture,
    /// Leave the tool page
    ResetTool,
    /// Leave the voice page
    ResetVoice,
    /// Shutdown the orchestrator
    Shutdown,
}

/// Notifications for presentation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// State has changed (trigger repaint)
    StateChanged,
    /// A tool request finished
    ToolCompleted(ToolResult),
    /// A transcript turn was appended
    TurnAppended(ConversationTurn),
    /// The voice session moved to a new state
    VoiceStateChanged(VoiceSessionState),
    /// Display-only notice
    Notice(String),
    /// Shutdown complete
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_is_independent() {
        let shared = SharedAppState::new();
        let before = shared.snapshot();

        let mut next = AppState::new();
        next.voice = VoiceSessionState::Listening;
        shared.replace(next);

        assert!(before.voice.is_idle());
        assert!(shared.voice_state().is_listening());
        assert!(!shared.is_idle());
    }

    #[test]
    fn test_tool_view_helpers() {
        let view = ToolView {
            kind: ToolKind::Debug,
            language: "C#".to_string(),
            ..ToolView::default()
        };
        assert_eq!(view.highlighter(), "csharp");
        assert_eq!(view.placeholder(), "Paste your buggy code here...");
        assert!(view.can_submit("x"));
        assert!(!view.can_submit("  "));

        let busy = ToolView {
            status: ToolState::Submitting,
            ..view
        };
        assert!(!busy.can_submit("x"));
    }
}
