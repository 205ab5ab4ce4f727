//! Prompt templates for the code tools and the voice assistant
//!
//! Template choice is a pure function of the tool kind and language (or of
//! voice mode); nothing here holds state.

use crate::tools::ToolKind;

/// Name the assistant uses for itself, also the transcript speaker label.
pub const ASSISTANT_NAME: &str = "CodeAI";

/// Prefix of the spoken reply when the gateway fails during a voice turn.
pub const VOICE_APOLOGY_PREFIX: &str = "I'm sorry, I encountered an error: ";

/// Prefix shown in the output pane when a tool request fails.
pub const TOOL_FAILURE_PREFIX: &str = "An error occurred while communicating with the AI model: ";

/// Build the prompt for a code tool request
pub fn tool_prompt(kind: ToolKind, source_text: &str, language: &str) -> String {
    match kind {
        ToolKind::Generate => format!(
            "Generate a complete and functional code snippet in {language} for the following task: {source_text}. Provide only the code, without any explanation or markdown formatting."
        ),
        ToolKind::Explain => format!(
            "Explain the following {language} code snippet in detail. Describe its purpose, how it works, and key components: \n\n```{language}\n{source_text}\n```"
        ),
        ToolKind::Debug => format!(
            "Debug the following {language} code snippet. Identify any errors, explain the root cause, and provide a corrected version with an explanation of the fix: \n\n```{language}\n{source_text}\n```"
        ),
        ToolKind::Optimize => format!(
            "Optimize the following {language} code snippet for performance and efficiency. Provide the optimized code and explain the improvements made: \n\n```{language}\n{source_text}\n```"
        ),
    }
}

/// Wrap a raw utterance in the voice persona
pub fn voice_prompt(utterance: &str) -> String {
    format!(
        "You are {ASSISTANT_NAME}, a helpful and friendly voice assistant for software developers. Your responses should be conversational and concise, suitable for being spoken aloud. Address the user's query directly. User query: \"{utterance}\""
    )
}

/// Spoken reply for a failed voice turn
pub fn voice_apology(cause: &str) -> String {
    format!("{VOICE_APOLOGY_PREFIX}{cause}")
}

/// Output pane text for a failed tool request
pub fn tool_failure_text(cause: &str) -> String {
    format!("{TOOL_FAILURE_PREFIX}{cause}")
}
