pub mod controller;
pub mod types;

pub use controller::{ToolRequestController, ToolTicket};
pub use types::{
    highlighter_for, is_supported_language, supported_languages, ToolKind, ToolRequest,
    ToolResult, ToolState, DEFAULT_LANGUAGE, LANGUAGES,
};
