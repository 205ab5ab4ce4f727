//! Wiring of gateway, capabilities and controllers into one event loop

pub mod config;
pub mod orchestrator;

pub use config::{AppConfig, ToolConfig, VoiceConfig};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorHandle};
