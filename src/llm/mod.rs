//! Model gateway integration
//!
//! This module firewalls the remote inference provider behind a single
//! narrow call. Controllers build prompts, the gateway turns one prompt into
//! one piece of text or a typed failure.
//!
//! - **config**: Endpoint, model and credential settings
//! - **gateway**: The `ModelGateway` contract, `GatewayError`, timeout wrapper
//! - **gemini**: HTTP transport for the Gemini `generateContent` endpoint
//! - **prompts**: Tool templates, the voice persona and fixed reply texts
//!
//! # Usage
//!
//! ```rust,ignore
//! use codeai::llm::{GatewayConfig, GeminiGateway, ModelGateway, prompts};
//! use codeai::tools::ToolKind;
//!
//! let gateway = GeminiGateway::new(GatewayConfig::default());
//! let prompt = prompts::tool_prompt(ToolKind::Explain, "print('hi')", "Python");
//! let text = gateway.invoke(&prompt).await?;
//! ```

pub mod config;
pub mod gateway;
pub mod gemini;
pub mod prompts;

pub use config::GatewayConfig;
pub use gateway::{invoke_with_timeout, GatewayCall, GatewayError, ModelGateway};
pub use gemini::GeminiGateway;
