//! Text-tool workflow: validation, single-flight gating, result capture
//!
//! The controller never talks to the gateway itself. `submit` hands back a
//! [`GatewayCall`] tagged with a [`ToolTicket`]; whoever performs the call
//! feeds the outcome to `resolve` with the same ticket. Any transition that
//! discards the current request (tool switch, reset) bumps the generation,
//! so a late resolution carrying an old ticket is dropped.

use crate::llm::{GatewayCall, GatewayError};
use crate::tools::types::{ToolKind, ToolRequest, ToolResult, ToolState, DEFAULT_LANGUAGE};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifies one submitted tool request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTicket {
    pub generation: u64,
    pub request_id: Uuid,
}

pub struct ToolRequestController {
    kind: ToolKind,
    input: String,
    language: String,
    default_language: String,
    state: ToolState,
    generation: u64,
    in_flight: Option<ToolTicket>,
}

impl ToolRequestController {
    pub fn new() -> Self {
        Self::with_default_language(DEFAULT_LANGUAGE)
    }

    pub fn with_default_language(language: impl Into<String>) -> Self {
        let language = language.into();
        Self {
            kind: ToolKind::default(),
            input: String::new(),
            language: language.clone(),
            default_language: language,
            state: ToolState::Idle,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn result(&self) -> Option<&ToolResult> {
        self.state.result()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.is_submitting()
    }

    /// Switch tools. Clears input and result and abandons any in-flight call.
    pub fn select_tool(&mut self, kind: ToolKind) {
        if self.in_flight.take().is_some() {
            debug!(from = ?self.kind, to = ?kind, "abandoning in-flight tool request");
        }
        self.generation += 1;
        self.kind = kind;
        self.input.clear();
        self.state = ToolState::Idle;
    }

    /// Page-level reset: back to the initial tool and language.
    pub fn reset(&mut self) {
        self.select_tool(ToolKind::default());
        self.language = self.default_language.clone();
    }

    /// Start a request for the active tool.
    ///
    /// Returns `None` (and leaves every field untouched) when the source text
    /// is blank or a request is already outstanding.
    pub fn submit(&mut self, source_text: &str, language: &str) -> Option<GatewayCall<ToolTicket>> {
        if self.state.is_submitting() {
            debug!(kind = ?self.kind, "submit ignored: request already in flight");
            return None;
        }

        let request = ToolRequest::new(self.kind, source_text, language);
        if !request.is_valid() {
            debug!(kind = ?self.kind, "submit ignored: empty source text");
            return None;
        }

        self.generation += 1;
        let ticket = ToolTicket {
            generation: self.generation,
            request_id: Uuid::new_v4(),
        };

        self.input = request.source_text.clone();
        self.language = request.language.clone();
        self.state = ToolState::Submitting;
        self.in_flight = Some(ticket);

        info!(
            kind = ?request.kind,
            language = %request.language,
            request_id = %ticket.request_id,
            "tool request submitted"
        );

        Some(GatewayCall {
            ticket,
            prompt: request.prompt(),
        })
    }

    /// Apply a gateway outcome. Returns `false` for stale tickets.
    pub fn resolve(&mut self, ticket: ToolTicket, outcome: Result<String, GatewayError>) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(
                request_id = %ticket.request_id,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale tool resolution"
            );
            return false;
        }
        self.in_flight = None;

        let result = match outcome {
            Ok(text) => ToolResult::Success(text),
            Err(e) => {
                warn!(request_id = %ticket.request_id, error = %e, "tool request failed");
                ToolResult::Failure(e.to_string())
            }
        };
        self.state = ToolState::Done(result);
        true
    }
}

impl Default for ToolRequestController {
    fn default() -> Self {
        Self::new()
    }
}
