//! The model gateway contract
//!
//! One prompt in, one text (or one typed failure) out. No retries, no side
//! effects beyond the call itself.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors returned by a [`ModelGateway`].
///
/// Every variant carries a human-readable cause; controllers surface
/// `to_string()` in-band and never propagate these further.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The caller passed a prompt that is empty after trimming.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// The gateway is missing credentials or endpoint settings.
    #[error("gateway not configured: {0}")]
    NotConfigured(String),

    /// The request could not be delivered or the provider rejected it.
    #[error("request failed: {0}")]
    Request(String),

    /// Authentication was rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The provider asked us to slow down (HTTP 429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The requested model does not exist (HTTP 404).
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The provider answered with something we could not read.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// No answer arrived within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Any other provider failure, message passed through verbatim.
    #[error("{0}")]
    Provider(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Request(format!("timeout: {e}"))
        } else {
            GatewayError::Request(e.to_string())
        }
    }
}

/// A capability that turns a prompt into model output.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Short name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Issue exactly one request for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on empty prompts, transport failures or
    /// unreadable provider responses.
    async fn invoke(&self, prompt: &str) -> Result<String, GatewayError>;
}

/// A prompt ready to be sent, tagged with the ticket of the controller
/// transition that produced it. The ticket travels back with the resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall<T> {
    pub ticket: T,
    pub prompt: String,
}

/// Invoke `gateway`, optionally bounded by `timeout`.
///
/// Empty prompts are rejected before the gateway is contacted.
pub async fn invoke_with_timeout(
    gateway: &dyn ModelGateway,
    prompt: &str,
    timeout: Option<Duration>,
) -> Result<String, GatewayError> {
    if prompt.trim().is_empty() {
        return Err(GatewayError::EmptyPrompt);
    }

    match timeout {
        None => gateway.invoke(prompt).await,
        Some(limit) => match tokio::time::timeout(limit, gateway.invoke(prompt)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(gateway = gateway.name(), ?limit, "gateway call timed out");
                Err(GatewayError::Timeout(limit))
            }
        },
    }
}
