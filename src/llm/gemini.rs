//! Gemini `generateContent` transport
//!
//! One POST per invocation. Status codes are mapped onto [`GatewayError`]
//! variants; the provider's own error message is kept when the body has one.

use crate::llm::config::GatewayConfig;
use crate::llm::gateway::{GatewayError, ModelGateway};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gateway backed by the Gemini REST API
pub struct GeminiGateway {
    config: GatewayConfig,
    http: reqwest::Client,
}

impl GeminiGateway {
    /// Create a gateway from configuration.
    ///
    /// The API key is resolved per call, so a key exported after startup is
    /// still picked up.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the gateway configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn invoke(&self, prompt: &str) -> Result<String, GatewayError> {
        if prompt.trim().is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }

        let api_key = self.config.resolve_api_key().ok_or_else(|| {
            GatewayError::NotConfigured("set the API_KEY environment variable".to_string())
        })?;
        let url = self.config.generate_url();

        debug!(
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "sending generateContent request"
        );

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text).unwrap_or_else(|| text.clone());
            warn!(status = status.as_u16(), %message, "gemini request rejected");

            return Err(match status.as_u16() {
                401 | 403 => GatewayError::Auth(message),
                404 => GatewayError::ModelNotFound(format!(
                    "model '{}': {}",
                    self.config.model, message
                )),
                429 => GatewayError::RateLimited(message),
                _ => GatewayError::Request(format!("HTTP {status}: {message}")),
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            GatewayError::InvalidResponse(format!("failed to parse response: {e}"))
        })?;

        let text = collect_text(parsed)?;
        debug!(response_chars = text.len(), "generateContent response received");
        Ok(text)
    }
}

fn collect_text(response: GenerateResponse) -> Result<String, GatewayError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("prompt blocked: {r}"))
            .unwrap_or_else(|| "response contained no candidates".to_string());
        return Err(GatewayError::InvalidResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    Ok(text)
}

/// Pull `error.message` out of a Google API error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_collect_text_joins_parts() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Use "},{"text":"ls."}],"role":"model"}}]}"#,
        );
        assert_eq!(collect_text(response).unwrap(), "Use ls.");
    }

    #[test]
    fn test_collect_text_reports_block_reason() {
        let response = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        let err = collect_text(response).unwrap_err();
        assert_eq!(
            err,
            GatewayError::InvalidResponse("prompt blocked: SAFETY".to_string())
        );
    }

    #[test]
    fn test_extract_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("API key not valid")
        );
        assert!(extract_error_message("not json").is_none());
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_locally() {
        let gateway = GeminiGateway::new(GatewayConfig::default().with_api_key("k"));
        assert_eq!(gateway.invoke("").await, Err(GatewayError::EmptyPrompt));
    }
}
