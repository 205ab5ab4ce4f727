//! Configuration for the integration layer
//!
//! Provides centralized configuration for all components. Values come from
//! defaults, an optional TOML file and a few environment overrides, in that
//! order.

use crate::llm::config::API_KEY_ENV_VARS;
use crate::llm::GatewayConfig;
use crate::tools::DEFAULT_LANGUAGE;
use crate::{CodeAiError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the model id
pub const MODEL_ENV_VAR: &str = "CODEAI_MODEL";

/// Voice session settings
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VoiceConfig {
    /// Start every capture with an empty transcript
    pub reset_transcript_on_capture: bool,

    /// Speak assistant replies when a speech output is present
    pub speak_responses: bool,

    /// Pace of the terminal speaker
    pub words_per_minute: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            reset_transcript_on_capture: true,
            speak_responses: true,
            words_per_minute: 170,
        }
    }
}

/// Code tool settings
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolConfig {
    /// Language preselected in the picker
    pub default_language: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Configuration for the complete application
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Model gateway configuration
    pub gateway: GatewayConfig,

    /// Bound on each gateway call in milliseconds; none means wait
    /// indefinitely
    pub gateway_timeout_ms: Option<u64>,

    /// Voice session configuration
    pub voice: VoiceConfig,

    /// Code tool configuration
    pub tools: ToolConfig,
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Load `path` when given, defaults otherwise, then apply env overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var(MODEL_ENV_VAR) {
            if !model.trim().is_empty() {
                self.gateway.model = model;
            }
        }
        self
    }

    /// Set the gateway configuration
    pub fn with_gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = gateway;
        self
    }

    /// Bound every gateway call
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Disable spoken replies (text-only mode)
    pub fn without_speech(mut self) -> Self {
        self.voice.speak_responses = false;
        self
    }

    /// Keep the transcript across captures
    pub fn retaining_transcript(mut self) -> Self {
        self.voice.reset_transcript_on_capture = false;
        self
    }

    pub fn gateway_timeout(&self) -> Option<Duration> {
        self.gateway_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    ///
    /// A missing API key only warns: calls then fail in-band.
    pub fn validate(&self) -> Result<()> {
        if self.gateway.model.trim().is_empty() {
            return Err(CodeAiError::ConfigError("gateway.model is empty".to_string()));
        }
        if !self.gateway.base_url.starts_with("http://")
            && !self.gateway.base_url.starts_with("https://")
        {
            return Err(CodeAiError::ConfigError(format!(
                "gateway.base_url must be an http(s) URL: {}",
                self.gateway.base_url
            )));
        }
        if self.gateway_timeout_ms == Some(0) {
            return Err(CodeAiError::ConfigError(
                "gateway_timeout_ms must be positive".to_string(),
            ));
        }
        if self.voice.words_per_minute == 0 {
            return Err(CodeAiError::ConfigError(
                "voice.words_per_minute must be positive".to_string(),
            ));
        }
        if self.gateway.resolve_api_key().is_none() {
            warn!(
                "{} environment variable not set. Gemini API calls will fail.",
                API_KEY_ENV_VARS[0]
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.voice.reset_transcript_on_capture);
        assert!(config.voice.speak_responses);
        assert_eq!(config.tools.default_language, "JavaScript");
        assert_eq!(config.gateway_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml_str(
            r#"
            gateway_timeout_ms = 30000

            [gateway]
            model = "gemini-2.5-flash"

            [voice]
            speak_responses = false
            "#,
        )
        .unwrap();

        assert_eq!(config.gateway.model, "gemini-2.5-flash");
        assert_eq!(config.gateway.base_url, crate::llm::config::DEFAULT_BASE_URL);
        assert_eq!(config.gateway_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.voice.speak_responses);
        assert_eq!(config.voice.words_per_minute, 170);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = AppConfig::from_toml_str("gateway = 3").unwrap_err();
        assert!(matches!(err, CodeAiError::ConfigError(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = AppConfig::default()
            .without_speech()
            .retaining_transcript()
            .with_gateway_timeout(Duration::from_secs(5));

        assert!(!config.voice.speak_responses);
        assert!(!config.voice.reset_transcript_on_capture);
        assert_eq!(config.gateway_timeout_ms, Some(5000));
    }

    #[test]
    fn test_sub_second_timeout_is_kept() {
        let config = AppConfig::default().with_gateway_timeout(Duration::from_millis(50));
        assert_eq!(config.gateway_timeout_ms, Some(50));
        assert_eq!(config.gateway_timeout(), Some(Duration::from_millis(50)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.gateway.base_url = "ftp://example".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.gateway_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codeai.toml");
        std::fs::write(&path, "[tools]\ndefault_language = \"Rust\"\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.tools.default_language, "Rust");

        let missing = AppConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(CodeAiError::IOError(_))));
    }
}
