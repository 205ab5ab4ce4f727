//! Gateway configuration for the Gemini transport

use serde::Deserialize;

/// Default model, matching the hosted provider the assistant was built on.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Default REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Configuration for the model gateway
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Endpoint root, without a trailing `/models/...`
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Explicit API key; takes precedence over the environment
    pub api_key: Option<String>,

    /// Extra environment variable to read the key from, checked before
    /// [`API_KEY_ENV_VARS`]
    pub api_key_env: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            api_key_env: None,
        }
    }
}

impl GatewayConfig {
    /// Create a configuration for the given model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the endpoint root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model id
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set an explicit API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Resolve the API key: explicit key first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }
        self.api_key_env
            .as_deref()
            .into_iter()
            .chain(API_KEY_ENV_VARS)
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
    }

    /// Full `generateContent` URL for the configured model
    pub fn generate_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}/models/{}:generateContent", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_generate_url_trims_trailing_slash() {
        let config = GatewayConfig::new("gemini-test").with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(
            config.generate_url(),
            "http://localhost:9000/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_custom_key_env() {
        let mut config = GatewayConfig::default();
        config.api_key_env = Some("CODEAI_TEST_KEY_ENV_VAR".to_string());
        std::env::set_var("CODEAI_TEST_KEY_ENV_VAR", "from-env");
        assert_eq!(config.resolve_api_key().as_deref(), Some("from-env"));
        std::env::remove_var("CODEAI_TEST_KEY_ENV_VAR");
    }

    #[test]
    fn test_explicit_key_wins() {
        let config = GatewayConfig::default().with_api_key("explicit");
        assert_eq!(config.resolve_api_key().as_deref(), Some("explicit"));
    }
}
