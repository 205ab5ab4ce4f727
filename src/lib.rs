pub mod integration;
pub mod llm;
pub mod messages;
pub mod speech;
pub mod state;
pub mod tools;
pub mod voice;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeAiError {
    #[error("Speech capture is not supported on this device")]
    CaptureUnsupported,

    #[error("Capture device error: {0}")]
    CaptureDeviceError(String),

    #[error("Speech output is not available")]
    SpeechUnavailable,

    #[error("Speech output error: {0}")]
    SpeechError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for CodeAiError {
    fn from(e: std::io::Error) -> Self {
        CodeAiError::IOError(e.to_string())
    }
}

impl From<toml::de::Error> for CodeAiError {
    fn from(e: toml::de::Error) -> Self {
        CodeAiError::ConfigError(e.to_string())
    }
}

impl CodeAiError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The device will not appear without user intervention
            CodeAiError::CaptureUnsupported => false,
            CodeAiError::CaptureDeviceError(_) => true,
            CodeAiError::SpeechUnavailable => false,
            CodeAiError::SpeechError(_) => true,
            CodeAiError::ConfigError(_) => false,
            CodeAiError::ChannelError(_) => false,
            CodeAiError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            CodeAiError::CaptureUnsupported => {
                "Sorry, your device doesn't support speech recognition.".to_string()
            }
            CodeAiError::CaptureDeviceError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            CodeAiError::SpeechUnavailable => {
                "Speech output is unavailable. Responses will be shown as text.".to_string()
            }
            CodeAiError::SpeechError(_) => {
                "Text-to-speech failed. Response will be shown as text.".to_string()
            }
            CodeAiError::ConfigError(_) => {
                "Configuration error. Please check settings.".to_string()
            }
            CodeAiError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            CodeAiError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodeAiError>;
