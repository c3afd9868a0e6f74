//! Error types for spk.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpkError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Markup errors
    #[error("No content to synthesize")]
    NoContent,

    // Synthesis errors
    #[error("Synthesis failed on \"{segment}\": {message}")]
    SynthesisFailed { segment: String, message: String },

    #[error("External tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("{tool} failed: {message}")]
    ToolFailed { tool: String, message: String },

    // Container errors
    #[error("Malformed WAV container: {reason}")]
    MalformedContainer { reason: String },

    // Export errors
    #[error("No supported audio codec found")]
    NoSupportedCodec,

    #[error("Encoding failed: {message}")]
    EncodeFailed { message: String },

    #[error("Failed to decode image: {message}")]
    ImageDecode { message: String },

    #[error("Silence of {duration_ms}ms does not fit in memory")]
    SilenceTooLong { duration_ms: u64 },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpkError>;

impl SpkError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        SpkError::MalformedContainer {
            reason: reason.into(),
        }
    }

    pub(crate) fn encode(message: impl Into<String>) -> Self {
        SpkError::EncodeFailed {
            message: message.into(),
        }
    }

    /// Classify a failure to launch an external tool.
    pub(crate) fn spawn(tool: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            SpkError::ToolNotFound {
                tool: tool.to_string(),
            }
        } else {
            SpkError::ToolFailed {
                tool: tool.to_string(),
                message: format!("could not start: {}", err),
            }
        }
    }
}
