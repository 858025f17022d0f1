//! Error types

use thiserror::Error;

/// Failures raised by a document view
#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("element {0} is no longer attached to the document")]
    Detached(u64),

    #[error("DOM exception: {0}")]
    Dom(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("transcript is empty")]
    EmptyTranscript,

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error("failed to serialize transcript: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AssistantError {
    pub fn collaborator(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::Collaborator {
            collaborator,
            message: message.into(),
        }
    }
}
