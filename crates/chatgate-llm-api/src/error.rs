use std::time::Duration;

use chatgate_models::Provider;

/// No credential source holds a value for the provider's key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{key} not configured. Set it in the server environment or in the client env file.")]
pub struct MissingCredential {
    pub key: String,
}

/// Failure before any stream byte reached the caller
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Provider is not compiled into this build
    #[error("Unsupported provider")]
    UnsupportedProvider(Provider),
    /// Building the client or opening the upstream connection failed
    #[error("{provider} adapter error: {message}")]
    Open { provider: Provider, message: String },
}

impl AdapterError {
    pub fn open(provider: Provider, message: impl Into<String>) -> Self {
        AdapterError::Open {
            provider,
            message: message.into(),
        }
    }
}

/// Failure while pulling chunks from an already-open stream
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("stream error: {0}")]
    Transport(String),
    #[error("{message}")]
    Upstream {
        message: String,
        code: Option<String>,
    },
    #[error("malformed chunk: {0}")]
    Malformed(String),
    #[error("no data received from provider for {}s", .0.as_secs())]
    Timeout(Duration),
}

impl StreamError {
    /// Short machine-readable code sent with the terminal error event
    pub fn code(&self) -> String {
        match self {
            StreamError::Transport(_) => "stream_error".to_string(),
            StreamError::Upstream { code: Some(code), .. } => code.clone(),
            StreamError::Upstream { code: None, .. } => "upstream_error".to_string(),
            StreamError::Malformed(_) => "malformed_chunk".to_string(),
            StreamError::Timeout(_) => "timeout".to_string(),
        }
    }
}
