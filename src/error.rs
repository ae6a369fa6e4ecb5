//! Error types for the news reader

/// Error type for playback, configuration and audio device operations
#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    /// A required runtime capability (speech or ambient engine) is missing
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Utterance-level failure reported by the speech engine
    #[error("Speech engine error: {0}")]
    EngineError(String),

    /// Request that cannot be honoured in the current state
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error from filesystem or subprocess
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a configuration or article file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ReaderError {
    /// Short, user-facing text for notifications.
    pub fn user_message(&self) -> String {
        match self {
            ReaderError::CapabilityUnavailable(_) => {
                "Text-to-speech is not supported on this system".to_string()
            }
            ReaderError::EngineError(_) => "Error playing audio. Please try again.".to_string(),
            ReaderError::InvalidRequest(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

impl From<String> for ReaderError {
    fn from(s: String) -> Self {
        ReaderError::Other(s)
    }
}

impl From<&str> for ReaderError {
    fn from(s: &str) -> Self {
        ReaderError::Other(s.to_string())
    }
}

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, ReaderError>;
