use crate::domain::tts::error::AudioError;

/// Main application error type
///
/// Used inside the client only. The public synthesis operations turn every
/// variant into a "no result" outcome after logging it.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    #[error("Upstream rejected request with status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout
        } else {
            AppError::Transport(err)
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

impl AppError {
    /// Short machine-friendly label used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
            Self::Upstream { .. } => "upstream",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Audio(_) => "audio",
            Self::Internal(_) => "internal",
        }
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
