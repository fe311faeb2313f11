use std::time::Duration;
use thiserror::Error;

/// Failure of a single call to the extraction service.
///
/// Only transport-level conditions are reported here; whether the returned
/// text is usable is decided later by the sanitizer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::RateLimited(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Errors surfaced by [`crate::ExtractionOrchestrator`].
///
/// Runtime failures degrade to smaller or empty results; only caller bugs end up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,
}

pub type Result<T> = std::result::Result<T, ExtractError>;
