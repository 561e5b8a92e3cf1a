//! Error taxonomy for rank tracking
//!
//! Transport and extraction failures are recovered inside a session
//! (route rotation, reload). Blocks and exhaustion are reported through the
//! outcome. Configuration errors fail before any network call is made.

use thiserror::Error;

use crate::fetch::FetchError;

/// Result type alias for rank tracking operations
pub type RankResult<T> = Result<T, RankError>;

#[derive(Debug, Error)]
pub enum RankError {
    /// Connect failure, timeout, or an error status from the search host
    #[error("Transport failure: {0}")]
    Transport(#[from] FetchError),

    /// The search host served an anti-bot challenge
    #[error("Blocked by anti-bot challenge at {url}")]
    Blocked { url: String },

    /// Every extraction strategy came back empty
    #[error("No listings could be extracted from the page")]
    ExtractionEmpty,

    /// Invalid settings, detected before any request is issued
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Daily request budget spent with no identity left to rotate to
    #[error("Request quota exhausted ({used}/{limit})")]
    QuotaExhausted { used: u32, limit: u32 },

    /// A result sink could not persist an outcome
    #[error("Sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RankError {
    pub fn config(message: impl Into<String>) -> Self {
        RankError::Configuration(message.into())
    }

    /// Whether retrying on another route may succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            RankError::Transport(e) => e.is_transient(),
            RankError::ExtractionEmpty => true,
            _ => false,
        }
    }
}
