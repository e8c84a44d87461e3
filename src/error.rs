//! Error types for the dashboard follower.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DashError>;

/// Errors raised by the series store, the push-channel subscriber and the
/// surrounding plumbing.
#[derive(Debug, Error)]
pub enum DashError {
    /// `initialize` was called on a store that already holds series.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A push payload was not well-formed. Contained at the subscriber
    /// boundary; never reaches the store.
    #[error("could not decode push payload: {0}")]
    Decode(String),

    /// A well-formed payload arrived without its routing field.
    #[error("received event without target")]
    MissingTarget,

    /// An operation was invoked out of its required order.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// The initial epochs document could not be read into records.
    #[error("invalid bootstrap epochs: {0}")]
    Bootstrap(String),

    /// Invalid or unreadable configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DashError {
    /// True for errors that are dropped (and logged) rather than raised.
    pub fn is_contained(&self) -> bool {
        matches!(self, DashError::Decode(_))
    }
}
