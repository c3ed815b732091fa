//! Error types for the filesift library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`FilesiftError`] enum. Most variants carry a message; the constructor
//! helpers keep call sites short.
//!
//! # Examples
//!
//! ```
//! use filesift::error::{FilesiftError, Result};
//!
//! fn parse_term(term: &str) -> Result<&str> {
//!     if term.trim().is_empty() {
//!         return Err(FilesiftError::invalid_query("search term is empty"));
//!     }
//!     Ok(term)
//! }
//!
//! assert!(parse_term("  ").is_err());
//! ```

use std::io;

use thiserror::Error;

use crate::source::ChannelId;

/// The main error type for filesift operations.
#[derive(Error, Debug)]
pub enum FilesiftError {
    /// I/O errors (snapshot files, fixtures, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The query cannot be executed as given. No scan is attempted.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A single channel could not be scanned.
    #[error("Channel {channel} unavailable: {reason}")]
    ChannelUnavailable { channel: ChannelId, reason: String },

    /// The external message source failed.
    #[error("Message source error: {0}")]
    Source(String),

    /// A channel, message or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The acting principal is not allowed to perform the operation.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Snapshot build or persistence errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Configuration values are out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The search client has no bound identity yet
    #[error("Search client not initialized: {0}")]
    NotInitialized(String),

    /// Operation cancelled
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with FilesiftError.
pub type Result<T> = std::result::Result<T, FilesiftError>;

impl FilesiftError {
    /// Create a new invalid query error.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        FilesiftError::InvalidQuery(msg.into())
    }

    /// Create a new channel unavailable error.
    pub fn channel_unavailable<S: Into<String>>(channel: ChannelId, reason: S) -> Self {
        FilesiftError::ChannelUnavailable {
            channel,
            reason: reason.into(),
        }
    }

    /// Create a new message source error.
    pub fn source<S: Into<String>>(msg: S) -> Self {
        FilesiftError::Source(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        FilesiftError::NotFound(msg.into())
    }

    /// Create a new permission error.
    pub fn permission<S: Into<String>>(msg: S) -> Self {
        FilesiftError::Permission(msg.into())
    }

    /// Create a new snapshot error.
    pub fn snapshot<S: Into<String>>(msg: S) -> Self {
        FilesiftError::Snapshot(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        FilesiftError::InvalidConfig(msg.into())
    }

    /// Create a new not initialized error.
    pub fn not_initialized<S: Into<String>>(msg: S) -> Self {
        FilesiftError::NotInitialized(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        FilesiftError::OperationCancelled(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FilesiftError::Other(msg.into())
    }

    /// Whether this error only concerns one channel and may be recovered by
    /// omitting that channel from the outcome.
    ///
    /// Errors that make the whole call meaningless (a bad query or config, a
    /// missing identity, cancellation) are not.
    pub fn is_channel_local(&self) -> bool {
        !matches!(
            self,
            FilesiftError::InvalidQuery(_)
                | FilesiftError::InvalidConfig(_)
                | FilesiftError::NotInitialized(_)
                | FilesiftError::OperationCancelled(_)
        )
    }

    /// Attribute a channel-local error to `channel` as `ChannelUnavailable`.
    /// Other errors pass through unchanged.
    pub fn in_channel(self, channel: ChannelId) -> Self {
        match self {
            FilesiftError::ChannelUnavailable { .. } => self,
            error if error.is_channel_local() => {
                FilesiftError::channel_unavailable(channel, error.to_string())
            }
            error => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = FilesiftError::invalid_query("empty term");
        assert_eq!(error.to_string(), "Invalid query: empty term");

        let error = FilesiftError::channel_unavailable(ChannelId(7), "missing access");
        assert_eq!(error.to_string(), "Channel 7 unavailable: missing access");

        let error = FilesiftError::source("rate limited");
        assert_eq!(error.to_string(), "Message source error: rate limited");
    }

    #[test]
    fn test_channel_local_classification() {
        assert!(FilesiftError::source("boom").is_channel_local());
        assert!(FilesiftError::permission("no history").is_channel_local());
        assert!(FilesiftError::from(io::Error::other("reset")).is_channel_local());
        assert!(!FilesiftError::invalid_query("empty").is_channel_local());
        assert!(!FilesiftError::not_initialized("no identity").is_channel_local());
        assert!(!FilesiftError::cancelled("shutdown").is_channel_local());
    }

    #[test]
    fn test_in_channel_wraps_local_errors() {
        let wrapped = FilesiftError::source("rate limited").in_channel(ChannelId(3));
        match wrapped {
            FilesiftError::ChannelUnavailable { channel, reason } => {
                assert_eq!(channel, ChannelId(3));
                assert_eq!(reason, "Message source error: rate limited");
            }
            other => panic!("expected ChannelUnavailable, got {other:?}"),
        }

        let kept = FilesiftError::invalid_config("zero page size").in_channel(ChannelId(3));
        assert!(matches!(kept, FilesiftError::InvalidConfig(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = FilesiftError::from(io_error);

        match error {
            FilesiftError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
