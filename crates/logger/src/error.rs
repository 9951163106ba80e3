//! Error types for the logger.
//!
//! [`LoggerError`] covers every failure class the logger distinguishes.
//! Operational errors from the configuration gate (`Disposed`, `GateTimeout`,
//! `Cancelled`) and malformed call arguments (`Validation`, `OutOfRange`) are
//! returned as `Err`. Everything else travels inside a failure
//! [`Response`](crate::Response) as its cause.

use std::time::Duration;

use azlogger_storage::{ConfigError, KeyError, StoreError};
use thiserror::Error;

use crate::response::MessageKey;

/// Result type alias for logger operations.
pub type Result<T> = std::result::Result<T, LoggerError>;

/// Errors produced by the logger.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LoggerError {
    /// A required argument is missing or malformed.
    #[error("Invalid {key}: {message}")]
    Validation {
        /// Which argument was rejected.
        key: MessageKey,
        /// Why it was rejected.
        message: String,
    },

    /// The write filter denied the raw log.
    #[error("Writing not allowed by the log filter")]
    WritingNotAllowed,

    /// The read filter denied the fetched log.
    #[error("Reading not allowed by the log filter")]
    ReadingNotAllowed,

    /// Encoding or decoding the entity failed.
    #[error("Serialization error: {0}")]
    Serialization(StoreError),

    /// The stored content decoded to nothing.
    #[error("Stored content for '{name}' decoded to an empty entity")]
    EmptyPayload {
        /// Blob the content came from.
        name: String,
    },

    /// Error reported by a store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Every permitted attempt failed without a terminal response.
    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// A failure response carried no cause; `key` is its last diagnostic.
    #[error("{key} failed: {message}")]
    OperationFailed {
        /// Key of the diagnostic describing the failure.
        key: MessageKey,
        /// The diagnostic's message.
        message: String,
    },

    /// The logger was disposed before or while the call waited.
    #[error("Logger has already been disposed")]
    Disposed,

    /// The configuration gate could not be acquired in time.
    #[error("Timed out after {0:?} waiting for the logger gate")]
    GateTimeout(Duration),

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// A collection argument was empty.
    #[error("{0} must not be empty")]
    OutOfRange(&'static str),

    /// A store operation category the sequence interpreter does not know.
    #[error("Unsupported store operation category '{0}'")]
    UnsupportedCategory(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The runtime behind the blocking API could not be started.
    #[error("Failed to start the blocking runtime: {message}")]
    Runtime {
        /// Why the runtime failed to start.
        message: String,
    },
}

impl LoggerError {
    /// Creates a new `Validation` error.
    #[must_use]
    pub fn validation(key: MessageKey, message: impl Into<String>) -> Self {
        Self::Validation { key, message: message.into() }
    }

    /// Returns the store error behind this failure, if any.
    #[must_use]
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) | Self::Serialization(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` if the service rejected the request and the rejection is retriable.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_transient())
    }
}

impl From<KeyError> for MessageKey {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::MissingPartitionKey => Self::PartitionKey,
            KeyError::MissingRowKey => Self::RowKey,
        }
    }
}

impl From<KeyError> for LoggerError {
    fn from(err: KeyError) -> Self {
        Self::validation(err.into(), err.to_string())
    }
}
