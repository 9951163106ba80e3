//! Store error types and result alias.
//!
//! Every [`TableStore`](crate::TableStore) and [`BlobStore`](crate::BlobStore)
//! implementation maps its internal failures to [`StoreError`]. The variants
//! separate requests the remote service explicitly rejected (carrying a
//! machine-readable [`FailureReason`]) from local or unexpected failures.
//!
//! # Error Types
//!
//! - [`StoreError::ServiceRejected`] - The service refused the request with a reason code
//! - [`StoreError::Serialization`] - Entity encoding/decoding failures
//! - [`StoreError::Internal`] - Local or otherwise unexpected failures
//!
//! # Example
//!
//! ```
//! use azlogger_storage::{FailureReason, StoreError, StoreResult};
//!
//! fn lookup(table: &str) -> StoreResult<()> {
//!     Err(StoreError::rejected(FailureReason::ResourceNotFound, format!("table {table} missing")))
//! }
//!
//! assert!(lookup("Logs").is_err());
//! ```

use std::{fmt, sync::Arc};

use thiserror::Error;

/// A shared error type for source chain tracking.
///
/// Shared rather than boxed so that errors (and the responses that carry
/// them) stay `Clone`.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Machine-readable reason attached to a service rejection.
///
/// Mirrors the error codes cloud table and blob services return alongside a
/// rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FailureReason {
    /// The table, container or blob name violates the service naming rules.
    InvalidResourceName,
    /// A resource exists whose name differs from the requested one only by case.
    ResourceNameCaseMismatch,
    /// The request could not be authenticated.
    AuthenticationFailed,
    /// The caller is not authorized for the operation.
    AuthorizationFailure,
    /// The resource or entity already exists.
    ResourceAlreadyExists,
    /// The resource or entity does not exist.
    ResourceNotFound,
    /// The service is temporarily overloaded.
    ServerBusy,
    /// The service did not finish the operation in time.
    OperationTimedOut,
    /// The service hit an internal error.
    InternalError,
    /// Any other service error code.
    Other(String),
}

impl FailureReason {
    /// Returns `true` if a later attempt of the same request may succeed.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ServerBusy | Self::OperationTimedOut | Self::InternalError)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidResourceName => write!(f, "InvalidResourceName"),
            Self::ResourceNameCaseMismatch => write!(f, "ResourceNameCaseMismatch"),
            Self::AuthenticationFailed => write!(f, "AuthenticationFailed"),
            Self::AuthorizationFailure => write!(f, "AuthorizationFailure"),
            Self::ResourceAlreadyExists => write!(f, "ResourceAlreadyExists"),
            Self::ResourceNotFound => write!(f, "ResourceNotFound"),
            Self::ServerBusy => write!(f, "ServerBusy"),
            Self::OperationTimedOut => write!(f, "OperationTimedOut"),
            Self::InternalError => write!(f, "InternalError"),
            Self::Other(code) => write!(f, "{code}"),
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The remote service explicitly rejected the request.
    #[error("Service rejected request ({reason}): {message}")]
    ServiceRejected {
        /// Reason code reported by the service.
        reason: FailureReason,
        /// Human-readable description from the service.
        message: String,
    },

    /// Entity encoding or decoding failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// Local or unexpected failure that is not a service response.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    /// Creates a new `ServiceRejected` error.
    #[must_use]
    pub fn rejected(reason: FailureReason, message: impl Into<String>) -> Self {
        Self::ServiceRejected { reason, message: message.into() }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Returns the service failure reason, if the service rejected the request.
    #[must_use]
    pub fn reason(&self) -> Option<&FailureReason> {
        match self {
            Self::ServiceRejected { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Returns `true` for service rejections that may succeed on a later attempt.
    ///
    /// Local failures are never transient: retrying them repeats the same bug.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.reason().is_some_and(FailureReason::is_retriable)
    }
}

/// Configuration validation errors raised by builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric field is below its allowed minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// Name of the offending field.
        field: &'static str,
        /// Smallest permitted value.
        min: String,
        /// Value that was supplied.
        value: String,
    },

    /// A duration field must be strictly positive.
    #[error("{field} must be positive, got {value}")]
    MustBePositive {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was supplied.
        value: String,
    },

    /// Two fields are inconsistent with each other.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
