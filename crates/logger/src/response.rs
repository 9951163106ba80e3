//! Typed operation results with diagnostics.
//!
//! Every logger operation that reaches the point of doing work returns a
//! [`Response`]: an explicit [`Status`], an optional value, the cause of a
//! failure, and an ordered list of [`Diagnostic`]s keyed by a fixed
//! [`MessageKey`] vocabulary. Callers inspect the keys to tell validation
//! failures, filter denials, serialization failures and exhausted retries
//! apart without parsing messages.

use std::fmt;

use crate::error::LoggerError;

/// Outcome class of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The operation completed.
    Success,
    /// The operation completed with something worth reporting.
    Warning,
    /// The operation failed.
    Failure,
}

/// Fixed vocabulary identifying what a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MessageKey {
    /// The raw log as a whole.
    RawLog,
    /// The raw log source.
    Source,
    /// The partition key.
    PartitionKey,
    /// The row key.
    RowKey,
    /// The table name.
    TableName,
    /// The blob container name.
    BlobContainerName,
    /// The blob name.
    BlobName,
    /// The stored entity.
    Entity,
    /// The write filter denied the log.
    WritingNotAllowed,
    /// The read filter denied the log.
    ReadingNotAllowed,
    /// Entity encoding or decoding.
    Serialization,
    /// The retry budget.
    RetryAttempts,
    /// An unexpected failure.
    Exception,
    /// A store operation sequence.
    StoreOperationSequence,
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RawLog => "RawLog",
            Self::Source => "Source",
            Self::PartitionKey => "PartitionKey",
            Self::RowKey => "RowKey",
            Self::TableName => "TableName",
            Self::BlobContainerName => "BlobContainerName",
            Self::BlobName => "BlobName",
            Self::Entity => "Entity",
            Self::WritingNotAllowed => "WritingNotAllowed",
            Self::ReadingNotAllowed => "ReadingNotAllowed",
            Self::Serialization => "Serialization",
            Self::RetryAttempts => "RetryAttempts",
            Self::Exception => "Exception",
            Self::StoreOperationSequence => "StoreOperationSequence",
        };
        f.write_str(name)
    }
}

/// A single keyed message attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What the message is about.
    pub key: MessageKey,
    /// Human-readable detail.
    pub message: String,
}

/// Result of a logger operation.
#[derive(Debug, Clone)]
#[must_use = "responses carry the operation status and must be inspected"]
pub struct Response<T> {
    status: Status,
    value: Option<T>,
    error: Option<LoggerError>,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Response<T> {
    /// A successful response carrying `value`.
    pub fn success(value: T) -> Self {
        Self { status: Status::Success, value: Some(value), error: None, diagnostics: Vec::new() }
    }

    /// A successful response with a warning diagnostic attached.
    pub fn warning(value: T, key: MessageKey, message: impl Into<String>) -> Self {
        Self {
            status: Status::Warning,
            value: Some(value),
            error: None,
            diagnostics: vec![Diagnostic { key, message: message.into() }],
        }
    }

    /// A failed response caused by `error`, recorded under `key`.
    pub fn failure(key: MessageKey, error: LoggerError) -> Self {
        let message = error.to_string();
        Self {
            status: Status::Failure,
            value: None,
            error: Some(error),
            diagnostics: vec![Diagnostic { key, message }],
        }
    }

    /// A failed response with no underlying error, only a diagnostic.
    pub fn failure_message(key: MessageKey, message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            value: None,
            error: None,
            diagnostics: vec![Diagnostic { key, message: message.into() }],
        }
    }

    /// Appends a diagnostic.
    pub fn with_diagnostic(mut self, key: MessageKey, message: impl Into<String>) -> Self {
        self.diagnostics.push(Diagnostic { key, message: message.into() });
        self
    }

    /// Appends diagnostics collected elsewhere, keeping their order.
    pub fn with_diagnostics(mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns `true` unless the status is [`Status::Failure`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status != Status::Failure
    }

    /// Returns `true` if the status is [`Status::Failure`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == Status::Failure
    }

    /// Returns `true` if a value is present.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Borrows the value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Takes the value, if any.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Returns the underlying cause of a failure.
    #[must_use]
    pub fn error(&self) -> Option<&LoggerError> {
        self.error.as_ref()
    }

    /// Returns every attached diagnostic in the order it was recorded.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns `true` if any diagnostic carries `key`.
    #[must_use]
    pub fn has_message_key(&self, key: MessageKey) -> bool {
        self.diagnostics.iter().any(|d| d.key == key)
    }

    /// Transforms the value, keeping status, cause and diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            value: self.value.map(f),
            error: self.error,
            diagnostics: self.diagnostics,
        }
    }

    /// Re-types a response, dropping its value.
    pub fn discard_value<U>(self) -> Response<U> {
        Response {
            status: self.status,
            value: None,
            error: self.error,
            diagnostics: self.diagnostics,
        }
    }

    /// Converts into a plain `Result`, using the cause (or a generic error) on failure.
    ///
    /// # Errors
    ///
    /// Returns the failure cause when the status is [`Status::Failure`] or the value is absent.
    pub fn into_result(self) -> crate::Result<T> {
        match (self.status, self.value) {
            (Status::Success | Status::Warning, Some(value)) => Ok(value),
            _ => Err(self.error.unwrap_or_else(|| match self.diagnostics.last() {
                Some(diagnostic) => LoggerError::OperationFailed {
                    key: diagnostic.key,
                    message: diagnostic.message.clone(),
                },
                None => LoggerError::OperationFailed {
                    key: MessageKey::Exception,
                    message: "no value".to_owned(),
                },
            })),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response() {
        let response = Response::success(7);
        assert_eq!(response.status(), Status::Success);
        assert!(response.is_success());
        assert!(response.has_value());
        assert!(response.diagnostics().is_empty());
        assert_eq!(response.into_result().unwrap(), 7);
    }

    #[test]
    fn test_failure_records_keyed_diagnostic() {
        let response: Response<()> =
            Response::failure(MessageKey::WritingNotAllowed, LoggerError::WritingNotAllowed);
        assert!(response.is_failure());
        assert!(!response.has_value());
        assert!(response.has_message_key(MessageKey::WritingNotAllowed));
        assert!(matches!(response.error(), Some(LoggerError::WritingNotAllowed)));
    }

    #[test]
    fn test_discard_value_keeps_diagnostics() {
        let response = Response::warning(1, MessageKey::Entity, "odd")
            .with_diagnostic(MessageKey::TableName, "Logs");
        let response: Response<String> = response.discard_value();
        assert_eq!(response.status(), Status::Warning);
        assert!(!response.has_value());
        assert_eq!(response.diagnostics().len(), 2);
    }

    #[test]
    fn test_into_result_without_cause_uses_last_diagnostic() {
        let response: Response<()> = Response::failure_message(MessageKey::RetryAttempts, "spent");
        let err = response.into_result().unwrap_err();
        match err {
            LoggerError::OperationFailed { key, message } => {
                assert_eq!(key, MessageKey::RetryAttempts);
                assert_eq!(message, "spent");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_result_success_without_value_is_not_validation() {
        let response: Response<u8> = Response::success(1).discard_value();
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, LoggerError::OperationFailed { key: MessageKey::Exception, .. }));
        assert!(!matches!(err, LoggerError::Validation { .. }));
    }
}
