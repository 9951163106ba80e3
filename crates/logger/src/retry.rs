//! Retry decisions shared by the table and blob engines.
//!
//! Three pure pieces live here:
//!
//! - [`RetryClassifier`] decides, from a response, whether a retry loop must stop now.
//! - [`Backoff`] maps a 1-based retry number to the delay before it.
//! - [`OperationKind::resolve_attempts`] picks the effective attempt budget from the per-call
//!   override, the global setting and the per-kind default.
//!
//! # Classification
//!
//! | Response                                   | load   | add / get |
//! |--------------------------------------------|--------|-----------|
//! | `Success` / `Warning`                      | go on  | stop      |
//! | `Failure`, retriable service rejection     | go on  | go on     |
//! | `Failure`, permanent service rejection     | stop   | stop      |
//! | `Failure`, any other cause                 | stop   | stop      |
//! | `Failure`, no cause                        | go on  | go on     |

use std::time::Duration;

use azlogger_storage::StoreError;

use crate::{
    config::{
        BackoffConfig, DEFAULT_BLOB_ADD_ATTEMPTS, DEFAULT_BLOB_GET_ATTEMPTS,
        DEFAULT_TABLE_ADD_ATTEMPTS, DEFAULT_TABLE_GET_ATTEMPTS,
    },
    error::LoggerError,
    metrics::LoggerMetrics,
    response::{MessageKey, Response, Status},
};

/// Decides whether a retry loop stops after a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryClassifier;

impl RetryClassifier {
    /// Stop after loading a resource?
    ///
    /// A successful load never stops the loop: the operation still has to run.
    #[must_use]
    pub fn should_stop_load<T>(response: &Response<T>) -> bool {
        match response.status() {
            Status::Success | Status::Warning => false,
            Status::Failure => is_terminal_failure(response.error()),
        }
    }

    /// Stop after a write?
    #[must_use]
    pub fn should_stop_add<T>(response: &Response<T>) -> bool {
        Self::should_stop_operation(response)
    }

    /// Stop after a read?
    #[must_use]
    pub fn should_stop_get<T>(response: &Response<T>) -> bool {
        Self::should_stop_operation(response)
    }

    fn should_stop_operation<T>(response: &Response<T>) -> bool {
        match response.status() {
            Status::Success | Status::Warning => true,
            Status::Failure => is_terminal_failure(response.error()),
        }
    }
}

fn is_terminal_failure(cause: Option<&LoggerError>) -> bool {
    match cause {
        None => false,
        Some(LoggerError::Store(StoreError::ServiceRejected { reason, .. })) => {
            !reason.is_retriable()
        },
        Some(_) => true,
    }
}

/// Deterministic exponential backoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Backoff {
    config: BackoffConfig,
}

impl Backoff {
    /// Creates a calculator for `config`.
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self { config }
    }

    /// Delay before retry number `attempt` (1-based; 0 is treated as 1).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.config.initial_backoff().saturating_mul(factor).min(self.config.max_backoff())
    }

    /// The schedule this calculator follows.
    #[must_use]
    pub fn config(&self) -> BackoffConfig {
        self.config
    }
}

/// The four retried operations, each with its own default budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Table write.
    TableAdd,
    /// Table read.
    TableGet,
    /// Blob upload.
    BlobAdd,
    /// Blob download.
    BlobGet,
}

impl OperationKind {
    /// Attempt budget used when nothing overrides it.
    #[must_use]
    pub fn default_attempts(self) -> u32 {
        match self {
            Self::TableAdd => DEFAULT_TABLE_ADD_ATTEMPTS,
            Self::TableGet => DEFAULT_TABLE_GET_ATTEMPTS,
            Self::BlobAdd => DEFAULT_BLOB_ADD_ATTEMPTS,
            Self::BlobGet => DEFAULT_BLOB_GET_ATTEMPTS,
        }
    }

    /// Effective attempt budget.
    ///
    /// Without retries the budget is a single attempt. Otherwise the
    /// per-call override wins over the global setting, which wins over
    /// [`default_attempts`](Self::default_attempts).
    #[must_use]
    pub fn resolve_attempts(
        self,
        retry_on_failures: bool,
        per_call: Option<u32>,
        global: Option<u32>,
    ) -> u32 {
        if !retry_on_failures {
            return 1;
        }
        per_call.or(global).unwrap_or_else(|| self.default_attempts()).max(1)
    }

    /// Short label used in spans and log events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TableAdd => "table_add",
            Self::TableGet => "table_get",
            Self::BlobAdd => "blob_add",
            Self::BlobGet => "blob_get",
        }
    }
}

/// Attempt bookkeeping for one engine call.
///
/// Counts attempts against the budget, computes the backoff before the next
/// one and shapes the final response when the loop ends.
#[derive(Debug)]
pub(crate) struct AttemptBudget {
    kind: OperationKind,
    max_attempts: u32,
    made: u32,
    backoff: Backoff,
    metrics: LoggerMetrics,
}

impl AttemptBudget {
    pub(crate) fn new(
        kind: OperationKind,
        max_attempts: u32,
        backoff: Backoff,
        metrics: LoggerMetrics,
    ) -> Self {
        Self { kind, max_attempts: max_attempts.max(1), made: 0, backoff, metrics }
    }

    pub(crate) fn has_remaining(&self) -> bool {
        self.made < self.max_attempts
    }

    /// Counts an attempt that reached the operation step.
    pub(crate) fn record_operation(&self) {
        match self.kind {
            OperationKind::TableAdd | OperationKind::BlobAdd => self.metrics.record_add_attempt(),
            OperationKind::TableGet | OperationKind::BlobGet => self.metrics.record_get_attempt(),
        }
    }

    /// Closes the current attempt and returns the delay before the next one.
    ///
    /// Returns `None` after the last permitted attempt.
    pub(crate) fn end_attempt(&mut self) -> Option<Duration> {
        self.made += 1;
        if self.made >= self.max_attempts {
            return None;
        }
        let delay = self.backoff.delay_for_attempt(self.made);
        self.metrics.record_retry();
        tracing::debug!(
            operation = self.kind.as_str(),
            attempt = self.made,
            max_attempts = self.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying after backoff",
        );
        Some(delay)
    }

    /// Final response of a loop the classifier stopped.
    pub(crate) fn stopped<T>(&self, response: Response<T>) -> Response<T> {
        if response.is_failure() {
            self.metrics.record_permanent_failure();
            tracing::warn!(
                operation = self.kind.as_str(),
                attempt = self.made + 1,
                error = ?response.error(),
                "non-retriable failure, giving up",
            );
        }
        response
    }

    /// Final response of a loop that ran out of attempts.
    ///
    /// This is the last operation response when the operation was reached,
    /// otherwise the last load failure.
    pub(crate) fn exhausted<T>(
        &self,
        last_operation: Option<Response<T>>,
        last_load: Response<()>,
    ) -> Response<T> {
        self.metrics.record_retry_exhausted();
        tracing::warn!(
            operation = self.kind.as_str(),
            attempts = self.made,
            "retry budget exhausted",
        );
        last_operation.unwrap_or_else(|| last_load.discard_value()).with_diagnostic(
            MessageKey::RetryAttempts,
            LoggerError::RetryExhausted { attempts: self.made }.to_string(),
        )
    }
}
