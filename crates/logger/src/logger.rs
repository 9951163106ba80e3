//! The logger facade.
//!
//! [`AzLogger`] owns both retry engines, the generation delegates, the log
//! filter and the retry settings, all inside one `tokio::sync::Mutex`. Every
//! read, write and configuration accessor goes through the same gate, so a
//! call always sees one consistent configuration.
//!
//! # Errors versus responses
//!
//! Calls return `Err` only for operational problems and bad arguments:
//! [`LoggerError::Disposed`], [`LoggerError::GateTimeout`],
//! [`LoggerError::Cancelled`] and [`LoggerError::Validation`]. Everything
//! that happens after the gate is acquired (filter denials, store failures,
//! exhausted budgets) is reported as a [`Response`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use azlogger::{AzLogger, RawLog, ReadOptions, SeverityLevel, WriteOptions};
//! use azlogger_storage::{MemoryBlobStore, MemoryTableStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = AzLogger::builder()
//!     .table_store(Arc::new(MemoryTableStore::new()))
//!     .blob_store(Arc::new(MemoryBlobStore::new()))
//!     .build()?;
//!
//! let log = RawLog::builder().source("billing").severity_level(SeverityLevel::Error).build();
//! let written = logger.add_to_table(&log, WriteOptions::default()).await?.into_result()?;
//!
//! let read = logger
//!     .get_from_table(
//!         &written.table_name,
//!         &written.partition_key,
//!         &written.row_key,
//!         ReadOptions::default(),
//!     )
//!     .await?
//!     .into_result()?;
//! assert_eq!(read.source(), "billing");
//! # Ok(())
//! # }
//! ```

use std::{
    fmt,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use azlogger_storage::{BlobStore, EntityCodec, JsonCodec, LogEntity, RetryOptions, TableStore};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::{
    blob_service::BlobService,
    clock::{Clock, SystemClock},
    config::{BackoffConfig, LoggerConfig, validate_attempts},
    error::{LoggerError, Result},
    filter::LogFilter,
    metrics::LoggerMetrics,
    model::{BlobReceipt, RawLog, ReadOnlyLog, ReadOnlyRawLog, TableReceipt},
    options::{ReadOptions, WriteOptions, require},
    response::{MessageKey, Response},
    retry::{Backoff, OperationKind},
    strategy::{
        BlobNameDelegate, DelegateContainer, GenerationStrategy, LabelDelegate, NameDelegate,
    },
    table_service::TableService,
};

/// Everything the gate protects.
struct LoggerState {
    table: TableService,
    blob: BlobService,
    strategy: GenerationStrategy,
    filter: LogFilter,
    retry_on_failures: bool,
    max_retry_attempts: Option<u32>,
    backoff: BackoffConfig,
}

impl LoggerState {
    fn attempts(&self, kind: OperationKind, retry: Option<bool>, per_call: Option<u32>) -> u32 {
        kind.resolve_attempts(
            retry.unwrap_or(self.retry_on_failures),
            per_call,
            self.max_retry_attempts,
        )
    }
}

/// Structured log client over a table store and a blob store.
pub struct AzLogger {
    state: Mutex<LoggerState>,
    disposed: AtomicBool,
    gate_timeout: Duration,
    metrics: LoggerMetrics,
}

impl fmt::Debug for AzLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzLogger")
            .field("disposed", &self.is_disposed())
            .field("gate_timeout", &self.gate_timeout)
            .finish_non_exhaustive()
    }
}

/// Generates the getter and setter of one delegate slot.
macro_rules! delegate_slot {
    ($getter:ident, $setter:ident, $field:ident, $ty:ty, $what:literal) => {
        #[doc = concat!("Returns the configured ", $what, " delegate.")]
        ///
        /// # Errors
        ///
        /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
        pub async fn $getter(&self) -> Result<Option<$ty>> {
            Ok(self.gate().await?.strategy.delegates().$field.clone())
        }

        #[doc = concat!("Sets the ", $what, " delegate; `None` restores the default algorithm.")]
        ///
        /// # Errors
        ///
        /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
        pub async fn $setter(&self, delegate: Option<$ty>) -> Result<()> {
            self.gate().await?.strategy.delegates_mut().$field = delegate;
            Ok(())
        }
    };
}

#[bon::bon]
impl AzLogger {
    /// Creates a logger.
    ///
    /// # Arguments
    ///
    /// * `table_store` - Table store the table engine writes to.
    /// * `blob_store` - Blob store the blob engine writes to.
    ///
    /// # Optional Fields
    ///
    /// * `config` - Data configuration (default: [`LoggerConfig::default`]).
    /// * `delegates` - Generation delegates (default: none, every default algorithm).
    /// * `filter` - Read and write predicates (default: allow everything).
    /// * `clock` - Time source for default names (default: [`SystemClock`]).
    /// * `codec` - Blob entity codec (default: [`JsonCodec`]).
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Config`] if `config` fails validation.
    #[builder]
    pub fn new(
        table_store: Arc<dyn TableStore>,
        blob_store: Arc<dyn BlobStore>,
        #[builder(default)] config: LoggerConfig,
        #[builder(default)] delegates: DelegateContainer,
        #[builder(default)] filter: LogFilter,
        clock: Option<Arc<dyn Clock>>,
        codec: Option<Arc<dyn EntityCodec>>,
    ) -> Result<Self> {
        config.validate()?;

        let clock: Arc<dyn Clock> = match clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let codec: Arc<dyn EntityCodec> = match codec {
            Some(codec) => codec,
            None => Arc::new(JsonCodec),
        };
        let metrics = LoggerMetrics::new();
        let backoff = Backoff::new(config.backoff);

        let mut table = TableService::new(table_store, backoff, metrics.clone());
        table.set_retry_options(config.table_retry_options.as_ref());
        let mut blob = BlobService::with_codec(blob_store, codec, backoff, metrics.clone());
        blob.set_retry_options(config.blob_retry_options.as_ref());

        let state = LoggerState {
            table,
            blob,
            strategy: GenerationStrategy::new(delegates, clock),
            filter,
            retry_on_failures: config.retry_on_failures,
            max_retry_attempts: config.max_retry_attempts,
            backoff: config.backoff,
        };

        Ok(Self {
            state: Mutex::new(state),
            disposed: AtomicBool::new(false),
            gate_timeout: config.gate_timeout,
            metrics,
        })
    }
}

impl AzLogger {
    // ── Gate ────────────────────────────────────────────────────────────

    fn ensure_not_disposed(&self) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(LoggerError::Disposed);
        }
        Ok(())
    }

    /// Acquires the gate, honoring disposal, the gate timeout and `cancel`.
    async fn lock(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, LoggerState>> {
        self.ensure_not_disposed()?;
        let guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LoggerError::Cancelled),
            acquired = tokio::time::timeout(self.gate_timeout, self.state.lock()) => {
                acquired.map_err(|_| {
                    tracing::warn!(
                        timeout = ?self.gate_timeout,
                        "timed out waiting for the logger gate"
                    );
                    LoggerError::GateTimeout(self.gate_timeout)
                })?
            },
        };
        // Disposal may have happened while this call was queued.
        self.ensure_not_disposed()?;
        Ok(guard)
    }

    async fn gate(&self) -> Result<MutexGuard<'_, LoggerState>> {
        self.lock(&CancellationToken::new()).await
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Writes `raw_log` to the table store.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the logger is disposed, the gate times out, or an
    /// argument is invalid. Every other outcome is a [`Response`].
    pub async fn add_to_table(
        &self,
        raw_log: &RawLog,
        options: WriteOptions,
    ) -> Result<Response<TableReceipt>> {
        self.add_to_table_with_cancel(raw_log, options, &CancellationToken::new()).await
    }

    /// [`add_to_table`](Self::add_to_table) with a cancellation signal.
    ///
    /// # Errors
    ///
    /// As [`add_to_table`](Self::add_to_table), plus [`LoggerError::Cancelled`].
    #[tracing::instrument(
        skip_all,
        fields(source = %raw_log.source, severity = %raw_log.severity_level)
    )]
    pub async fn add_to_table_with_cancel(
        &self,
        raw_log: &RawLog,
        options: WriteOptions,
        cancel: &CancellationToken,
    ) -> Result<Response<TableReceipt>> {
        self.ensure_not_disposed()?;
        require(MessageKey::Source, &raw_log.source)?;
        options.validate()?;

        let mut guard = self.lock(cancel).await?;
        let state = &mut *guard;

        let log = ReadOnlyRawLog::from(raw_log);
        if let Some(denied) = self.deny_write(&state.filter, &log) {
            return Ok(denied);
        }
        let overrides = options.overrides();
        let entity = match generate_entity(state, &log, &options) {
            Ok(entity) => entity,
            Err(response) => return Ok(response),
        };
        let table_name = state.strategy.table_name(&log, overrides);
        if table_name.is_empty() {
            return Ok(empty_name(MessageKey::TableName));
        }

        let attempts = state.attempts(
            OperationKind::TableAdd,
            options.retry_on_failures,
            options.max_retry_attempts,
        );
        let create = options.create_if_not_exists.unwrap_or(true);
        let response =
            until_cancelled(cancel, state.table.add(&entity, &table_name, create, attempts)).await?;

        Ok(response.map(|()| TableReceipt {
            table_name,
            partition_key: entity.partition_key,
            row_key: entity.row_key,
        }))
    }

    /// Encodes `raw_log` and uploads it to the blob store.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the logger is disposed, the gate times out, or an
    /// argument is invalid. Every other outcome is a [`Response`].
    pub async fn add_to_blob(
        &self,
        raw_log: &RawLog,
        options: WriteOptions,
    ) -> Result<Response<BlobReceipt>> {
        self.add_to_blob_with_cancel(raw_log, options, &CancellationToken::new()).await
    }

    /// [`add_to_blob`](Self::add_to_blob) with a cancellation signal.
    ///
    /// # Errors
    ///
    /// As [`add_to_blob`](Self::add_to_blob), plus [`LoggerError::Cancelled`].
    #[tracing::instrument(
        skip_all,
        fields(source = %raw_log.source, severity = %raw_log.severity_level)
    )]
    pub async fn add_to_blob_with_cancel(
        &self,
        raw_log: &RawLog,
        options: WriteOptions,
        cancel: &CancellationToken,
    ) -> Result<Response<BlobReceipt>> {
        self.ensure_not_disposed()?;
        require(MessageKey::Source, &raw_log.source)?;
        options.validate()?;

        let mut guard = self.lock(cancel).await?;
        let state = &mut *guard;

        let log = ReadOnlyRawLog::from(raw_log);
        if let Some(denied) = self.deny_write(&state.filter, &log) {
            return Ok(denied);
        }
        let overrides = options.overrides();
        let entity = match generate_entity(state, &log, &options) {
            Ok(entity) => entity,
            Err(response) => return Ok(response),
        };
        let container_name = state.strategy.blob_container_name(&log, overrides);
        if container_name.is_empty() {
            return Ok(empty_name(MessageKey::BlobContainerName));
        }
        let blob_name = state.strategy.blob_name(&log, &entity, overrides);
        if blob_name.is_empty() {
            return Ok(empty_name(MessageKey::BlobName));
        }

        let attempts = state.attempts(
            OperationKind::BlobAdd,
            options.retry_on_failures,
            options.max_retry_attempts,
        );
        let create = options.create_if_not_exists.unwrap_or(true);
        let response = until_cancelled(
            cancel,
            state.blob.add(&entity, &container_name, &blob_name, create, attempts),
        )
        .await?;

        Ok(response.map(|content| BlobReceipt { container_name, blob_name, content }))
    }

    fn deny_write<T>(&self, filter: &LogFilter, log: &ReadOnlyRawLog) -> Option<Response<T>> {
        if filter.is_writing_allowed(log) {
            return None;
        }
        self.metrics.record_write_denied();
        tracing::debug!(source = log.source(), "write denied by the log filter");
        Some(Response::failure(MessageKey::WritingNotAllowed, LoggerError::WritingNotAllowed))
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Reads the entity at (`partition_key`, `row_key`) from `table_name`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the logger is disposed, the gate times out, or an
    /// argument is empty. Every other outcome is a [`Response`].
    pub async fn get_from_table(
        &self,
        table_name: &str,
        partition_key: &str,
        row_key: &str,
        options: ReadOptions,
    ) -> Result<Response<ReadOnlyLog>> {
        self.get_from_table_with_cancel(
            table_name,
            partition_key,
            row_key,
            options,
            &CancellationToken::new(),
        )
        .await
    }

    /// [`get_from_table`](Self::get_from_table) with a cancellation signal.
    ///
    /// # Errors
    ///
    /// As [`get_from_table`](Self::get_from_table), plus [`LoggerError::Cancelled`].
    #[tracing::instrument(skip(self, options, cancel))]
    pub async fn get_from_table_with_cancel(
        &self,
        table_name: &str,
        partition_key: &str,
        row_key: &str,
        options: ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Response<ReadOnlyLog>> {
        self.ensure_not_disposed()?;
        require(MessageKey::TableName, table_name)?;
        require(MessageKey::PartitionKey, partition_key)?;
        require(MessageKey::RowKey, row_key)?;
        options.validate()?;

        let mut guard = self.lock(cancel).await?;
        let state = &mut *guard;

        let attempts = state.attempts(
            OperationKind::TableGet,
            options.retry_on_failures,
            options.max_retry_attempts,
        );
        let create = options.create_if_not_exists.unwrap_or(false);
        let response = until_cancelled(
            cancel,
            state.table.get(table_name, partition_key, row_key, create, attempts),
        )
        .await?;

        Ok(self.filter_read(&state.filter, response))
    }

    /// Downloads and decodes `blob_name` from `container_name`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the logger is disposed, the gate times out, or an
    /// argument is empty. Every other outcome is a [`Response`].
    pub async fn get_from_blob(
        &self,
        container_name: &str,
        blob_name: &str,
        options: ReadOptions,
    ) -> Result<Response<ReadOnlyLog>> {
        let cancel = CancellationToken::new();
        self.get_from_blob_with_cancel(container_name, blob_name, options, &cancel).await
    }

    /// [`get_from_blob`](Self::get_from_blob) with a cancellation signal.
    ///
    /// # Errors
    ///
    /// As [`get_from_blob`](Self::get_from_blob), plus [`LoggerError::Cancelled`].
    #[tracing::instrument(skip(self, options, cancel))]
    pub async fn get_from_blob_with_cancel(
        &self,
        container_name: &str,
        blob_name: &str,
        options: ReadOptions,
        cancel: &CancellationToken,
    ) -> Result<Response<ReadOnlyLog>> {
        self.ensure_not_disposed()?;
        require(MessageKey::BlobContainerName, container_name)?;
        require(MessageKey::BlobName, blob_name)?;
        options.validate()?;

        let mut guard = self.lock(cancel).await?;
        let state = &mut *guard;

        let attempts = state.attempts(
            OperationKind::BlobGet,
            options.retry_on_failures,
            options.max_retry_attempts,
        );
        let create = options.create_if_not_exists.unwrap_or(false);
        let response =
            until_cancelled(cancel, state.blob.get(container_name, blob_name, create, attempts))
                .await?;

        Ok(self.filter_read(&state.filter, response))
    }

    fn filter_read(
        &self,
        filter: &LogFilter,
        response: Response<LogEntity>,
    ) -> Response<ReadOnlyLog> {
        let response = response.map(ReadOnlyLog::from);
        let allowed = response.value().is_none_or(|log| filter.is_reading_allowed(log));
        if allowed {
            return response;
        }
        self.metrics.record_read_denied();
        tracing::debug!("read denied by the log filter");
        Response::failure(MessageKey::ReadingNotAllowed, LoggerError::ReadingNotAllowed)
    }

    // ── Configuration ───────────────────────────────────────────────────

    /// Returns a copy of the data configuration currently in effect.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn config(&self) -> Result<LoggerConfig> {
        let state = self.gate().await?;
        Ok(LoggerConfig {
            table_retry_options: state.table.retry_options().cloned(),
            blob_retry_options: state.blob.retry_options().cloned(),
            retry_on_failures: state.retry_on_failures,
            max_retry_attempts: state.max_retry_attempts,
            gate_timeout: self.gate_timeout,
            backoff: state.backoff,
        })
    }

    /// Retry options forwarded to the table store client.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn table_retry_options(&self) -> Result<Option<RetryOptions>> {
        Ok(self.gate().await?.table.retry_options().cloned())
    }

    /// Replaces the table store client retry options; a change reloads the table client.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn set_table_retry_options(&self, options: Option<RetryOptions>) -> Result<()> {
        self.gate().await?.table.set_retry_options(options.as_ref());
        Ok(())
    }

    /// Retry options forwarded to the blob store client.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn blob_retry_options(&self) -> Result<Option<RetryOptions>> {
        Ok(self.gate().await?.blob.retry_options().cloned())
    }

    /// Replaces the blob store client retry options; a change reloads the blob clients.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn set_blob_retry_options(&self, options: Option<RetryOptions>) -> Result<()> {
        self.gate().await?.blob.set_retry_options(options.as_ref());
        Ok(())
    }

    /// Global attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn max_retry_attempts(&self) -> Result<Option<u32>> {
        Ok(self.gate().await?.max_retry_attempts)
    }

    /// Sets the global attempt budget; `None` restores the per-operation defaults.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Config`] for a budget of zero, or a gate error.
    pub async fn set_max_retry_attempts(&self, attempts: Option<u32>) -> Result<()> {
        if let Some(attempts) = attempts {
            validate_attempts("max_retry_attempts", attempts)?;
        }
        self.gate().await?.max_retry_attempts = attempts;
        Ok(())
    }

    /// Whether failed operations are retried.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn retry_on_failures(&self) -> Result<bool> {
        Ok(self.gate().await?.retry_on_failures)
    }

    /// Enables or disables retries.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn set_retry_on_failures(&self, retry: bool) -> Result<()> {
        self.gate().await?.retry_on_failures = retry;
        Ok(())
    }

    /// Replaces the backoff schedule of both engines.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Config`] for an invalid schedule, or a gate error.
    pub async fn set_backoff(&self, backoff: BackoffConfig) -> Result<()> {
        backoff.validate()?;
        let mut state = self.gate().await?;
        state.table.set_backoff(Backoff::new(backoff));
        state.blob.set_backoff(Backoff::new(backoff));
        state.backoff = backoff;
        Ok(())
    }

    /// Returns a copy of every configured delegate.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn delegates(&self) -> Result<DelegateContainer> {
        Ok(self.gate().await?.strategy.delegates().clone())
    }

    /// Replaces every delegate slot with the slots of `delegates`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn update_delegates(&self, delegates: DelegateContainer) -> Result<()> {
        *self.gate().await?.strategy.delegates_mut() = delegates;
        Ok(())
    }

    delegate_slot!(
        partition_key_delegate,
        set_partition_key_delegate,
        partition_key,
        NameDelegate,
        "partition key"
    );
    delegate_slot!(row_key_delegate, set_row_key_delegate, row_key, NameDelegate, "row key");
    delegate_slot!(
        verbose_labels_delegate,
        set_verbose_labels_delegate,
        verbose_labels,
        LabelDelegate,
        "verbose label"
    );
    delegate_slot!(
        table_name_delegate,
        set_table_name_delegate,
        table_name,
        NameDelegate,
        "table name"
    );
    delegate_slot!(
        blob_container_name_delegate,
        set_blob_container_name_delegate,
        blob_container_name,
        NameDelegate,
        "blob container name"
    );
    delegate_slot!(
        blob_name_delegate,
        set_blob_name_delegate,
        blob_name,
        BlobNameDelegate,
        "blob name"
    );

    /// Returns a copy of the log filter.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn log_filter(&self) -> Result<LogFilter> {
        Ok(self.gate().await?.filter.clone())
    }

    /// Replaces the log filter.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Disposed`] or [`LoggerError::GateTimeout`].
    pub async fn set_log_filter(&self, filter: LogFilter) -> Result<()> {
        self.gate().await?.filter = filter;
        Ok(())
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Bound on waiting for the gate.
    #[must_use]
    pub fn gate_timeout(&self) -> Duration {
        self.gate_timeout
    }

    /// Counters for this logger. Reading them does not take the gate.
    #[must_use]
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Disposes the logger. Every later call fails with [`LoggerError::Disposed`],
    /// including calls already waiting for the gate. Disposing twice is a no-op.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            tracing::info!("logger disposed");
        }
    }
}

/// Builds the entity for a write, or the failure response for empty generated keys.
fn generate_entity<T>(
    state: &LoggerState,
    log: &ReadOnlyRawLog,
    options: &WriteOptions,
) -> std::result::Result<LogEntity, Response<T>> {
    let entity = state.strategy.entity(log, options.overrides());
    match entity.validate_keys() {
        Ok(()) => Ok(entity),
        Err(err) => Err(Response::failure(err.into(), err.into())),
    }
}

fn empty_name<T>(key: MessageKey) -> Response<T> {
    Response::failure(key, LoggerError::validation(key, "generated name is empty"))
}

/// Runs `work` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = T>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(LoggerError::Cancelled),
        value = work => Ok(value),
    }
}
