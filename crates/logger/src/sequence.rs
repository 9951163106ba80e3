//! Store operation sequences.
//!
//! A [`StoreOperationSequence`] is an ordered list of heterogeneous
//! operations, each tagged with a [`SequenceExecutionType`] that decides
//! whether the interpreter moves on after it. The interpreter records every
//! executed operation's outcome in place, so callers can inspect which steps
//! ran and how they ended.
//!
//! Sequences are plain data and can be loaded from JSON:
//!
//! ```
//! use azlogger::{SequenceExecutionType, StoreOperation, StoreOperationSequence};
//!
//! let json = r#"[
//!     {
//!         "execution_type": "NextOnComplete",
//!         "operation": { "category": "AddToTable", "raw_log": { "source": "billing" } }
//!     },
//!     {
//!         "execution_type": "NextNever",
//!         "operation": {
//!             "category": "GetFromBlob",
//!             "container_name": "azlogs-202401",
//!             "blob_name": "Info/7/row.json"
//!         }
//!     }
//! ]"#;
//!
//! let sequence = StoreOperationSequence::from_json(json).unwrap();
//! assert_eq!(sequence.len(), 2);
//! assert_eq!(sequence[0].execution_type, SequenceExecutionType::NextOnComplete);
//! assert!(matches!(sequence[1].operation, StoreOperation::GetFromBlob { .. }));
//! ```

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{LoggerError, Result},
    logger::AzLogger,
    model::{BlobReceipt, RawLog, ReadOnlyLog, TableReceipt},
    options::{ReadOptions, WriteOptions},
    response::{MessageKey, Response},
};

/// Every category tag the interpreter understands.
pub const CATEGORIES: [&str; 4] = ["AddToTable", "AddToBlob", "GetFromTable", "GetFromBlob"];

/// One store operation with its own parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category")]
pub enum StoreOperation {
    /// Write a raw log to the table store.
    AddToTable {
        /// Log to write.
        raw_log: RawLog,
        /// Per-call options.
        #[serde(default)]
        options: WriteOptions,
    },
    /// Write a raw log to the blob store.
    AddToBlob {
        /// Log to write.
        raw_log: RawLog,
        /// Per-call options.
        #[serde(default)]
        options: WriteOptions,
    },
    /// Read one entity from the table store.
    GetFromTable {
        /// Table to read from.
        table_name: String,
        /// Partition key of the entity.
        partition_key: String,
        /// Row key of the entity.
        row_key: String,
        /// Per-call options.
        #[serde(default)]
        options: ReadOptions,
    },
    /// Read one entity from the blob store.
    GetFromBlob {
        /// Container to read from.
        container_name: String,
        /// Blob to read.
        blob_name: String,
        /// Per-call options.
        #[serde(default)]
        options: ReadOptions,
    },
}

impl StoreOperation {
    /// The category tag of this operation.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::AddToTable { .. } => CATEGORIES[0],
            Self::AddToBlob { .. } => CATEGORIES[1],
            Self::GetFromTable { .. } => CATEGORIES[2],
            Self::GetFromBlob { .. } => CATEGORIES[3],
        }
    }
}

/// What the interpreter does after an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceExecutionType {
    /// Always continue.
    #[default]
    NextAlways,
    /// Stop after this operation.
    NextNever,
    /// Continue only if this operation failed.
    NextOnFails,
    /// Continue only if this operation did not fail.
    NextOnComplete,
}

impl SequenceExecutionType {
    /// Returns `true` if the interpreter moves on after `outcome`.
    #[must_use]
    pub fn proceeds_after<T>(self, outcome: &Response<T>) -> bool {
        match self {
            Self::NextAlways => true,
            Self::NextNever => false,
            Self::NextOnFails => outcome.is_failure(),
            Self::NextOnComplete => !outcome.is_failure(),
        }
    }
}

/// Value produced by one operation of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationValue {
    /// Result of [`StoreOperation::AddToTable`].
    TableWrite(TableReceipt),
    /// Result of [`StoreOperation::AddToBlob`].
    BlobWrite(BlobReceipt),
    /// Result of either read.
    Log(ReadOnlyLog),
}

/// An operation, its continuation policy and, once executed, its outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencedOperation {
    /// The operation to run.
    pub operation: StoreOperation,
    /// What happens after it.
    #[serde(default)]
    pub execution_type: SequenceExecutionType,
    /// Filled in by the interpreter; `None` if the operation never ran.
    #[serde(skip)]
    pub outcome: Option<Response<OperationValue>>,
}

impl SequencedOperation {
    /// Creates an operation that has not run yet.
    #[must_use]
    pub fn new(operation: StoreOperation, execution_type: SequenceExecutionType) -> Self {
        Self { operation, execution_type, outcome: None }
    }

    /// Returns `true` once the interpreter has run this operation.
    #[must_use]
    pub fn was_executed(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Ordered list of operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreOperationSequence(Vec<SequencedOperation>);

impl StoreOperationSequence {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an operation.
    pub fn push(&mut self, operation: StoreOperation, execution_type: SequenceExecutionType) {
        self.0.push(SequencedOperation::new(operation, execution_type));
    }

    /// Appends an operation, builder style.
    #[must_use]
    pub fn then(
        mut self,
        operation: StoreOperation,
        execution_type: SequenceExecutionType,
    ) -> Self {
        self.push(operation, execution_type);
        self
    }

    /// Number of operations that have run.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.0.iter().filter(|step| step.was_executed()).count()
    }

    /// Parses a JSON array of sequenced operations.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::UnsupportedCategory`] for an operation whose
    /// `category` is unknown, and [`LoggerError::Validation`] for any other
    /// malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(malformed)?;
        if let Some(steps) = value.as_array() {
            for step in steps {
                let category = step
                    .get("operation")
                    .and_then(|operation| operation.get("category"))
                    .and_then(serde_json::Value::as_str);
                if let Some(category) = category
                    && !CATEGORIES.contains(&category)
                {
                    return Err(LoggerError::UnsupportedCategory(category.to_owned()));
                }
            }
        }
        serde_json::from_value(value).map_err(malformed)
    }
}

fn malformed(err: serde_json::Error) -> LoggerError {
    LoggerError::validation(MessageKey::StoreOperationSequence, err.to_string())
}

impl Deref for StoreOperationSequence {
    type Target = [SequencedOperation];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<SequencedOperation> for StoreOperationSequence {
    fn from_iter<I: IntoIterator<Item = SequencedOperation>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<SequencedOperation>> for StoreOperationSequence {
    fn from(operations: Vec<SequencedOperation>) -> Self {
        Self(operations)
    }
}

impl AzLogger {
    /// Runs every operation of `sequence` in order until one's execution
    /// type says stop.
    ///
    /// Early stops and full runs both report success. A logger error raised
    /// by an operation (disposal, gate timeout, cancellation, bad argument)
    /// is recorded on that operation and ends the run with a failure
    /// response keyed [`MessageKey::StoreOperationSequence`].
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::OutOfRange`] if `sequence` is empty.
    pub async fn execute_sequence(
        &self,
        sequence: &mut StoreOperationSequence,
    ) -> Result<Response<()>> {
        self.execute_sequence_with_cancel(sequence, &CancellationToken::new()).await
    }

    /// [`execute_sequence`](Self::execute_sequence) with a cancellation
    /// signal shared by every operation.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::OutOfRange`] if `sequence` is empty.
    #[tracing::instrument(skip_all, fields(operations = sequence.len()))]
    pub async fn execute_sequence_with_cancel(
        &self,
        sequence: &mut StoreOperationSequence,
        cancel: &CancellationToken,
    ) -> Result<Response<()>> {
        if sequence.is_empty() {
            return Err(LoggerError::OutOfRange("store operation sequence"));
        }

        for (index, step) in sequence.0.iter_mut().enumerate() {
            let outcome = match self.dispatch(&step.operation, cancel).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(
                        index,
                        category = step.operation.category(),
                        error = %err,
                        "store operation sequence aborted"
                    );
                    step.outcome =
                        Some(Response::failure(MessageKey::StoreOperationSequence, err.clone()));
                    return Ok(Response::failure(MessageKey::StoreOperationSequence, err));
                },
            };

            let proceed = step.execution_type.proceeds_after(&outcome);
            step.outcome = Some(outcome);
            if !proceed {
                tracing::debug!(index, execution_type = ?step.execution_type, "sequence stopped");
                break;
            }
        }

        Ok(Response::success(()))
    }

    async fn dispatch(
        &self,
        operation: &StoreOperation,
        cancel: &CancellationToken,
    ) -> Result<Response<OperationValue>> {
        let outcome = match operation {
            StoreOperation::AddToTable { raw_log, options } => self
                .add_to_table_with_cancel(raw_log, options.clone(), cancel)
                .await?
                .map(OperationValue::TableWrite),
            StoreOperation::AddToBlob { raw_log, options } => self
                .add_to_blob_with_cancel(raw_log, options.clone(), cancel)
                .await?
                .map(OperationValue::BlobWrite),
            StoreOperation::GetFromTable { table_name, partition_key, row_key, options } => self
                .get_from_table_with_cancel(table_name, partition_key, row_key, *options, cancel)
                .await?
                .map(OperationValue::Log),
            StoreOperation::GetFromBlob { container_name, blob_name, options } => self
                .get_from_blob_with_cancel(container_name, blob_name, *options, cancel)
                .await?
                .map(OperationValue::Log),
        };
        Ok(outcome)
    }
}
