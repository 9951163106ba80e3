//! Per-call options.
//!
//! Every field is optional. An unset retry field falls back to the logger
//! setting; an unset name or key falls back to the configured delegate, then
//! to the default algorithm.

use serde::{Deserialize, Serialize};

use crate::{
    error::{LoggerError, Result},
    response::MessageKey,
    strategy::NameOverrides,
};

/// Options for a single write.
///
/// ```
/// use azlogger::WriteOptions;
///
/// let options = WriteOptions::builder()
///     .max_retry_attempts(5)
///     .table_name("AuditLogs")
///     .build();
/// assert_eq!(options.create_if_not_exists, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriteOptions {
    /// Overrides the logger's retry-on-failures flag.
    pub retry_on_failures: Option<bool>,
    /// Overrides the attempt budget.
    pub max_retry_attempts: Option<u32>,
    /// Create the table or container if missing. Writes default to `true`.
    pub create_if_not_exists: Option<bool>,
    /// Explicit table name.
    #[builder(into)]
    pub table_name: Option<String>,
    /// Explicit blob container name.
    #[builder(into)]
    pub blob_container_name: Option<String>,
    /// Explicit blob name.
    #[builder(into)]
    pub blob_name: Option<String>,
    /// Explicit partition key.
    #[builder(into)]
    pub partition_key: Option<String>,
    /// Explicit row key.
    #[builder(into)]
    pub row_key: Option<String>,
}

impl WriteOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_attempts(self.max_retry_attempts)?;
        for (key, value) in [
            (MessageKey::TableName, &self.table_name),
            (MessageKey::BlobContainerName, &self.blob_container_name),
            (MessageKey::BlobName, &self.blob_name),
            (MessageKey::PartitionKey, &self.partition_key),
            (MessageKey::RowKey, &self.row_key),
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(LoggerError::validation(key, "must not be empty when given"));
            }
        }
        Ok(())
    }

    pub(crate) fn overrides(&self) -> NameOverrides<'_> {
        NameOverrides {
            partition_key: self.partition_key.as_deref(),
            row_key: self.row_key.as_deref(),
            table_name: self.table_name.as_deref(),
            blob_container_name: self.blob_container_name.as_deref(),
            blob_name: self.blob_name.as_deref(),
        }
    }
}

/// Options for a single read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadOptions {
    /// Overrides the logger's retry-on-failures flag.
    pub retry_on_failures: Option<bool>,
    /// Overrides the attempt budget.
    pub max_retry_attempts: Option<u32>,
    /// Create the table or container if missing. Reads default to `false`.
    pub create_if_not_exists: Option<bool>,
}

impl ReadOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        validate_attempts(self.max_retry_attempts)
    }
}

fn validate_attempts(attempts: Option<u32>) -> Result<()> {
    if attempts == Some(0) {
        return Err(LoggerError::validation(MessageKey::RetryAttempts, "must be at least 1"));
    }
    Ok(())
}

/// Rejects an empty required argument.
pub(crate) fn require(key: MessageKey, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LoggerError::validation(key, "must not be empty"));
    }
    Ok(())
}
