//! Common types persisted to and returned from the stores.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Number of verbose label slots on a [`LogEntity`].
pub const VERBOSE_LABEL_SLOTS: usize = 10;

/// Ordered log importance.
///
/// The ordering is used both for filtering and for default table naming
/// (entries at or above [`SeverityLevel::Error`] go to the "High" table).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SeverityLevel {
    /// Diagnostic chatter.
    Debug,
    /// Normal operational messages.
    #[default]
    Info,
    /// Something unexpected that did not fail the operation.
    Warning,
    /// A failed operation.
    Error,
    /// A failure carrying an exception payload.
    Exception,
}

impl SeverityLevel {
    /// Returns `true` for levels at or above [`SeverityLevel::Error`].
    #[must_use]
    pub fn is_high(self) -> bool {
        self >= Self::Error
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "Debug"),
            Self::Info => write!(f, "Info"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
            Self::Exception => write!(f, "Exception"),
        }
    }
}

/// Fixed slots promoting selected verbose entries into queryable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerboseLabels([Option<String>; VERBOSE_LABEL_SLOTS]);

impl VerboseLabels {
    /// Creates an empty label set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the label in `slot` (zero-based), if set.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(Option::as_deref)
    }

    /// Sets the label in `slot` (zero-based).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if `slot` is out of range.
    pub fn set(&mut self, slot: usize, value: impl Into<String>) -> StoreResult<()> {
        let entry = self.0.get_mut(slot).ok_or_else(|| {
            StoreError::internal(format!(
                "verbose label slot {slot} out of range (0..{VERBOSE_LABEL_SLOTS})"
            ))
        })?;
        *entry = Some(value.into());
        Ok(())
    }

    /// Fills slots in order from `values`, ignoring anything past the last slot.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels = Self::default();
        for (slot, value) in labels.0.iter_mut().zip(values) {
            *slot = Some(value.into());
        }
        labels
    }

    /// Returns `true` if no slot is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Iterates over all slots in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(Option::as_deref)
    }
}

/// The persisted log record.
///
/// `partition_key` and `row_key` together form the storage-level identity.
/// Both must be non-empty before the entity reaches a store; see
/// [`LogEntity::validate_keys`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEntity {
    /// Partition half of the identity.
    pub partition_key: String,
    /// Row half of the identity.
    pub row_key: String,
    /// When the entity was generated.
    pub timestamp: DateTime<Utc>,
    /// Severity of the logged event.
    pub severity_level: SeverityLevel,
    /// Component that produced the log.
    pub source: String,
    /// Free-form message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Optional category used for grouping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Serialized verbose mapping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<String>,
    /// Exception payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    /// Caller function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_member_name: Option<String>,
    /// Caller file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_file_path: Option<String>,
    /// Caller line number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_line_number: Option<u32>,
    /// Free-form labels supplied by the caller.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Promoted verbose label slots.
    #[serde(default)]
    pub verbose_labels: VerboseLabels,
}

impl LogEntity {
    /// Creates an entity with the given identity and no descriptive fields.
    #[must_use]
    pub fn new(
        partition_key: impl Into<String>,
        row_key: impl Into<String>,
        severity_level: SeverityLevel,
        source: impl Into<String>,
    ) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            timestamp: Utc::now(),
            severity_level,
            source: source.into(),
            message: None,
            category: None,
            verbose: None,
            exception: None,
            caller_member_name: None,
            caller_file_path: None,
            caller_line_number: None,
            labels: Vec::new(),
            verbose_labels: VerboseLabels::default(),
        }
    }

    /// Checks that both identity keys are present.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] naming the first missing key.
    pub fn validate_keys(&self) -> Result<(), KeyError> {
        if self.partition_key.is_empty() {
            return Err(KeyError::MissingPartitionKey);
        }
        if self.row_key.is_empty() {
            return Err(KeyError::MissingRowKey);
        }
        Ok(())
    }
}

/// Which identity key is missing from an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    /// The partition key is empty.
    #[error("partition key is missing")]
    MissingPartitionKey,
    /// The row key is empty.
    #[error("row key is missing")]
    MissingRowKey,
}

/// Metadata returned by a blob upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    /// Opaque version tag of the stored content.
    pub etag: String,
    /// When the content was written.
    pub last_modified: DateTime<Utc>,
    /// Size of the stored content in bytes.
    pub content_length: usize,
}
