//! Caller-facing log models.
//!
//! [`RawLog`] is what a caller hands to a write. The logger immediately
//! projects it into an immutable [`ReadOnlyRawLog`], which is what filters and
//! generation delegates see. Reads return a [`ReadOnlyLog`] wrapping the
//! fetched [`LogEntity`].

use std::collections::BTreeMap;

use azlogger_storage::{ContentInfo, LogEntity, SeverityLevel, VerboseLabels};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input to a log write.
///
/// # Example
///
/// ```
/// use azlogger::{RawLog, SeverityLevel};
///
/// let log = RawLog::builder()
///     .source("billing")
///     .severity_level(SeverityLevel::Warning)
///     .message("invoice retry scheduled")
///     .verbose([("tenant".to_owned(), "acme".to_owned())].into())
///     .build();
///
/// assert_eq!(log.source, "billing");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawLog {
    /// Component that produced the log. Must not be empty.
    #[builder(into)]
    pub source: String,
    /// Severity of the event.
    #[builder(default)]
    pub severity_level: SeverityLevel,
    /// Free-form message.
    #[builder(into)]
    pub message: Option<String>,
    /// Grouping category.
    #[builder(into)]
    pub category: Option<String>,
    /// Free-form key/value details.
    #[builder(default)]
    pub verbose: BTreeMap<String, String>,
    /// Exception payload.
    #[builder(into)]
    pub exception: Option<String>,
    /// Caller function name.
    #[builder(into)]
    pub caller_member_name: Option<String>,
    /// Caller file path.
    #[builder(into)]
    pub caller_file_path: Option<String>,
    /// Caller line number.
    pub caller_line_number: Option<u32>,
    /// Optional label set.
    #[builder(default)]
    pub labels: Vec<String>,
}

/// Immutable projection of a [`RawLog`], taken once per write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyRawLog {
    source: String,
    severity_level: SeverityLevel,
    message: Option<String>,
    category: Option<String>,
    verbose: BTreeMap<String, String>,
    exception: Option<String>,
    caller_member_name: Option<String>,
    caller_file_path: Option<String>,
    caller_line_number: Option<u32>,
    labels: Vec<String>,
}

impl From<&RawLog> for ReadOnlyRawLog {
    fn from(raw: &RawLog) -> Self {
        Self {
            source: raw.source.clone(),
            severity_level: raw.severity_level,
            message: raw.message.clone(),
            category: raw.category.clone(),
            verbose: raw.verbose.clone(),
            exception: raw.exception.clone(),
            caller_member_name: raw.caller_member_name.clone(),
            caller_file_path: raw.caller_file_path.clone(),
            caller_line_number: raw.caller_line_number,
            labels: raw.labels.clone(),
        }
    }
}

impl ReadOnlyRawLog {
    /// Component that produced the log.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Severity of the event.
    #[must_use]
    pub fn severity_level(&self) -> SeverityLevel {
        self.severity_level
    }

    /// Free-form message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Grouping category.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Free-form key/value details.
    #[must_use]
    pub fn verbose(&self) -> &BTreeMap<String, String> {
        &self.verbose
    }

    /// Exception payload.
    #[must_use]
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    /// Caller function name.
    #[must_use]
    pub fn caller_member_name(&self) -> Option<&str> {
        self.caller_member_name.as_deref()
    }

    /// Caller file path.
    #[must_use]
    pub fn caller_file_path(&self) -> Option<&str> {
        self.caller_file_path.as_deref()
    }

    /// Caller line number.
    #[must_use]
    pub fn caller_line_number(&self) -> Option<u32> {
        self.caller_line_number
    }

    /// Optional label set.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Builds the entity to persist, with the generated identity and labels.
    ///
    /// The verbose mapping is stored as JSON so that the table entity stays flat.
    pub(crate) fn to_entity(
        &self,
        partition_key: String,
        row_key: String,
        verbose_labels: VerboseLabels,
        timestamp: DateTime<Utc>,
    ) -> LogEntity {
        let verbose = if self.verbose.is_empty() {
            None
        } else {
            serde_json::to_string(&self.verbose).ok()
        };
        LogEntity {
            partition_key,
            row_key,
            timestamp,
            severity_level: self.severity_level,
            source: self.source.clone(),
            message: self.message.clone(),
            category: self.category.clone(),
            verbose,
            exception: self.exception.clone(),
            caller_member_name: self.caller_member_name.clone(),
            caller_file_path: self.caller_file_path.clone(),
            caller_line_number: self.caller_line_number,
            labels: self.labels.clone(),
            verbose_labels,
        }
    }
}

/// Immutable projection of a fetched [`LogEntity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyLog {
    entity: LogEntity,
}

impl From<LogEntity> for ReadOnlyLog {
    fn from(entity: LogEntity) -> Self {
        Self { entity }
    }
}

impl ReadOnlyLog {
    /// Partition half of the identity.
    #[must_use]
    pub fn partition_key(&self) -> &str {
        &self.entity.partition_key
    }

    /// Row half of the identity.
    #[must_use]
    pub fn row_key(&self) -> &str {
        &self.entity.row_key
    }

    /// When the entity was generated.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.entity.timestamp
    }

    /// Severity of the event.
    #[must_use]
    pub fn severity_level(&self) -> SeverityLevel {
        self.entity.severity_level
    }

    /// Component that produced the log.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.entity.source
    }

    /// Free-form message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.entity.message.as_deref()
    }

    /// Grouping category.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.entity.category.as_deref()
    }

    /// Verbose mapping as it was stored.
    #[must_use]
    pub fn verbose(&self) -> BTreeMap<String, String> {
        self.entity
            .verbose
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }

    /// Exception payload.
    #[must_use]
    pub fn exception(&self) -> Option<&str> {
        self.entity.exception.as_deref()
    }

    /// Label set.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.entity.labels
    }

    /// Promoted verbose labels.
    #[must_use]
    pub fn verbose_labels(&self) -> &VerboseLabels {
        &self.entity.verbose_labels
    }

    /// The full entity.
    #[must_use]
    pub fn entity(&self) -> &LogEntity {
        &self.entity
    }
}

/// Where a table write landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReceipt {
    /// Table the entity was inserted into.
    pub table_name: String,
    /// Partition key of the entity.
    pub partition_key: String,
    /// Row key of the entity.
    pub row_key: String,
}

/// Where a blob write landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobReceipt {
    /// Container the blob was uploaded to.
    pub container_name: String,
    /// Name of the uploaded blob.
    pub blob_name: String,
    /// Metadata returned by the upload.
    pub content: ContentInfo,
}
