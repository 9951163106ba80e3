//! Key and name generation.
//!
//! Six values are generated for every write: partition key, row key, verbose
//! labels, table name, blob container name and blob name. Each is resolved
//! with the same precedence:
//!
//! 1. an explicit per-call value ([`WriteOptions`](crate::WriteOptions)),
//! 2. the delegate configured on the logger ([`DelegateContainer`]),
//! 3. the default algorithm in this module.
//!
//! | Value          | Default                                         |
//! |----------------|-------------------------------------------------|
//! | partition key  | day of month, e.g. `"7"`                        |
//! | row key        | `"{severity}_{source}_{uuid-v4}"`               |
//! | verbose labels | none                                            |
//! | table name     | `"Logger{yyyyMM}Low"`, `High` from `Error` up   |
//! | container name | `"azlogs-{yyyyMM}"`                             |
//! | blob name      | `"{severity}/{partition_key}/{row_key}.json"`   |

use std::{fmt, sync::Arc};

use azlogger_storage::{LogEntity, VerboseLabels};
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::{clock::Clock, model::ReadOnlyRawLog};

/// Prefix of default table names.
pub const TABLE_NAME_PREFIX: &str = "Logger";

/// Prefix of default blob container names.
pub const BLOB_CONTAINER_PREFIX: &str = "azlogs";

/// Generates a string from a raw log (keys, table and container names).
pub type NameDelegate = Arc<dyn Fn(&ReadOnlyRawLog) -> String + Send + Sync>;

/// Promotes entries of the verbose mapping into label slots.
pub type LabelDelegate = Arc<dyn Fn(&ReadOnlyRawLog) -> VerboseLabels + Send + Sync>;

/// Generates a blob name from the raw log and the entity built for it.
pub type BlobNameDelegate = Arc<dyn Fn(&ReadOnlyRawLog, &LogEntity) -> String + Send + Sync>;

/// Optional generation delegates. An empty slot selects the default algorithm.
///
/// ```
/// use azlogger::DelegateContainer;
///
/// let delegates = DelegateContainer::new()
///     .with_table_name(|log| format!("{}Logs", log.source()))
///     .with_partition_key(|log| log.source().to_owned());
/// assert!(delegates.table_name.is_some());
/// assert!(delegates.row_key.is_none());
/// ```
#[derive(Clone, Default)]
pub struct DelegateContainer {
    /// Partition key generator.
    pub partition_key: Option<NameDelegate>,
    /// Row key generator.
    pub row_key: Option<NameDelegate>,
    /// Verbose label filler.
    pub verbose_labels: Option<LabelDelegate>,
    /// Table name generator.
    pub table_name: Option<NameDelegate>,
    /// Blob container name generator.
    pub blob_container_name: Option<NameDelegate>,
    /// Blob name generator.
    pub blob_name: Option<BlobNameDelegate>,
}

impl fmt::Debug for DelegateContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateContainer")
            .field("partition_key", &self.partition_key.is_some())
            .field("row_key", &self.row_key.is_some())
            .field("verbose_labels", &self.verbose_labels.is_some())
            .field("table_name", &self.table_name.is_some())
            .field("blob_container_name", &self.blob_container_name.is_some())
            .field("blob_name", &self.blob_name.is_some())
            .finish()
    }
}

impl DelegateContainer {
    /// Creates a container with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the partition key generator.
    #[must_use]
    pub fn with_partition_key(
        mut self,
        f: impl Fn(&ReadOnlyRawLog) -> String + Send + Sync + 'static,
    ) -> Self {
        self.partition_key = Some(Arc::new(f));
        self
    }

    /// Sets the row key generator.
    #[must_use]
    pub fn with_row_key(
        mut self,
        f: impl Fn(&ReadOnlyRawLog) -> String + Send + Sync + 'static,
    ) -> Self {
        self.row_key = Some(Arc::new(f));
        self
    }

    /// Sets the verbose label filler.
    #[must_use]
    pub fn with_verbose_labels(
        mut self,
        f: impl Fn(&ReadOnlyRawLog) -> VerboseLabels + Send + Sync + 'static,
    ) -> Self {
        self.verbose_labels = Some(Arc::new(f));
        self
    }

    /// Sets the table name generator.
    #[must_use]
    pub fn with_table_name(
        mut self,
        f: impl Fn(&ReadOnlyRawLog) -> String + Send + Sync + 'static,
    ) -> Self {
        self.table_name = Some(Arc::new(f));
        self
    }

    /// Sets the blob container name generator.
    #[must_use]
    pub fn with_blob_container_name(
        mut self,
        f: impl Fn(&ReadOnlyRawLog) -> String + Send + Sync + 'static,
    ) -> Self {
        self.blob_container_name = Some(Arc::new(f));
        self
    }

    /// Sets the blob name generator.
    #[must_use]
    pub fn with_blob_name(
        mut self,
        f: impl Fn(&ReadOnlyRawLog, &LogEntity) -> String + Send + Sync + 'static,
    ) -> Self {
        self.blob_name = Some(Arc::new(f));
        self
    }
}

/// Default partition key: the day of the month.
#[must_use]
pub fn default_partition_key(now: DateTime<Utc>) -> String {
    now.day().to_string()
}

/// Default row key: severity, source and a fresh v4 UUID.
#[must_use]
pub fn default_row_key(log: &ReadOnlyRawLog) -> String {
    format!("{}_{}_{}", log.severity_level(), log.source(), Uuid::new_v4())
}

/// Default table name: prefix, `yyyyMM`, then `Low` or `High` by severity.
#[must_use]
pub fn default_table_name(log: &ReadOnlyRawLog, now: DateTime<Utc>) -> String {
    let band = if log.severity_level().is_high() { "High" } else { "Low" };
    format!("{TABLE_NAME_PREFIX}{}{band}", now.format("%Y%m"))
}

/// Default blob container name: prefix, dash, `yyyyMM`.
#[must_use]
pub fn default_blob_container_name(now: DateTime<Utc>) -> String {
    format!("{BLOB_CONTAINER_PREFIX}-{}", now.format("%Y%m"))
}

/// Default blob name: `{severity}/{partition_key}/{row_key}.json`.
#[must_use]
pub fn default_blob_name(entity: &LogEntity) -> String {
    format!("{}/{}/{}.json", entity.severity_level, entity.partition_key, entity.row_key)
}

/// Per-call values that bypass delegates and defaults.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NameOverrides<'a> {
    pub(crate) partition_key: Option<&'a str>,
    pub(crate) row_key: Option<&'a str>,
    pub(crate) table_name: Option<&'a str>,
    pub(crate) blob_container_name: Option<&'a str>,
    pub(crate) blob_name: Option<&'a str>,
}

/// Delegates plus the clock, resolving every generated value.
#[derive(Clone)]
pub(crate) struct GenerationStrategy {
    delegates: DelegateContainer,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for GenerationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationStrategy")
            .field("delegates", &self.delegates)
            .finish_non_exhaustive()
    }
}

impl GenerationStrategy {
    pub(crate) fn new(delegates: DelegateContainer, clock: Arc<dyn Clock>) -> Self {
        Self { delegates, clock }
    }

    pub(crate) fn delegates(&self) -> &DelegateContainer {
        &self.delegates
    }

    pub(crate) fn delegates_mut(&mut self) -> &mut DelegateContainer {
        &mut self.delegates
    }

    /// Builds the entity for `log` with generated keys and labels.
    pub(crate) fn entity(&self, log: &ReadOnlyRawLog, overrides: NameOverrides<'_>) -> LogEntity {
        let now = self.clock.now();
        let partition_key = match (overrides.partition_key, &self.delegates.partition_key) {
            (Some(key), _) => key.to_owned(),
            (None, Some(delegate)) => delegate(log),
            (None, None) => default_partition_key(now),
        };
        let row_key = match (overrides.row_key, &self.delegates.row_key) {
            (Some(key), _) => key.to_owned(),
            (None, Some(delegate)) => delegate(log),
            (None, None) => default_row_key(log),
        };
        let labels =
            self.delegates.verbose_labels.as_ref().map_or_else(VerboseLabels::new, |d| d(log));
        log.to_entity(partition_key, row_key, labels, now)
    }

    pub(crate) fn table_name(&self, log: &ReadOnlyRawLog, overrides: NameOverrides<'_>) -> String {
        match (overrides.table_name, &self.delegates.table_name) {
            (Some(name), _) => name.to_owned(),
            (None, Some(delegate)) => delegate(log),
            (None, None) => default_table_name(log, self.clock.now()),
        }
    }

    pub(crate) fn blob_container_name(
        &self,
        log: &ReadOnlyRawLog,
        overrides: NameOverrides<'_>,
    ) -> String {
        match (overrides.blob_container_name, &self.delegates.blob_container_name) {
            (Some(name), _) => name.to_owned(),
            (None, Some(delegate)) => delegate(log),
            (None, None) => default_blob_container_name(self.clock.now()),
        }
    }

    pub(crate) fn blob_name(
        &self,
        log: &ReadOnlyRawLog,
        entity: &LogEntity,
        overrides: NameOverrides<'_>,
    ) -> String {
        match (overrides.blob_name, &self.delegates.blob_name) {
            (Some(name), _) => name.to_owned(),
            (None, Some(delegate)) => delegate(log, entity),
            (None, None) => default_blob_name(entity),
        }
    }
}
