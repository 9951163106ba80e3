//! Read and write predicates.
//!
//! A missing predicate allows everything. The write predicate runs once per
//! write, before anything reaches a store. The read predicate runs once per
//! successful read, before the value is handed to the caller.

use std::{fmt, sync::Arc};

use azlogger_storage::SeverityLevel;

use crate::model::{ReadOnlyLog, ReadOnlyRawLog};

/// Predicate over a raw log about to be written.
pub type WritePredicate = Arc<dyn Fn(&ReadOnlyRawLog) -> bool + Send + Sync>;

/// Predicate over a log that was just read.
pub type ReadPredicate = Arc<dyn Fn(&ReadOnlyLog) -> bool + Send + Sync>;

/// Write and read predicates.
///
/// ```
/// use azlogger::{LogFilter, SeverityLevel};
///
/// let filter = LogFilter::min_severity(SeverityLevel::Warning);
/// assert!(filter.writing.is_some());
/// assert!(filter.reading.is_some());
/// ```
#[derive(Clone, Default)]
pub struct LogFilter {
    /// Decides whether a raw log may be written.
    pub writing: Option<WritePredicate>,
    /// Decides whether a fetched log may be returned.
    pub reading: Option<ReadPredicate>,
}

impl fmt::Debug for LogFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFilter")
            .field("writing", &self.writing.is_some())
            .field("reading", &self.reading.is_some())
            .finish()
    }
}

impl LogFilter {
    /// A filter that allows everything.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Allows reads and writes only from `level` up.
    #[must_use]
    pub fn min_severity(level: SeverityLevel) -> Self {
        Self::default()
            .with_writing(move |log| log.severity_level() >= level)
            .with_reading(move |log| log.severity_level() >= level)
    }

    /// Sets the write predicate.
    #[must_use]
    pub fn with_writing(
        mut self,
        f: impl Fn(&ReadOnlyRawLog) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.writing = Some(Arc::new(f));
        self
    }

    /// Sets the read predicate.
    #[must_use]
    pub fn with_reading(
        mut self,
        f: impl Fn(&ReadOnlyLog) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.reading = Some(Arc::new(f));
        self
    }

    /// Returns `true` if `log` may be written.
    #[must_use]
    pub fn is_writing_allowed(&self, log: &ReadOnlyRawLog) -> bool {
        self.writing.as_ref().is_none_or(|allow| allow(log))
    }

    /// Returns `true` if `log` may be returned to the caller.
    #[must_use]
    pub fn is_reading_allowed(&self, log: &ReadOnlyLog) -> bool {
        self.reading.as_ref().is_none_or(|allow| allow(log))
    }
}
