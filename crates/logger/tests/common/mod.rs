//! Shared fixtures for the logger integration tests.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use azlogger::{AzLogger, BackoffConfig, FixedClock, LoggerConfig, RawLog, SeverityLevel};
use azlogger_storage::testutil::{FlakyBlobStore, FlakyTableStore};
use chrono::{DateTime, TimeZone, Utc};

/// 2024-01-07 12:00:00 UTC, the instant every fixture logger sees.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 7, 12, 0, 0).unwrap()
}

/// Millisecond backoff so retry tests stay fast.
pub fn fast_backoff() -> BackoffConfig {
    BackoffConfig::builder()
        .initial_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(4))
        .build()
        .unwrap()
}

pub fn fast_config() -> LoggerConfig {
    LoggerConfig::builder().backoff(fast_backoff()).build()
}

pub fn raw_log(source: &str, severity_level: SeverityLevel) -> RawLog {
    RawLog::builder()
        .source(source)
        .severity_level(severity_level)
        .message("integration test")
        .build()
}

/// A logger over flaky in-memory stores the test keeps handles to.
pub struct Harness {
    pub table: FlakyTableStore,
    pub blob: FlakyBlobStore,
    pub clock: Arc<FixedClock>,
    pub logger: AzLogger,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: LoggerConfig) -> Self {
        Self::with_stores(FlakyTableStore::default(), FlakyBlobStore::default(), config)
    }

    pub fn with_stores(table: FlakyTableStore, blob: FlakyBlobStore, config: LoggerConfig) -> Self {
        let clock = Arc::new(FixedClock::at(fixed_now()));
        let logger = AzLogger::builder()
            .table_store(Arc::new(table.clone()))
            .blob_store(Arc::new(blob.clone()))
            .config(config)
            .clock(clock.clone())
            .build()
            .unwrap();
        Self { table, blob, clock, logger }
    }
}
