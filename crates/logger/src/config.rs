//! Logger configuration.
//!
//! [`LoggerConfig`] holds everything about a logger that can be expressed as
//! data: store retry options, the global retry knobs, the gate timeout and
//! the backoff schedule. Generation delegates and filters are code and are
//! set on [`AzLogger::builder`](crate::AzLogger::builder) instead.
//!
//! Configuration deserializes from any serde format; durations use
//! `humantime` notation:
//!
//! ```
//! use azlogger::LoggerConfig;
//!
//! let config: LoggerConfig = serde_json::from_str(r#"{
//!     "retry_on_failures": true,
//!     "max_retry_attempts": 5,
//!     "gate_timeout": "10s",
//!     "backoff": { "initial_backoff": "50ms", "max_backoff": "2s" }
//! }"#)?;
//! config.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use azlogger_storage::{ConfigError, RetryOptions};
use serde::{Deserialize, Serialize};

/// Default delay before the first retry (100 milliseconds).
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);

/// Default ceiling for a single retry delay (10 seconds).
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Default bound on waiting for the logger gate (30 seconds).
pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts for a table write when nothing overrides it.
pub const DEFAULT_TABLE_ADD_ATTEMPTS: u32 = 3;

/// Attempts for a table read when nothing overrides it.
pub const DEFAULT_TABLE_GET_ATTEMPTS: u32 = 2;

/// Attempts for a blob upload when nothing overrides it.
pub const DEFAULT_BLOB_ADD_ATTEMPTS: u32 = 4;

/// Attempts for a blob download when nothing overrides it.
pub const DEFAULT_BLOB_GET_ATTEMPTS: u32 = 3;

/// Exponential backoff schedule between retry attempts.
///
/// The delay before retry `n` (1-based) is
/// `min(initial_backoff * 2^(n-1), max_backoff)`. There is no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    #[serde(with = "humantime_serde", default = "default_initial_backoff")]
    pub(crate) initial_backoff: Duration,

    /// Upper bound on any single delay.
    #[serde(with = "humantime_serde", default = "default_max_backoff")]
    pub(crate) max_backoff: Duration,
}

fn default_initial_backoff() -> Duration {
    DEFAULT_INITIAL_BACKOFF
}

fn default_max_backoff() -> Duration {
    DEFAULT_MAX_BACKOFF
}

#[bon::bon]
impl BackoffConfig {
    /// Creates a validated backoff schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `initial_backoff` is zero or `max_backoff`
    /// is smaller than `initial_backoff`.
    #[builder]
    pub fn new(
        #[builder(default = DEFAULT_INITIAL_BACKOFF)] initial_backoff: Duration,
        #[builder(default = DEFAULT_MAX_BACKOFF)] max_backoff: Duration,
    ) -> Result<Self, ConfigError> {
        let config = Self { initial_backoff, max_backoff };
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants enforced by the builder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_backoff.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "initial_backoff",
                value: format!("{:?}", self.initial_backoff),
            });
        }
        if self.max_backoff < self.initial_backoff {
            return Err(ConfigError::Invalid {
                field: "max_backoff",
                reason: format!(
                    "{:?} is smaller than initial_backoff {:?}",
                    self.max_backoff, self.initial_backoff
                ),
            });
        }
        Ok(())
    }

    /// Delay before the first retry.
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Upper bound on any single delay.
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self { initial_backoff: DEFAULT_INITIAL_BACKOFF, max_backoff: DEFAULT_MAX_BACKOFF }
    }
}

/// Data-only configuration of an [`AzLogger`](crate::AzLogger).
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    /// Retry options forwarded to the table store client.
    #[serde(default)]
    pub table_retry_options: Option<RetryOptions>,

    /// Retry options forwarded to the blob store client.
    #[serde(default)]
    pub blob_retry_options: Option<RetryOptions>,

    /// Whether failed operations are retried at all.
    #[serde(default = "default_retry_on_failures")]
    #[builder(default = true)]
    pub retry_on_failures: bool,

    /// Global attempt budget; `None` uses the per-operation defaults.
    #[serde(default)]
    pub max_retry_attempts: Option<u32>,

    /// Bound on waiting for the logger gate.
    #[serde(with = "humantime_serde", default = "default_gate_timeout")]
    #[builder(default = DEFAULT_GATE_TIMEOUT)]
    pub gate_timeout: Duration,

    /// Delay schedule between attempts.
    #[serde(default)]
    #[builder(default)]
    pub backoff: BackoffConfig,
}

fn default_retry_on_failures() -> bool {
    true
}

fn default_gate_timeout() -> Duration {
    DEFAULT_GATE_TIMEOUT
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            table_retry_options: None,
            blob_retry_options: None,
            retry_on_failures: true,
            max_retry_attempts: None,
            gate_timeout: DEFAULT_GATE_TIMEOUT,
            backoff: BackoffConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Checks every invariant of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the attempt budget is zero, the gate
    /// timeout is zero, or the backoff schedule is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(attempts) = self.max_retry_attempts {
            validate_attempts("max_retry_attempts", attempts)?;
        }
        if self.gate_timeout.is_zero() {
            return Err(ConfigError::MustBePositive {
                field: "gate_timeout",
                value: format!("{:?}", self.gate_timeout),
            });
        }
        self.backoff.validate()
    }
}

/// Rejects an attempt budget of zero.
pub(crate) fn validate_attempts(field: &'static str, attempts: u32) -> Result<(), ConfigError> {
    if attempts == 0 {
        return Err(ConfigError::BelowMinimum { field, min: "1".into(), value: "0".into() });
    }
    Ok(())
}
