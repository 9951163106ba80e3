//! Client options forwarded to the store implementations.
//!
//! [`RetryOptions`] is opaque to the logger: it is copied into
//! [`ClientOptions`] and handed to the store verbatim, only when present.
//! Absence means "use the store's own defaults".

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff shape of the store client's own retry policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    /// Constant delay between attempts.
    Fixed,
    /// Delay doubles between attempts.
    #[default]
    Exponential,
}

/// Retry policy of the underlying store client.
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryOptions {
    /// Backoff shape.
    #[serde(default)]
    #[builder(default)]
    pub mode: RetryMode,

    /// Maximum number of retries performed by the client itself.
    #[serde(default = "default_max_retries")]
    #[builder(default = default_max_retries())]
    pub max_retries: u32,

    /// Delay before the first client retry.
    #[serde(with = "humantime_serde", default = "default_delay")]
    #[builder(default = default_delay())]
    pub delay: Duration,

    /// Upper bound on a single client retry delay.
    #[serde(with = "humantime_serde", default = "default_max_delay")]
    #[builder(default = default_max_delay())]
    pub max_delay: Duration,

    /// Timeout applied to each network request.
    #[serde(with = "humantime_serde", default = "default_network_timeout")]
    #[builder(default = default_network_timeout())]
    pub network_timeout: Duration,
}

fn default_max_retries() -> u32 {
    3
}

fn default_delay() -> Duration {
    Duration::from_millis(800)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_network_timeout() -> Duration {
    Duration::from_secs(100)
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            mode: RetryMode::default(),
            max_retries: default_max_retries(),
            delay: default_delay(),
            max_delay: default_max_delay(),
            network_timeout: default_network_timeout(),
        }
    }
}

/// Options a store uses when it (re)loads a client for a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Client retry policy; `None` keeps the store defaults.
    pub retry: Option<RetryOptions>,
}

impl ClientOptions {
    /// Builds client options, copying `retry` only when present.
    #[must_use]
    pub fn with_retry(retry: Option<&RetryOptions>) -> Self {
        Self { retry: retry.cloned() }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_default_impl() {
        assert_eq!(RetryOptions::builder().build(), RetryOptions::default());
    }

    #[test]
    fn test_client_options_copy_only_when_present() {
        assert_eq!(ClientOptions::with_retry(None).retry, None);

        let retry = RetryOptions::builder().max_retries(7).mode(RetryMode::Fixed).build();
        let options = ClientOptions::with_retry(Some(&retry));
        assert_eq!(options.retry, Some(retry));
    }

    #[test]
    fn test_deserialization_with_defaults() {
        let json = r#"{ "max_retries": 5, "delay": "250ms" }"#;
        let options: RetryOptions = serde_json::from_str(json).unwrap();

        assert_eq!(options.max_retries, 5);
        assert_eq!(options.delay, Duration::from_millis(250));
        assert_eq!(options.max_delay, default_max_delay());
        assert_eq!(options.mode, RetryMode::Exponential);
    }

    #[test]
    fn test_deserialization_rejects_unknown_fields() {
        let json = r#"{ "max_retries": 5, "jitter": true }"#;
        assert!(serde_json::from_str::<RetryOptions>(json).is_err());
    }
}
