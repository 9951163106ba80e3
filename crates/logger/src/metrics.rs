//! Logger metrics.
//!
//! Counters for store attempts, retries, budget exhaustion, permanent stops,
//! filter denials and resource-cache hits. [`LoggerMetrics`] is cheaply
//! cloneable; every clone updates the same counters.
//!
//! All atomics use `Ordering::Relaxed`. Each counter is independent, so a
//! [`MetricsSnapshot`] may show counters that are slightly out of step with
//! each other.
//!
//! ```
//! use azlogger::LoggerMetrics;
//!
//! let metrics = LoggerMetrics::new();
//! metrics.record_add_attempt();
//! metrics.record_retry();
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.add_attempts, 1);
//! assert_eq!(snapshot.retries, 1);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct Counters {
    add_attempts: AtomicU64,
    get_attempts: AtomicU64,
    retries: AtomicU64,
    retries_exhausted: AtomicU64,
    permanent_failures: AtomicU64,
    writes_denied: AtomicU64,
    reads_denied: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Shared counters for one logger.
#[derive(Debug, Clone, Default)]
pub struct LoggerMetrics {
    inner: Arc<Counters>,
}

/// Point-in-time copy of [`LoggerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Write attempts that reached the operation step.
    pub add_attempts: u64,
    /// Read attempts that reached the operation step.
    pub get_attempts: u64,
    /// Backoff sleeps taken before another attempt.
    pub retries: u64,
    /// Calls that spent their whole attempt budget.
    pub retries_exhausted: u64,
    /// Calls stopped by a non-retriable failure.
    pub permanent_failures: u64,
    /// Writes denied by the write filter.
    pub writes_denied: u64,
    /// Reads denied by the read filter.
    pub reads_denied: u64,
    /// Resource loads answered from the engine cache.
    pub cache_hits: u64,
    /// Resource loads that reached the store.
    pub cache_misses: u64,
}

impl LoggerMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a write attempt.
    pub fn record_add_attempt(&self) {
        self.inner.add_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read attempt.
    pub fn record_get_attempt(&self) {
        self.inner.get_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a backoff before another attempt.
    pub fn record_retry(&self) {
        self.inner.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a call whose attempt budget ran out.
    pub fn record_retry_exhausted(&self) {
        self.inner.retries_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a call stopped by a non-retriable failure.
    pub fn record_permanent_failure(&self) {
        self.inner.permanent_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a write denied by the filter.
    pub fn record_write_denied(&self) {
        self.inner.writes_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a read denied by the filter.
    pub fn record_read_denied(&self) {
        self.inner.reads_denied.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a resource load answered from the cache.
    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a resource load that reached the store.
    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let c = &self.inner;
        MetricsSnapshot {
            add_attempts: c.add_attempts.load(Ordering::Relaxed),
            get_attempts: c.get_attempts.load(Ordering::Relaxed),
            retries: c.retries.load(Ordering::Relaxed),
            retries_exhausted: c.retries_exhausted.load(Ordering::Relaxed),
            permanent_failures: c.permanent_failures.load(Ordering::Relaxed),
            writes_denied: c.writes_denied.load(Ordering::Relaxed),
            reads_denied: c.reads_denied.load(Ordering::Relaxed),
            cache_hits: c.cache_hits.load(Ordering::Relaxed),
            cache_misses: c.cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        let c = &self.inner;
        for counter in [
            &c.add_attempts,
            &c.get_attempts,
            &c.retries,
            &c.retries_exhausted,
            &c.permanent_failures,
            &c.writes_denied,
            &c.reads_denied,
            &c.cache_hits,
            &c.cache_misses,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = LoggerMetrics::new();
        let clone = metrics.clone();
        clone.record_cache_hit();
        clone.record_write_denied();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.writes_denied, 1);
    }

    #[test]
    fn test_reset() {
        let metrics = LoggerMetrics::new();
        metrics.record_get_attempt();
        metrics.record_permanent_failure();
        metrics.reset();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
