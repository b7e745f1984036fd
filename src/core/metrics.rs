//! Logger metrics for observability
//!
//! Counters describing the health of the logging path itself: entries
//! emitted, entries that needed the fallback line, sink failures and entries
//! whose construction exceeded the latency budget.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use trace_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_fallback();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.fallback_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries rendered by the formatter and handed to the sinks
    total_logged: AtomicU64,

    /// Entries written through the minimal `[LEVEL] message` path
    fallback_count: AtomicU64,

    /// Individual sink writes that returned an error or panicked
    sink_failures: AtomicU64,

    /// Entries whose construction exceeded the slow-entry threshold
    slow_entries: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            fallback_count: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            slow_entries: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn slow_entries(&self) -> u64 {
        self.slow_entries.load(Ordering::Relaxed)
    }

    /// Record an emitted entry, returning the previous count
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fallback(&self) -> u64 {
        self.fallback_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_slow_entry(&self) -> u64 {
        self.slow_entries.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of entries that needed the fallback path (0.0 - 100.0)
    pub fn fallback_rate(&self) -> f64 {
        let fallback = self.fallback_count() as f64;
        let total = self.total_logged() as f64 + fallback;
        if total == 0.0 {
            0.0
        } else {
            (fallback / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.fallback_count.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.slow_entries.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            fallback_count: AtomicU64::new(self.fallback_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            slow_entries: AtomicU64::new(self.slow_entries()),
        }
    }
}
