//! Counters for observing the runtime and its writers

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery statistics of a runtime
///
/// # Example
///
/// ```
/// use rust_log_runtime::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_dropped();
/// metrics.record_logged();
///
/// assert_eq!(metrics.dropped_count(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Events the backend failed to deliver
    dropped_count: AtomicU64,

    /// Events delivered without error
    total_logged: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            dropped_count: AtomicU64::new(0),
            total_logged: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    /// Record a dropped event, returns the previous count
    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop rate as a percentage (0.0 - 100.0)
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.total_logged() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics of a batching writer
#[derive(Debug, Default)]
pub struct WriterMetrics {
    rows_written: AtomicU64,
    batches_executed: AtomicU64,
    implicit_flushes: AtomicU64,
    failures: AtomicU64,
}

impl WriterMetrics {
    pub const fn new() -> Self {
        Self {
            rows_written: AtomicU64::new(0),
            batches_executed: AtomicU64::new(0),
            implicit_flushes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Rows handed to the database successfully
    #[inline]
    pub fn rows_written(&self) -> u64 {
        self.rows_written.load(Ordering::Relaxed)
    }

    /// Batches executed, explicit and implicit
    #[inline]
    pub fn batches_executed(&self) -> u64 {
        self.batches_executed.load(Ordering::Relaxed)
    }

    /// Batches executed because the buffer was full
    #[inline]
    pub fn implicit_flushes(&self) -> u64 {
        self.implicit_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rows(&self, rows: u64) {
        self.rows_written.fetch_add(rows, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch(&self, implicit: bool) {
        self.batches_executed.fetch_add(1, Ordering::Relaxed);
        if implicit {
            self.implicit_flushes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_drop_rate() {
        let metrics = LoggerMetrics::new();
        assert_eq!(metrics.drop_rate(), 0.0);

        for _ in 0..100 {
            metrics.record_logged();
        }
        for _ in 0..10 {
            metrics.record_dropped();
        }
        let rate = metrics.drop_rate();
        assert!(rate > 9.0 && rate < 10.0, "Drop rate was {}", rate);
    }

    #[test]
    fn test_writer_metrics() {
        let metrics = WriterMetrics::new();
        metrics.record_batch(false);
        metrics.record_batch(true);
        metrics.record_rows(128);
        metrics.record_failure();

        assert_eq!(metrics.batches_executed(), 2);
        assert_eq!(metrics.implicit_flushes(), 1);
        assert_eq!(metrics.rows_written(), 128);
        assert_eq!(metrics.failures(), 1);
    }
}
