//! Run metrics collection
//!
//! Counters are updated by workers without taking the search lock.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Probe counters for a single search run
#[derive(Debug, Default)]
pub struct SearchMetrics {
    /// Probes issued to the oracle
    pub probes_issued: AtomicU64,
    /// Probes the oracle rejected
    pub failures: AtomicU64,
    /// Probes classified as transient errors (timeouts included)
    pub transient_errors: AtomicU64,
    /// Probes that hit the per-probe timeout
    pub timeouts: AtomicU64,
    /// Faults caught at the worker boundary
    pub worker_faults: AtomicU64,
    /// Successes that lost the race to an earlier one
    pub discarded_successes: AtomicU64,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_probe(&self) {
        self.probes_issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transient(&self) {
        self.transient_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Counted in addition to the transient error the timeout becomes.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_fault(&self) {
        self.worker_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded_success(&self) {
        self.discarded_successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            probes_issued: self.probes_issued.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            worker_faults: self.worker_faults.load(Ordering::Relaxed),
            discarded_successes: self.discarded_successes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`SearchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub probes_issued: u64,
    pub failures: u64,
    pub transient_errors: u64,
    pub timeouts: u64,
    pub worker_faults: u64,
    pub discarded_successes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = SearchMetrics::new();
        metrics.record_probe();
        metrics.record_probe();
        metrics.record_failure();
        metrics.record_timeout();
        metrics.record_transient();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.probes_issued, 2);
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(snapshot.transient_errors, 1);
        assert_eq!(snapshot.worker_faults, 0);
    }
}
