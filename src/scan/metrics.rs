//! Metrics collection for federated scans.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Snapshot of the metrics collected so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanMetrics {
    /// Total number of search calls.
    pub total_searches: u64,

    /// Number of calls cut short by their timeout.
    pub timeout_count: u64,

    /// Total channels dispatched across all calls.
    pub channels_scanned: u64,

    /// Total channels whose scan failed.
    pub channels_failed: u64,

    /// Total channel scans stopped by the result budget.
    pub budget_stops: u64,

    /// Total records returned.
    pub records_returned: u64,

    /// Total execution time across all calls.
    pub total_execution_time: Duration,

    /// Average execution time per call.
    pub avg_execution_time: Duration,

    /// Maximum execution time observed.
    pub max_execution_time: Duration,

    /// Minimum execution time observed.
    pub min_execution_time: Duration,

    /// Channel scans running right now.
    pub active_scans: usize,

    /// Highest number of channel scans observed running at once.
    pub peak_active_scans: usize,
}

/// Lock-free collector shared by the coordinator and its channel scans.
#[derive(Debug)]
pub struct ScanMetricsCollector {
    total_searches: AtomicU64,
    timeout_count: AtomicU64,
    channels_scanned: AtomicU64,
    channels_failed: AtomicU64,
    budget_stops: AtomicU64,
    records_returned: AtomicU64,
    total_execution_nanos: AtomicU64,
    max_execution_nanos: AtomicU64,
    min_execution_nanos: AtomicU64,
    active_scans: AtomicUsize,
    peak_active_scans: AtomicUsize,
    start_time: Instant,
}

impl ScanMetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            timeout_count: AtomicU64::new(0),
            channels_scanned: AtomicU64::new(0),
            channels_failed: AtomicU64::new(0),
            budget_stops: AtomicU64::new(0),
            records_returned: AtomicU64::new(0),
            total_execution_nanos: AtomicU64::new(0),
            max_execution_nanos: AtomicU64::new(0),
            min_execution_nanos: AtomicU64::new(u64::MAX),
            active_scans: AtomicUsize::new(0),
            peak_active_scans: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a finished search call.
    pub fn record_search(
        &self,
        execution_time: Duration,
        channels_scanned: u64,
        channels_failed: u64,
        records_returned: u64,
        timed_out: bool,
    ) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            self.timeout_count.fetch_add(1, Ordering::Relaxed);
        }
        self.channels_scanned
            .fetch_add(channels_scanned, Ordering::Relaxed);
        self.channels_failed
            .fetch_add(channels_failed, Ordering::Relaxed);
        self.records_returned
            .fetch_add(records_returned, Ordering::Relaxed);

        let nanos = execution_time.as_nanos() as u64;
        self.total_execution_nanos
            .fetch_add(nanos, Ordering::Relaxed);
        self.max_execution_nanos.fetch_max(nanos, Ordering::Relaxed);
        self.min_execution_nanos.fetch_min(nanos, Ordering::Relaxed);
    }

    /// Record a channel scan stopped by the result budget.
    pub fn record_budget_stop(&self) {
        self.budget_stops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a channel scan acquiring its concurrency permit.
    ///
    /// The returned guard records the scan finishing when dropped, including
    /// when the scan future is cancelled.
    pub fn scan_started(&self) -> ActiveScan<'_> {
        let active = self.active_scans.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_active_scans.fetch_max(active, Ordering::AcqRel);
        ActiveScan { collector: self }
    }

    /// Get the current metrics snapshot.
    pub fn snapshot(&self) -> ScanMetrics {
        let total_searches = self.total_searches.load(Ordering::Relaxed);
        let total_nanos = self.total_execution_nanos.load(Ordering::Relaxed);
        let avg_nanos = if total_searches > 0 {
            total_nanos / total_searches
        } else {
            0
        };
        let min_nanos = self.min_execution_nanos.load(Ordering::Relaxed);
        let min_execution_time = if min_nanos == u64::MAX {
            Duration::ZERO
        } else {
            Duration::from_nanos(min_nanos)
        };

        ScanMetrics {
            total_searches,
            timeout_count: self.timeout_count.load(Ordering::Relaxed),
            channels_scanned: self.channels_scanned.load(Ordering::Relaxed),
            channels_failed: self.channels_failed.load(Ordering::Relaxed),
            budget_stops: self.budget_stops.load(Ordering::Relaxed),
            records_returned: self.records_returned.load(Ordering::Relaxed),
            total_execution_time: Duration::from_nanos(total_nanos),
            avg_execution_time: Duration::from_nanos(avg_nanos),
            max_execution_time: Duration::from_nanos(
                self.max_execution_nanos.load(Ordering::Relaxed),
            ),
            min_execution_time,
            active_scans: self.active_scans.load(Ordering::Acquire),
            peak_active_scans: self.peak_active_scans.load(Ordering::Acquire),
        }
    }

    /// Reset all counters. Scans in flight are still tracked.
    pub fn reset(&self) {
        self.total_searches.store(0, Ordering::Relaxed);
        self.timeout_count.store(0, Ordering::Relaxed);
        self.channels_scanned.store(0, Ordering::Relaxed);
        self.channels_failed.store(0, Ordering::Relaxed);
        self.budget_stops.store(0, Ordering::Relaxed);
        self.records_returned.store(0, Ordering::Relaxed);
        self.total_execution_nanos.store(0, Ordering::Relaxed);
        self.max_execution_nanos.store(0, Ordering::Relaxed);
        self.min_execution_nanos.store(u64::MAX, Ordering::Relaxed);
        let active = self.active_scans.load(Ordering::Acquire);
        self.peak_active_scans.store(active, Ordering::Release);
    }

    /// Get the uptime of this collector.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for ScanMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// A channel scan in flight. See [`ScanMetricsCollector::scan_started`].
#[derive(Debug)]
pub struct ActiveScan<'a> {
    collector: &'a ScanMetricsCollector,
}

impl Drop for ActiveScan<'_> {
    fn drop(&mut self) {
        self.collector.active_scans.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return elapsed time.
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}
