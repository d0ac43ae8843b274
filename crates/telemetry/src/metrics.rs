//! Internal metrics collection.
//!
//! Counters are process-global and lock-free; generator tasks and the
//! exporter update them concurrently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Level that rises and falls, e.g. running map tasks.
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Never drops below zero.
    pub fn dec(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }
}

/// Millisecond latency histogram.
///
/// Bounds run from a single insert batch up to a five-minute step.
#[derive(Debug, Default)]
pub struct Histogram {
    buckets: [AtomicU64; 10],
    sum: AtomicU64,
    count: AtomicU64,
    max: AtomicU64,
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [5, 25, 100, 250, 1_000, 5_000, 15_000, 60_000, 300_000, u64::MAX];

    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.max.fetch_max(ms, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        match self.count() {
            0 => 0.0,
            count => self.sum() as f64 / count as f64,
        }
    }

    /// `(upper bound, count)` pairs. The last bound is `u64::MAX`.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for a pipeline run.
#[derive(Debug, Default)]
pub struct Metrics {
    // Generation
    pub records_generated: Counter,
    pub partitions_written: Counter,
    pub map_tasks_started: Counter,
    pub map_tasks_failed: Counter,

    // Source store
    pub source_queries: Counter,
    pub source_errors: Counter,

    // Warehouse
    pub tables_created: Counter,
    pub rows_loaded: Counter,
    pub load_errors: Counter,
    pub tables_skipped: Counter,

    // Orchestration
    pub steps_succeeded: Counter,
    pub steps_failed: Counter,

    // Latency histograms
    pub step_latency_ms: Histogram,
    pub insert_latency_ms: Histogram,

    // Gauges
    pub active_map_tasks: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub records_generated: u64,
    pub partitions_written: u64,
    pub map_tasks_started: u64,
    pub map_tasks_failed: u64,
    pub source_queries: u64,
    pub source_errors: u64,
    pub tables_created: u64,
    pub rows_loaded: u64,
    pub load_errors: u64,
    pub tables_skipped: u64,
    pub steps_succeeded: u64,
    pub steps_failed: u64,
    pub step_latency_mean_ms: f64,
    pub step_latency_max_ms: u64,
    pub insert_latency_mean_ms: f64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            records_generated: self.records_generated.get(),
            partitions_written: self.partitions_written.get(),
            map_tasks_started: self.map_tasks_started.get(),
            map_tasks_failed: self.map_tasks_failed.get(),
            source_queries: self.source_queries.get(),
            source_errors: self.source_errors.get(),
            tables_created: self.tables_created.get(),
            rows_loaded: self.rows_loaded.get(),
            load_errors: self.load_errors.get(),
            tables_skipped: self.tables_skipped.get(),
            steps_succeeded: self.steps_succeeded.get(),
            steps_failed: self.steps_failed.get(),
            step_latency_mean_ms: self.step_latency_ms.mean(),
            step_latency_max_ms: self.step_latency_ms.max(),
            insert_latency_mean_ms: self.insert_latency_ms.mean(),
        }
    }
}

/// Logs a snapshot as one structured event.
pub fn log_snapshot(snapshot: &MetricsSnapshot) {
    tracing::info!(
        records_generated = snapshot.records_generated,
        partitions_written = snapshot.partitions_written,
        source_queries = snapshot.source_queries,
        source_errors = snapshot.source_errors,
        tables_created = snapshot.tables_created,
        rows_loaded = snapshot.rows_loaded,
        load_errors = snapshot.load_errors,
        tables_skipped = snapshot.tables_skipped,
        steps_succeeded = snapshot.steps_succeeded,
        steps_failed = snapshot.steps_failed,
        step_latency_mean_ms = snapshot.step_latency_mean_ms,
        step_latency_max_ms = snapshot.step_latency_max_ms,
        insert_latency_mean_ms = snapshot.insert_latency_mean_ms,
        "Run metrics"
    );
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
