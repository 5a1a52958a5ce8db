use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    records_processed: AtomicU64,
    batches_drained: AtomicU64,
    jobs_submitted: AtomicU64,
    rows_dropped: AtomicU64,
    failure_count: AtomicU64,
}

/// Shared counters for one sink instance.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub records_processed: u64,
    pub batches_drained: u64,
    pub jobs_submitted: u64,
    /// Rows rejected by streaming inserts and not retried.
    pub rows_dropped: u64,
    pub failure_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_records(&self, count: u64) {
        self.inner
            .records_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batches(&self, count: u64) {
        self.inner
            .batches_drained
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_jobs(&self, count: u64) {
        self.inner.jobs_submitted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_rows_dropped(&self, count: u64) {
        self.inner.rows_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.failure_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_processed: self.inner.records_processed.load(Ordering::Relaxed),
            batches_drained: self.inner.batches_drained.load(Ordering::Relaxed),
            jobs_submitted: self.inner.jobs_submitted.load(Ordering::Relaxed),
            rows_dropped: self.inner.rows_dropped.load(Ordering::Relaxed),
            failure_count: self.inner.failure_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
