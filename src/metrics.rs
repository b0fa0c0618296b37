use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;

/// Global runtime metrics for the fingerprint pipeline.
///
/// Purpose:
/// - Track how often the identity record short-circuits collection
/// - Track collection runs and misbehaving collectors
/// - Track record writes
///
/// Design:
/// - Lock-free (Atomics)
/// - Shared by every session in the process
#[derive(Default)]
pub struct RuntimeMetrics {
    pub sessions_loaded: AtomicUsize,

    // get() outcomes
    pub cache_hits: AtomicUsize,
    pub cache_misses: AtomicUsize,

    // Collection phase
    pub collections_run: AtomicUsize,
    pub collector_failures: AtomicUsize,
    pub collector_timeouts: AtomicUsize,

    pub records_written: AtomicUsize,
}

impl RuntimeMetrics {
    /// One-line summary in the same shape the binary logs at exit.
    pub fn summary(&self) -> String {
        format!(
            "[METRICS] sessions={} hits={} misses={} collections={} failures={} timeouts={} writes={}",
            self.sessions_loaded.load(Ordering::Relaxed),
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
            self.collections_run.load(Ordering::Relaxed),
            self.collector_failures.load(Ordering::Relaxed),
            self.collector_timeouts.load(Ordering::Relaxed),
            self.records_written.load(Ordering::Relaxed),
        )
    }
}

/// Global metrics registry (singleton)
pub static METRICS: Lazy<Arc<RuntimeMetrics>> = Lazy::new(|| Arc::new(RuntimeMetrics::default()));
