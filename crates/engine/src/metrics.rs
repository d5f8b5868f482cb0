//! Store metrics
//!
//! Counters for everything the store does that a caller cannot otherwise
//! observe, most importantly puts that fail inside a batch ingestion.
//!
//! # Memory Ordering
//!
//! All counters use Relaxed ordering: they are purely observational and do
//! not synchronize any other memory operations.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters owned by one store instance
#[derive(Debug, Default)]
pub struct StoreMetrics {
    puts_committed: AtomicU64,
    conflicts: AtomicU64,
    retries_exhausted: AtomicU64,
    put_failures: AtomicU64,
    resolves: AtomicU64,
    records_resolved: AtomicU64,
    batches_ingested: AtomicU64,
}

/// Point-in-time copy of [`StoreMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Puts whose batch was applied
    pub puts_committed: u64,
    /// Watch conflicts seen, including ones later retried successfully
    pub conflicts: u64,
    /// Puts that hit the attempt ceiling
    pub retries_exhausted: u64,
    /// Puts that failed for any other reason
    pub put_failures: u64,
    /// Resolve calls that returned successfully
    pub resolves: u64,
    /// Records returned across all resolves
    pub records_resolved: u64,
    /// Ingestion batches that finished
    pub batches_ingested: u64,
}

impl StoreMetrics {
    /// Fresh zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_commit(&self) {
        self.puts_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.retries_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_put_failure(&self) {
        self.put_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_resolve(&self, records: usize) {
        self.resolves.fetch_add(1, Ordering::Relaxed);
        self.records_resolved
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_batch(&self) {
        self.batches_ingested.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            puts_committed: self.puts_committed.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            retries_exhausted: self.retries_exhausted.load(Ordering::Relaxed),
            put_failures: self.put_failures.load(Ordering::Relaxed),
            resolves: self.resolves.load(Ordering::Relaxed),
            records_resolved: self.records_resolved.load(Ordering::Relaxed),
            batches_ingested: self.batches_ingested.load(Ordering::Relaxed),
        }
    }
}
