//! Batch ingestion
//!
//! Runs one `put` per record on a dedicated worker pool and collects every
//! outcome. `dispatch` hands the records off and returns at once; the
//! returned [`IngestHandle`] is the aggregation point for per-record
//! results, so a failed write is never silently lost.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use sidx_core::{decode_batch, Context, Error, ErrorKind, KvEngine, Record, Result};
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::store::IndexedStore;

/// One record that could not be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    /// Primary key of the failed record
    pub primary_key: String,
    /// What kind of failure it was
    pub kind: ErrorKind,
    /// Error text
    pub message: String,
}

impl IngestFailure {
    fn new(primary_key: &str, error: &Error) -> Self {
        Self {
            primary_key: primary_key.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of a whole batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records handed to the pool
    pub submitted: usize,
    /// Records whose put committed
    pub stored: usize,
    /// Records whose put returned an error, sorted by primary key
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// Records that did not commit, including any whose worker died
    pub fn failed(&self) -> usize {
        self.submitted - self.stored
    }

    /// Whether every submitted record committed
    pub fn is_complete(&self) -> bool {
        self.stored == self.submitted
    }

    /// Failures of one kind
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }
}

type Outcome = std::result::Result<(), IngestFailure>;

/// Pending batch; `wait` blocks until every record has an outcome
#[must_use = "dropping the handle discards per-record outcomes"]
pub struct IngestHandle {
    rx: Receiver<Outcome>,
    submitted: usize,
}

impl IngestHandle {
    /// Records handed off in this batch
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Block until the batch finishes and aggregate its outcomes
    pub fn wait(self) -> IngestReport {
        let mut report = IngestReport {
            submitted: self.submitted,
            ..IngestReport::default()
        };
        for _ in 0..self.submitted {
            match self.rx.recv() {
                Ok(Ok(())) => report.stored += 1,
                Ok(Err(failure)) => report.failures.push(failure),
                // Every sender is gone: a worker panicked before reporting
                Err(_) => break,
            }
        }
        report
            .failures
            .sort_by(|a, b| a.primary_key.cmp(&b.primary_key));
        report
    }
}

/// Feeds batches of records into an [`IndexedStore`]
pub struct Ingestor<E> {
    store: Arc<IndexedStore<E>>,
    pool: ThreadPool,
}

impl<E: KvEngine + 'static> Ingestor<E> {
    /// Create an ingestor with `workers` pool threads
    ///
    /// Workers are named `sidx-ingest-0`, `sidx-ingest-1`, etc.
    pub fn new(store: Arc<IndexedStore<E>>, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::Config("ingest.workers must be at least 1".to_string()));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("sidx-ingest-{}", i))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build ingest pool: {}", e)))?;
        Ok(Self { store, pool })
    }

    /// Create an ingestor sized by `[ingest] workers`
    pub fn with_config(store: Arc<IndexedStore<E>>, config: &IngestConfig) -> Result<Self> {
        Self::new(store, config.workers)
    }

    /// Pool threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// The store records are written into
    pub fn store(&self) -> &Arc<IndexedStore<E>> {
        &self.store
    }

    /// Hand `records` to the pool and return without waiting
    pub fn dispatch(&self, ctx: &Context, records: Vec<Record>) -> IngestHandle {
        let (tx, rx) = mpsc::channel();
        let submitted = records.len();

        for record in records {
            let store = Arc::clone(&self.store);
            let ctx = ctx.clone();
            let tx = tx.clone();
            self.pool.spawn(move || {
                let outcome = store
                    .put(&ctx, &record)
                    .map_err(|e| IngestFailure::new(record.primary_key(), &e));
                // The handle may already be gone; the outcome still reached metrics
                let _ = tx.send(outcome);
            });
        }

        IngestHandle { rx, submitted }
    }

    /// Store `records` and wait for every outcome
    pub fn ingest(&self, ctx: &Context, records: Vec<Record>) -> IngestReport {
        let report = self.dispatch(ctx, records).wait();
        self.store.metrics().record_batch();
        if report.is_complete() {
            info!(target: "sidx::ingest", stored = report.stored, "Batch ingested");
        } else {
            warn!(
                target: "sidx::ingest",
                submitted = report.submitted,
                stored = report.stored,
                failed = report.failed(),
                exhausted = report.count_of(ErrorKind::ExhaustedRetries),
                "Batch ingested with failures"
            );
        }
        report
    }

    /// Decode a JSON array of records and ingest it
    ///
    /// A malformed payload fails the whole call before anything is stored.
    pub fn ingest_json(&self, ctx: &Context, bytes: &[u8]) -> Result<IngestReport> {
        let records = decode_batch(bytes).map_err(|e| {
            warn!(target: "sidx::ingest", error = %e, "Rejected batch payload");
            e
        })?;
        Ok(self.ingest(ctx, records))
    }
}
