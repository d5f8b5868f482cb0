//! IndexedStore: records plus five derived index entries per record
//!
//! ## Layout
//!
//! For a record with primary key `pk`:
//! - `pk` holds the serialized record
//! - `global_id:<n>`, `id:<n>`, `id_en:<n>` each hold `pk`
//! - `mode:<s>`, `mode_en:<s>` are lists that `pk` is appended to
//!
//! ## Write protocol
//!
//! `put` watches all six keys, probes the primary key, then submits all
//! six writes as one batch. A moved fence is retried from the watch up to
//! the configured ceiling; any other failure is returned immediately. The
//! engine applies a batch all-or-nothing, so a failed `put` leaves none of
//! its six entries behind and there is nothing to roll back.
//!
//! ## Read protocol
//!
//! Unique and primary lookups resolve through at most two hops
//! (index -> primary key -> record). List lookups report the list length
//! first, then load one page of primary keys.

use std::sync::Arc;

use sidx_core::{
    decode, encode, Context, Error, KvEngine, Namespace, Record, RecordKeys, Result, WriteBatch,
};
use sidx_storage::MemoryEngine;
use tracing::{debug, warn};

use crate::config::{QueryConfig, SidxConfig};
use crate::metrics::StoreMetrics;
use crate::query::{Page, SearchQuery};
use crate::retry::RetryConfig;

/// Result of a lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Records found; empty when the key is absent or the page is past the end
    pub records: Vec<Record>,
    /// 1 for a unique hit, list length for multi-valued lookups, else 0
    pub total: u64,
}

impl Resolved {
    fn empty(total: u64) -> Self {
        Self {
            records: Vec::new(),
            total,
        }
    }
}

/// Secondary-index store over a [`KvEngine`]
///
/// `Send + Sync` whenever the engine is; share it behind an `Arc`.
pub struct IndexedStore<E> {
    engine: E,
    retry: RetryConfig,
    query: QueryConfig,
    metrics: Arc<StoreMetrics>,
}

impl IndexedStore<MemoryEngine> {
    /// Store backed by a fresh in-process engine
    pub fn in_memory(retry: RetryConfig) -> Self {
        Self::new(MemoryEngine::new(), retry)
    }
}

impl<E: KvEngine> IndexedStore<E> {
    /// Create a store with its own retry policy and default query settings
    ///
    /// A `max_attempts` of 0 is raised to 1: every put tries at least once.
    pub fn new(engine: E, mut retry: RetryConfig) -> Self {
        if retry.max_attempts == 0 {
            warn!(target: "sidx::put", "max_attempts = 0 raised to 1");
            retry.max_attempts = 1;
        }
        Self {
            engine,
            retry,
            query: QueryConfig::default(),
            metrics: Arc::new(StoreMetrics::new()),
        }
    }

    /// Create a store from a validated configuration
    pub fn with_config(engine: E, config: &SidxConfig) -> Result<Self> {
        config.validate()?;
        let mut store = Self::new(engine, config.retry.clone());
        store.query = config.query.clone();
        Ok(store)
    }

    /// The underlying engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Retry policy fixed at construction
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Page size `search` uses
    pub fn page_size(&self) -> i64 {
        self.query.page_size
    }

    /// Counters for this store
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    // ========== Write path ==========

    /// Store `record` and its five index entries atomically
    ///
    /// # Errors
    ///
    /// - `RetriesExhausted` once every attempt lost a watch race
    /// - `Cancelled` / `DeadlineExceeded` if `ctx` ends first
    /// - `InvalidInput` for an empty primary key
    /// - any other engine or codec error, unchanged
    pub fn put(&self, ctx: &Context, record: &Record) -> Result<()> {
        let result = self.put_inner(ctx, record);
        match &result {
            Ok(()) => self.metrics.record_commit(),
            Err(Error::RetriesExhausted { .. }) => self.metrics.record_exhausted(),
            Err(_) => self.metrics.record_put_failure(),
        }
        result
    }

    fn put_inner(&self, ctx: &Context, record: &Record) -> Result<()> {
        if record.primary_key().is_empty() {
            return Err(Error::invalid_input("record has an empty system_object_id"));
        }
        let payload = encode(record)?;
        let keys = RecordKeys::for_record(record);
        let watch_set = keys.all();

        let mut last_conflict = None;
        for attempt in 0..self.retry.max_attempts {
            ctx.check()?;
            match self.try_put(ctx, &keys, &watch_set, &payload) {
                Ok(()) => {
                    debug!(target: "sidx::put", pk = %keys.primary, attempt, "Record committed");
                    return Ok(());
                }
                Err(e) if e.is_conflict() => {
                    self.metrics.record_conflict();
                    debug!(target: "sidx::put", pk = %keys.primary, attempt, error = %e, "Conflict, retrying");
                    last_conflict = Some(e);
                    let delay = self.retry.calculate_delay(attempt);
                    if !delay.is_zero() && attempt + 1 < self.retry.max_attempts {
                        std::thread::sleep(delay);
                    }
                }
                Err(e) => {
                    warn!(target: "sidx::put", pk = %keys.primary, error = %e, "Put failed");
                    return Err(e);
                }
            }
        }

        warn!(
            target: "sidx::put",
            pk = %keys.primary,
            attempts = self.retry.max_attempts,
            "Put gave up on contended keys"
        );
        let last = last_conflict.unwrap_or_else(|| Error::Conflict {
            key: keys.primary.clone(),
        });
        Err(Error::RetriesExhausted {
            attempts: self.retry.max_attempts,
            last: Box::new(last),
        })
    }

    /// One watch -> probe -> exec round
    fn try_put(
        &self,
        ctx: &Context,
        keys: &RecordKeys,
        watch_set: &[String],
        payload: &[u8],
    ) -> Result<()> {
        let watch = self.engine.watch(watch_set)?;

        // Surfaces engine trouble before anything is queued; an absent key is fine
        ctx.check()?;
        let _ = self.engine.get(&keys.primary)?;

        let mut batch = WriteBatch::new();
        batch.set(keys.primary.as_str(), payload.to_vec());
        for key in &keys.unique {
            batch.set(key.as_str(), keys.primary.as_bytes().to_vec());
        }
        for key in &keys.lists {
            batch.rpush(key.as_str(), keys.primary.as_str());
        }

        ctx.check()?;
        self.engine.exec(watch, batch)
    }

    // ========== Read path ==========

    /// Resolve `lookup` into records
    ///
    /// With `multi_valued = false`, `lookup` is a primary key or a unique
    /// index key and at most one record comes back. With
    /// `multi_valued = true`, `lookup` is a list index key: `total` is the
    /// list length and, when `page_size > 0`, members
    /// `offset..=offset + page_size` are loaded. That window is inclusive
    /// on both ends, so a full page holds `page_size + 1` records.
    ///
    /// A missing key is not an error: it yields no records and `total = 0`.
    pub fn resolve(
        &self,
        ctx: &Context,
        lookup: &str,
        multi_valued: bool,
        page_size: i64,
        offset: i64,
    ) -> Result<Resolved> {
        let resolved = if multi_valued {
            self.resolve_list(ctx, lookup, page_size, offset)?
        } else {
            self.resolve_single(ctx, lookup)?
        };
        self.metrics.record_resolve(resolved.records.len());
        Ok(resolved)
    }

    /// Run a [`SearchQuery`] with the configured page size
    pub fn search(&self, ctx: &Context, query: &SearchQuery) -> Result<Page> {
        self.search_with_page_size(ctx, query, self.query.page_size)
    }

    /// Run a [`SearchQuery`] and wrap the result in a [`Page`]
    pub fn search_with_page_size(
        &self,
        ctx: &Context,
        query: &SearchQuery,
        page_size: i64,
    ) -> Result<Page> {
        let lookup = query.to_lookup()?;
        let resolved = self.resolve(ctx, &lookup.key, lookup.multi_valued, page_size, query.offset)?;
        Ok(Page::from_resolved(
            resolved,
            query.offset,
            page_size,
            lookup.multi_valued,
        ))
    }

    fn resolve_single(&self, ctx: &Context, lookup: &str) -> Result<Resolved> {
        let Some(primary) = self.resolve_primary(ctx, lookup)? else {
            return Ok(Resolved::empty(0));
        };
        match self.load(ctx, &primary)? {
            Some(record) => Ok(Resolved {
                records: vec![record],
                total: 1,
            }),
            None => Ok(Resolved::empty(0)),
        }
    }

    fn resolve_list(
        &self,
        ctx: &Context,
        lookup: &str,
        page_size: i64,
        offset: i64,
    ) -> Result<Resolved> {
        if offset < 0 {
            return Err(Error::invalid_input(format!(
                "offset must not be negative, got {}",
                offset
            )));
        }

        ctx.check()?;
        let total = self.engine.llen(lookup)?;
        if page_size <= 0 || offset as u64 >= total {
            return Ok(Resolved::empty(total));
        }

        ctx.check()?;
        let members = self
            .engine
            .lrange(lookup, offset, offset.saturating_add(page_size))?;

        let mut records = Vec::with_capacity(members.len());
        for primary in members {
            match self.load(ctx, &primary)? {
                Some(record) => records.push(record),
                None => {
                    warn!(target: "sidx::resolve", list = %lookup, pk = %primary, "List entry has no record");
                }
            }
        }
        Ok(Resolved { records, total })
    }

    /// First hop: map a lookup key to the primary key it designates
    ///
    /// Keys outside the unique namespaces already are primary keys.
    fn resolve_primary(&self, ctx: &Context, lookup: &str) -> Result<Option<String>> {
        if Namespace::classify_unique(lookup).is_none() {
            return Ok(Some(lookup.to_string()));
        }
        ctx.check()?;
        match self.engine.get(lookup)? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                Error::Codec(format!("index entry '{}' is not UTF-8: {}", lookup, e))
            }),
        }
    }

    /// Second hop: fetch and decode the record stored under `primary`
    fn load(&self, ctx: &Context, primary: &str) -> Result<Option<Record>> {
        ctx.check()?;
        match self.engine.get(primary)? {
            None => Ok(None),
            Some(bytes) => decode(&bytes).map(Some),
        }
    }
}
