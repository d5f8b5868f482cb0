//! Indexed store engine for sidx
//!
//! This crate orchestrates the lower layers:
//! - IndexedStore: atomic put of a record plus its five index entries,
//!   and two-hop / paginated resolve
//! - RetryConfig: per-store conflict ceiling and backoff
//! - Ingestor: pooled batch ingestion with per-record outcome aggregation
//! - SearchQuery / Page: attribute-based lookups and the response envelope
//! - SidxConfig: `sidx.toml` configuration
//! - StoreMetrics: observational counters

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod query;
pub mod retry;
pub mod store;

pub use config::{IngestConfig, QueryConfig, SidxConfig, CONFIG_FILE_NAME};
pub use ingest::{IngestFailure, IngestHandle, IngestReport, Ingestor};
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use query::{Lookup, Page, SearchQuery};
pub use retry::RetryConfig;
pub use store::{IndexedStore, Resolved};
