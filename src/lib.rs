//! sidx - secondary-index store over a watch/commit key-value engine
//!
//! Records are stored under their primary key and indexed by three unique
//! attributes and two shared categories. Every record and its five index
//! entries become visible together or not at all.
//!
//! # Quick Start
//!
//! ```
//! use sidx::{Context, IndexedStore, Record, RetryConfig};
//!
//! let store = IndexedStore::in_memory(RetryConfig::default());
//! let ctx = Context::background();
//!
//! let record = Record {
//!     global_id: 42,
//!     system_object_id: "777".into(),
//!     id: 1,
//!     id_en: 9,
//!     mode: "abc".into(),
//!     mode_en: "cba".into(),
//!     ..Default::default()
//! };
//! store.put(&ctx, &record)?;
//!
//! let hit = store.resolve(&ctx, "id:1", false, 0, 0)?;
//! assert_eq!(hit.records, vec![record]);
//! # Ok::<(), sidx::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `sidx-core`: record codec, key namespaces, errors, the `KvEngine` seam
//! - `sidx-storage`: the in-memory engine and fault-injection wrapper
//! - `sidx-engine`: the indexed store, ingestion, queries and configuration

pub use sidx_core::{
    decode, decode_batch, encode, Context, Error, ErrorKind, KvEngine, Namespace, Record,
    RecordKeys, Result, Watch, WriteBatch, WriteOp,
};
pub use sidx_engine::*;
pub use sidx_storage::MemoryEngine;

/// Fault injection for exercising the store's error paths
pub mod testing {
    pub use sidx_storage::testing::*;
}
