//! The key-value engine seam
//!
//! This module defines the [`KvEngine`] trait the indexed store is written
//! against, plus the [`WriteBatch`] and [`Watch`] values passed across it.
//! The engine's only transactional primitive is `watch` followed by
//! `exec`: a batch is applied atomically, and only if none of the watched
//! keys changed in between.

use crate::error::Result;

/// One mutation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Overwrite a scalar key
    Set {
        /// Target key
        key: String,
        /// New value
        value: Vec<u8>,
    },
    /// Append a member to the tail of a list key
    RPush {
        /// Target list key
        key: String,
        /// Member appended
        member: String,
    },
}

impl WriteOp {
    /// Key this op writes
    pub fn key(&self) -> &str {
        match self {
            WriteOp::Set { key, .. } | WriteOp::RPush { key, .. } => key,
        }
    }
}

/// An ordered set of mutations applied all-or-nothing by [`KvEngine::exec`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a scalar write
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Queue a list append
    pub fn rpush(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::RPush {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    /// Queued mutations in submission order
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Number of queued mutations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Version fence over a set of keys, produced by [`KvEngine::watch`]
///
/// Versions are engine-defined; the only contract is that a key's version
/// changes whenever its value does. A missing key is fenced at version 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watch {
    fences: Vec<(String, u64)>,
}

impl Watch {
    /// Build a fence from `(key, version)` pairs
    pub fn new(fences: Vec<(String, u64)>) -> Self {
        Self { fences }
    }

    /// The fenced `(key, version)` pairs
    pub fn fences(&self) -> &[(String, u64)] {
        &self.fences
    }
}

/// Transactional key-value engine with optimistic per-key watches
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
///
/// Error contract:
/// - a missing key is never an error (`None`, `0`, or an empty list)
/// - `exec` on a moved fence returns [`crate::Error::Conflict`]
/// - anything else is an infrastructure error
pub trait KvEngine: Send + Sync {
    /// Current value of a scalar key
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite a scalar key outside of any transaction
    fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Append to a list key outside of any transaction, returning the new length
    fn rpush(&self, key: &str, member: &str) -> Result<u64>;

    /// Members `start..=end` of a list key
    ///
    /// Negative indices count from the tail (`-1` is the last member).
    /// Out-of-range bounds are clamped; a missing key yields an empty list.
    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>>;

    /// Length of a list key, 0 if missing
    fn llen(&self, key: &str) -> Result<u64>;

    /// Fence the current versions of `keys`
    fn watch(&self, keys: &[String]) -> Result<Watch>;

    /// Apply `batch` atomically if no key in `watch` has moved
    fn exec(&self, watch: Watch, batch: WriteBatch) -> Result<()>;
}

impl<E: KvEngine + ?Sized> KvEngine for std::sync::Arc<E> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).set(key, value)
    }

    fn rpush(&self, key: &str, member: &str) -> Result<u64> {
        (**self).rpush(key, member)
    }

    fn lrange(&self, key: &str, start: i64, end: i64) -> Result<Vec<String>> {
        (**self).lrange(key, start, end)
    }

    fn llen(&self, key: &str) -> Result<u64> {
        (**self).llen(key)
    }

    fn watch(&self, keys: &[String]) -> Result<Watch> {
        (**self).watch(keys)
    }

    fn exec(&self, watch: Watch, batch: WriteBatch) -> Result<()> {
        (**self).exec(watch, batch)
    }
}
