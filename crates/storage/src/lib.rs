//! Storage layer for sidx
//!
//! This crate implements the transactional key-value engine the indexed
//! store runs on:
//! - MemoryEngine: FxHashMap behind a single RwLock, per-key versions
//!   drawn from a global AtomicU64, watch/exec with first-committer-wins
//! - testing: FaultyEngine wrapper that injects conflicts and I/O failures

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod testing;

pub use memory::MemoryEngine;
