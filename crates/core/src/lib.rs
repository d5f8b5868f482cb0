//! Core types and traits for sidx
//!
//! This crate defines the foundational types used throughout the system:
//! - Record: the stored entity and its JSON codec
//! - Namespace / RecordKeys: index key derivation
//! - Context: cancellation and deadlines
//! - Error: Error type hierarchy
//! - Traits: the KvEngine seam (watch + atomic batch)

#![warn(clippy::all)]

pub mod context;
pub mod error;
pub mod keys;
pub mod record;
pub mod traits;

pub use context::Context;
pub use error::{Error, ErrorKind, Result};
pub use keys::{Namespace, RecordKeys};
pub use record::{decode, decode_batch, encode, Record};
pub use traits::{KvEngine, Watch, WriteBatch, WriteOp};
