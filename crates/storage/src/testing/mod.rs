//! Testing utilities for the engine seam
//!
//! - **Fault injection**: wrap any engine and script conflicts or I/O
//!   failures on specific operations, counting every call
//!
//! # Example
//!
//! ```ignore
//! use sidx_storage::testing::{EngineOp, Fault, FaultyEngine};
//! use sidx_storage::MemoryEngine;
//!
//! let engine = FaultyEngine::new(MemoryEngine::new());
//! engine.fail_times(EngineOp::Exec, Fault::Conflict, 3);
//! // the next three exec calls report a conflict, the fourth goes through
//! ```

mod fault;

pub use fault::{EngineOp, Fault, FaultyEngine};
