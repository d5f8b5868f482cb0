//! Error types for sidx
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! "Key not found" is deliberately absent: the engine seam reports it as
//! `Option::None` and the store seam as an empty result.

use thiserror::Error;

/// Result type alias for sidx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the indexed store and the engines beneath it
#[derive(Debug, Error)]
pub enum Error {
    /// A watched key changed between `watch` and `exec`
    #[error("Watched key changed before commit: {key}")]
    Conflict {
        /// First fenced key found to have moved
        key: String,
    },

    /// Every attempt of an optimistic write hit a conflict
    #[error("Gave up after {attempts} conflicting attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: usize,
        /// The conflict seen on the final attempt
        last: Box<Error>,
    },

    /// Engine I/O failure (network, disk, poisoned state, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// A list operation hit a scalar key or vice versa
    #[error("Operation against a key holding the wrong kind of value: {key}")]
    WrongType {
        /// Offending key
        key: String,
    },

    /// Malformed payload during serialize/deserialize
    #[error("Codec error: {0}")]
    Codec(String),

    /// The caller's context was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// The caller's deadline passed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Caller supplied something unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`] for callers that only need to branch
/// on what went wrong, not on the details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transient optimistic-lock conflict
    Conflict,
    /// Conflict ceiling reached; the write did not happen
    ExhaustedRetries,
    /// Any other engine failure
    Infrastructure,
    /// Bad payload
    Codec,
    /// Cancelled or past deadline
    Cancelled,
    /// Bad caller input or configuration
    InvalidInput,
}

impl Error {
    /// Build a storage error from anything displayable
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Build an invalid-input error from anything displayable
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// True for the retryable optimistic-lock conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Conflict { .. } => ErrorKind::Conflict,
            Error::RetriesExhausted { .. } => ErrorKind::ExhaustedRetries,
            Error::Storage(_) | Error::WrongType { .. } => ErrorKind::Infrastructure,
            Error::Codec(_) => ErrorKind::Codec,
            Error::Cancelled | Error::DeadlineExceeded => ErrorKind::Cancelled,
            Error::InvalidInput(_) | Error::Config(_) => ErrorKind::InvalidInput,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Codec(e.to_string())
    }
}
