//! Error types for the object cache
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the object cache.
///
/// Most facade operations are fail-safe: storage and decoding errors degrade
/// to a `false` result or a cache miss. Only `Configuration` (at construction)
/// and `Internal` (bookkeeping defects) reach the caller as `Err`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid static configuration (unknown hash algorithm, bad paths)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A directory or file operation failed
    #[error("Storage error at {path}: {source}")]
    Storage {
        /// The path that caused the error
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// A value could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A persisted entry failed envelope validation
    #[error("Corrupt entry: {reason}")]
    Corrupt {
        /// Description of the validation failure
        reason: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    // == Storage Helper ==
    /// Wraps an I/O error together with the path it occurred on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Storage {
            path: path.into(),
            source,
        }
    }

    // == Corrupt Helper ==
    /// Builds a `Corrupt` error from any displayable reason.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        CacheError::Corrupt {
            reason: reason.into(),
        }
    }

    /// Returns true for errors that indicate a logic defect rather than an
    /// environment problem.
    pub fn is_internal(&self) -> bool {
        matches!(self, CacheError::Internal(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the object cache.
pub type Result<T> = std::result::Result<T, CacheError>;
