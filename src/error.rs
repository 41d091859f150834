//! Error types for HuffKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for HuffKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// File open/read/write/mmap failures and corrupt on-disk data.
    /// Always carries the underlying OS error text.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Not found")]
    NotFound,

    // -------------------------------------------------------------------------
    // Misuse Errors
    // -------------------------------------------------------------------------
    /// Operating on a closed table, double open/close, oversized entries,
    /// duplicate keys while loading, and codec encode failures.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl KvError {
    /// Shorthand for building an `InvalidOperation`
    pub fn invalid(msg: impl Into<String>) -> Self {
        KvError::InvalidOperation(msg.into())
    }

    /// Shorthand for an `Io` error describing corrupt on-disk data
    pub fn corruption(msg: impl Into<String>) -> Self {
        KvError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            msg.into(),
        ))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound)
    }

    pub fn is_io_error(&self) -> bool {
        matches!(self, KvError::Io(_))
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, KvError::InvalidOperation(_))
    }
}
