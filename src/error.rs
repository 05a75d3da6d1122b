//! Error types for blockio
//!
//! Provides a unified error type for all store operations.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for blockio operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Failure reported by the underlying medium or by a block listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    /// Illegal size, position, count or configuration value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Buffer, block or offset bounds violated
    #[error("Out of range: {0}")]
    OutOfRange(String),

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    /// Operation attempted on a store after `close()`
    #[error("Store is closed")]
    Closed,
}

impl StoreError {
    /// Shorthand for an `InvalidArgument` error
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidArgument(msg.into())
    }

    /// Shorthand for an `OutOfRange` error
    pub(crate) fn out_of_range(msg: impl Into<String>) -> Self {
        StoreError::OutOfRange(msg.into())
    }

    /// Shorthand for an `Io` error of the given kind
    pub(crate) fn io(kind: std::io::ErrorKind, msg: impl Into<String>) -> Self {
        StoreError::Io(std::io::Error::new(kind, msg.into()))
    }
}
