//! Error types for lindaspace
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SpaceError
pub type Result<T> = std::result::Result<T, SpaceError>;

/// Unified error type for lindaspace operations
#[derive(Debug, Error)]
pub enum SpaceError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    /// Empty tuple/pattern or an unusable element literal.
    /// Always raised before the store lock is taken.
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Error description returned by the server in an ERROR response
    #[error("Server error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Wait Termination
    // -------------------------------------------------------------------------
    /// A blocked `rd`/`in` was aborted through its cancel token
    #[error("Operation cancelled")]
    Cancelled,

    /// The tuple space has been shut down
    #[error("Tuple space closed")]
    Closed,
}

impl SpaceError {
    /// True for errors that end a blocked wait rather than reject a request
    pub fn is_wait_abort(&self) -> bool {
        matches!(self, SpaceError::Cancelled | SpaceError::Closed)
    }
}
