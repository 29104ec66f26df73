//! Error types for anomblocks.
//!
//! All fallible block operations return [`Result`], built on a single
//! `thiserror` enum. Every variant describes a usage or configuration mistake;
//! none of them is transient, so callers never retry.

use thiserror::Error;

/// The main error type for anomblocks operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnomError {
    /// A label (or other indexed value) outside its configured range
    #[error("Value out of range: {value} is not below {limit}")]
    OutOfRange {
        /// The rejected value
        value: usize,
        /// Exclusive upper bound
        limit: usize,
    },

    /// A block was computed before its required input was connected
    #[error("Block input not connected - call connect_input() before feedforward()")]
    NotConnected,

    /// Connected pattern widths do not match the configured width
    #[error("Dimension mismatch: expected {expected} bits, got {actual}")]
    DimensionMismatch {
        /// Width the block was configured for
        expected: usize,
        /// Width that was offered
        actual: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for anomblocks operations.
pub type Result<T> = std::result::Result<T, AnomError>;

impl From<serde_json::Error> for AnomError {
    fn from(e: serde_json::Error) -> Self {
        AnomError::Serialization(e.to_string())
    }
}
