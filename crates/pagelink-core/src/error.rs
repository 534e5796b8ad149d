//! Error types for pagelink core.

use thiserror::Error;

/// Errors raised by core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Every id in the pool is held by a live session.
    #[error("session id pool exhausted: all {0} ids are in use")]
    SessionIdsExhausted(usize),

    #[error("invalid chunk size: {0} (must be greater than zero)")]
    InvalidChunkSize(usize),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
