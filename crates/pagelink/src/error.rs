//! Error types for paged transfers.

use pagelink_core::{CoreError, SessionId};
use pagelink_rpc::{RpcError, RpcErrorCode};
use pagelink_store::StoreError;
use thiserror::Error;

/// Errors that can occur during paging operations.
#[derive(Debug, Error)]
pub enum PagingError {
    /// The session is unknown or already finalized.
    #[error("invalid session: {0}")]
    InvalidSession(SessionId),

    /// Core primitive error (id exhaustion, chunk size, payload codec).
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Remote call failed.
    #[error("rpc error: {0}")]
    Rpc(RpcError),

    /// The transfer was cancelled by the caller.
    #[error("paging cancelled")]
    Cancelled,

    /// Configuration rejected at construction.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A pull-mode session descriptor carries no address to fetch from.
    #[error("requested session {0} has no origin address")]
    MissingOriginAddress(SessionId),

    /// The announced payload length exceeds the configured bound.
    #[error("payload of {0} bytes is too large")]
    PayloadTooLarge(u64),
}

impl From<RpcError> for PagingError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::InvalidSession(id) => PagingError::InvalidSession(id),
            other => PagingError::Rpc(other),
        }
    }
}

impl From<PagingError> for RpcError {
    fn from(e: PagingError) -> Self {
        let code = match e {
            PagingError::InvalidSession(id) => return RpcError::InvalidSession(id),
            PagingError::Rpc(inner) => return inner,
            PagingError::Core(CoreError::SessionIdsExhausted(_)) => {
                RpcErrorCode::SessionIdsExhausted
            }
            PagingError::Core(CoreError::DecodingError(_)) | PagingError::PayloadTooLarge(_) => {
                RpcErrorCode::InvalidMessage
            }
            _ => RpcErrorCode::InternalError,
        };

        RpcError::Remote {
            code,
            message: e.to_string(),
        }
    }
}

/// Result type for paging operations.
pub type Result<T> = std::result::Result<T, PagingError>;
