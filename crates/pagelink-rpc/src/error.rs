//! Error types for the rpc module.

use thiserror::Error;

use pagelink_core::SessionId;

use crate::messages::RpcErrorCode;

/// Errors that can occur when calling or serving a paging endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The session is unknown to the remote side or already finalized.
    #[error("invalid session: {0}")]
    InvalidSession(SessionId),

    /// The remote side failed the call.
    #[error("remote error ({code:?}): {message}")]
    Remote { code: RpcErrorCode, message: String },

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Message encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] pagelink_core::CoreError),

    /// The remote side answered with the wrong kind of response.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl RpcError {
    /// Wire code for this error.
    pub fn code(&self) -> RpcErrorCode {
        match self {
            RpcError::InvalidSession(_) => RpcErrorCode::InvalidSession,
            RpcError::Remote { code, .. } => *code,
            RpcError::Codec(_) => RpcErrorCode::InvalidMessage,
            RpcError::Transport(_) | RpcError::UnexpectedResponse(_) => {
                RpcErrorCode::InternalError
            }
        }
    }
}

/// Result type for rpc operations.
pub type Result<T> = std::result::Result<T, RpcError>;
