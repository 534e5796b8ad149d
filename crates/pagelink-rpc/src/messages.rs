//! Wire message types for the paging protocols.
//!
//! Every call is one [`PagingRequest`] answered by one [`PagingResponse`],
//! both CBOR encoded.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use pagelink_core::{from_cbor, to_cbor, SessionId};

use crate::error::{Result, RpcError};

/// A request to a paging endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagingRequest {
    /// Push: open a receiving session for a payload of `origin_len` bytes.
    BeginPagingData { origin_len: u64 },

    /// Push: append the next page to a receiving session.
    SendDataPage { session_id: SessionId, page: Bytes },

    /// Pull: fetch one page of a requested session.
    GetPage { session_id: SessionId, page_num: u32 },

    /// Pull: the consumer is done with a requested session.
    NotifyPagingComplete { session_id: SessionId },
}

impl PagingRequest {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(to_cbor(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(from_cbor(bytes)?)
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            PagingRequest::BeginPagingData { .. } => "begin_paging_data",
            PagingRequest::SendDataPage { .. } => "send_data_page",
            PagingRequest::GetPage { .. } => "get_page",
            PagingRequest::NotifyPagingComplete { .. } => "notify_paging_complete",
        }
    }
}

/// Result of a pull-mode page fetch.
///
/// `success == false` means the page index is past the end, or the session
/// is unknown. Consumers stop fetching on the first unsuccessful response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageResponse {
    pub success: bool,
    pub page: Bytes,
}

impl PageResponse {
    /// A served page.
    pub fn found(page: Bytes) -> Self {
        Self {
            success: true,
            page,
        }
    }

    /// No page at this index.
    pub fn missing() -> Self {
        Self::default()
    }
}

/// A response from a paging endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PagingResponse {
    /// A receiving session was opened.
    SessionStarted { session_id: SessionId },

    /// The call succeeded with nothing to return.
    Ack,

    /// A page fetch result.
    Page(PageResponse),

    /// The call failed.
    Error {
        /// Error code for programmatic handling.
        code: RpcErrorCode,
        /// Human-readable description.
        message: String,
        /// The session the error refers to, if any.
        session_id: Option<SessionId>,
    },
}

impl PagingResponse {
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(to_cbor(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(from_cbor(bytes)?)
    }

    /// Turn an error into its wire form.
    pub fn from_error(error: &RpcError) -> Self {
        let session_id = match error {
            RpcError::InvalidSession(id) => Some(*id),
            _ => None,
        };

        PagingResponse::Error {
            code: error.code(),
            message: error.to_string(),
            session_id,
        }
    }

    /// Turn a wire error back into an [`RpcError`]; other responses pass through.
    pub fn into_result(self) -> Result<Self> {
        match self {
            PagingResponse::Error {
                code: RpcErrorCode::InvalidSession,
                session_id: Some(id),
                ..
            } => Err(RpcError::InvalidSession(id)),
            PagingResponse::Error { code, message, .. } => Err(RpcError::Remote { code, message }),
            other => Ok(other),
        }
    }
}

/// Error codes for the paging protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum RpcErrorCode {
    /// Session is unknown or already finalized.
    InvalidSession = 1,
    /// Invalid message format.
    InvalidMessage = 2,
    /// No session ids left on the remote side.
    SessionIdsExhausted = 3,
    /// Internal error on the remote side.
    InternalError = 4,
}
