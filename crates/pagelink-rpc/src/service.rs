//! Service contracts for the two paging protocols.
//!
//! A serving endpoint implements both [`DataPageReceiver`] (push) and
//! [`DataPageSender`] (pull). Callers reach a remote endpoint through a
//! [`ProxyFactory`], which hands out proxies implementing the same traits.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use pagelink_core::{ServiceAddress, SessionId};

use crate::error::Result;
use crate::messages::{PageResponse, PagingRequest, PagingResponse};

/// Push-mode endpoint: accepts a payload page by page.
///
/// Pages carry no sequence number; the receiver writes each one at its
/// running offset. A transport must therefore deliver the pages of one
/// session in order and exactly once. Callers await each
/// [`send_data_page`](Self::send_data_page) before issuing the next.
#[async_trait]
pub trait DataPageReceiver: Send + Sync {
    /// Open a receiving session for a payload of `origin_len` bytes.
    async fn begin_paging_data(&self, origin_len: u64) -> Result<SessionId>;

    /// Append the next page to a receiving session.
    async fn send_data_page(&self, session_id: SessionId, page: Bytes) -> Result<()>;
}

/// Pull-mode endpoint: serves pages of a prepared payload on demand.
#[async_trait]
pub trait DataPageSender: Send + Sync {
    /// Fetch one page. Unknown sessions and out-of-range pages are
    /// reported as `success == false`, not as errors.
    async fn get_page(&self, session_id: SessionId, page_num: u32) -> Result<PageResponse>;

    /// Release a requested session. Unknown sessions are ignored.
    async fn notify_paging_complete(&self, session_id: SessionId) -> Result<()>;
}

/// Creates proxies for remote paging endpoints.
pub trait ProxyFactory: Send + Sync {
    fn create_receiver(&self, address: &ServiceAddress) -> Result<Arc<dyn DataPageReceiver>>;

    fn create_sender(&self, address: &ServiceAddress) -> Result<Arc<dyn DataPageSender>>;
}

/// Serve one request against a local endpoint.
///
/// Errors are folded into [`PagingResponse::Error`] so they can cross the
/// wire.
pub async fn dispatch<H>(handler: &H, request: PagingRequest) -> PagingResponse
where
    H: DataPageReceiver + DataPageSender + ?Sized,
{
    let result = match request {
        PagingRequest::BeginPagingData { origin_len } => handler
            .begin_paging_data(origin_len)
            .await
            .map(|session_id| PagingResponse::SessionStarted { session_id }),
        PagingRequest::SendDataPage { session_id, page } => handler
            .send_data_page(session_id, page)
            .await
            .map(|()| PagingResponse::Ack),
        PagingRequest::GetPage {
            session_id,
            page_num,
        } => handler
            .get_page(session_id, page_num)
            .await
            .map(PagingResponse::Page),
        PagingRequest::NotifyPagingComplete { session_id } => handler
            .notify_paging_complete(session_id)
            .await
            .map(|()| PagingResponse::Ack),
    };

    result.unwrap_or_else(|e| PagingResponse::from_error(&e))
}
