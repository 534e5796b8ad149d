//! Consumer side of a pull-mode transfer.

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use pagelink_core::{
    CborSerializer, PayloadSerializer, ReceiverAssemblyPackage, RequestedSession,
};
use pagelink_rpc::DataPageSender;

use crate::config::DEFAULT_MAX_PAYLOAD_LEN;
use crate::error::{PagingError, Result};

/// Fetches every page of a requested session from its sender, then tells
/// the sender the session is complete.
///
/// Pages are requested by index from `0` until the sender answers
/// `success == false`. The pages are written into a buffer sized from the
/// session descriptor; surplus bytes are dropped and missing bytes stay
/// zeroed, so a short transfer shows up only as a deserialization failure.
/// Descriptors announcing more than the session's maximum payload length are
/// refused before any buffer is allocated or page fetched.
pub struct PagingRequestSession<'a, Z: PayloadSerializer = CborSerializer> {
    sender: &'a dyn DataPageSender,
    session: RequestedSession,
    serializer: Z,
    max_payload_len: u64,
}

impl<'a> PagingRequestSession<'a> {
    pub fn new(sender: &'a dyn DataPageSender, session: RequestedSession) -> Self {
        Self::with_serializer(sender, session, CborSerializer)
    }
}

impl<'a, Z: PayloadSerializer> PagingRequestSession<'a, Z> {
    pub fn with_serializer(
        sender: &'a dyn DataPageSender,
        session: RequestedSession,
        serializer: Z,
    ) -> Self {
        Self {
            sender,
            session,
            serializer,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }

    pub fn with_max_payload_len(mut self, max_payload_len: u64) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    /// Run the transfer to completion.
    ///
    /// If `cancel` fires between fetches the transfer stops with
    /// [`PagingError::Cancelled`] and the sender is not notified; its session
    /// stays open until someone calls `notify_paging_complete` for it.
    pub async fn execute<T: DeserializeOwned>(&self, cancel: CancellationToken) -> Result<T> {
        let id = self.session.session_id;
        let announced = self.session.origin_data_len;
        if announced > self.max_payload_len {
            return Err(PagingError::PayloadTooLarge(announced));
        }
        let len = usize::try_from(announced).map_err(|_| PagingError::PayloadTooLarge(announced))?;

        let mut buffer = ReceiverAssemblyPackage::new(len);
        let mut page_num: u32 = 0;

        loop {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(session = %id, page_num, "paging request cancelled");
                    return Err(PagingError::Cancelled);
                }
                response = self.sender.get_page(id, page_num) => response?,
            };

            if !response.success {
                break;
            }
            buffer.add_data(&response.page);
            page_num += 1;
        }

        tracing::debug!(
            session = %id,
            pages = page_num,
            received = buffer.position(),
            expected = len,
            "all pages fetched"
        );

        self.sender.notify_paging_complete(id).await?;
        Ok(self.serializer.deserialize(buffer.data())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use pagelink_core::{SenderChunkPackage, SessionId};
    use pagelink_rpc::{PageResponse, RpcError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves one package and counts the calls it sees.
    struct FakeSender {
        package: SenderChunkPackage,
        fetches: AtomicUsize,
        notifies: AtomicUsize,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl FakeSender {
        fn new(package: SenderChunkPackage) -> Self {
            Self {
                package,
                fetches: AtomicUsize::new(0),
                notifies: AtomicUsize::new(0),
                cancel_after: None,
            }
        }
    }

    #[async_trait]
    impl DataPageSender for FakeSender {
        async fn get_page(
            &self,
            _id: SessionId,
            page_num: u32,
        ) -> pagelink_rpc::Result<PageResponse> {
            let fetched = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, token)) = &self.cancel_after {
                if fetched >= *limit {
                    token.cancel();
                }
            }
            Ok(self
                .package
                .get_data_at_page(page_num as usize)
                .map(PageResponse::found)
                .unwrap_or_else(PageResponse::missing))
        }

        async fn notify_paging_complete(&self, _id: SessionId) -> pagelink_rpc::Result<()> {
            self.notifies.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn descriptor(package: &SenderChunkPackage) -> RequestedSession {
        RequestedSession {
            session_id: SessionId::new(7),
            origin_data_len: package.total_length() as u64,
            origin_address: None,
        }
    }

    #[tokio::test]
    async fn test_fetches_all_pages_then_notifies() {
        let payload: Vec<i64> = (-500..500).collect();
        let package = SenderChunkPackage::from_payload(&CborSerializer, &payload, 64).unwrap();
        let pages = package.total_pages() + 1;
        let sender = FakeSender::new(package.clone());

        let session = PagingRequestSession::new(&sender, descriptor(&package));
        let back: Vec<i64> = session.execute(CancellationToken::new()).await.unwrap();

        assert_eq!(back, payload);
        // One extra fetch finds the end.
        assert_eq!(sender.fetches.load(Ordering::SeqCst), pages + 1);
        assert_eq!(sender.notifies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let package = SenderChunkPackage::new(vec![1u8; 100], 10).unwrap();
        let sender = FakeSender::new(package.clone());
        let token = CancellationToken::new();
        token.cancel();

        let session = PagingRequestSession::new(&sender, descriptor(&package));
        let result: Result<Vec<u8>> = session.execute(token).await;

        assert!(matches!(result, Err(PagingError::Cancelled)));
        assert_eq!(sender.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(sender.notifies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_midway_does_not_notify() {
        let package = SenderChunkPackage::new(vec![1u8; 100], 10).unwrap();
        let token = CancellationToken::new();
        let mut sender = FakeSender::new(package.clone());
        sender.cancel_after = Some((3, token.clone()));

        let session = PagingRequestSession::new(&sender, descriptor(&package));
        let result: Result<Vec<u8>> = session.execute(token).await;

        assert!(matches!(result, Err(PagingError::Cancelled)));
        assert_eq!(sender.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(sender.notifies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversupplied_pages_are_clipped() {
        let payload = vec![9u32; 40];
        let package = SenderChunkPackage::from_payload(&CborSerializer, &payload, 16).unwrap();
        let sender = FakeSender::new(package.clone());

        // Descriptor claims fewer bytes than the sender serves.
        let mut short = descriptor(&package);
        short.origin_data_len -= 5;

        let session = PagingRequestSession::new(&sender, short);
        let result: Result<Vec<u32>> = session.execute(CancellationToken::new()).await;
        assert!(matches!(result, Err(PagingError::Core(_))));
        assert_eq!(sender.notifies.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_oversized_descriptor_refused() {
        let package = SenderChunkPackage::new(vec![1u8; 100], 10).unwrap();
        let sender = FakeSender::new(package.clone());

        let mut huge = descriptor(&package);
        huge.origin_data_len = u64::MAX;
        let result: Result<Vec<u8>> = PagingRequestSession::new(&sender, huge)
            .execute(CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PagingError::PayloadTooLarge(u64::MAX))));

        let result: Result<Vec<u8>> = PagingRequestSession::new(&sender, descriptor(&package))
            .with_max_payload_len(50)
            .execute(CancellationToken::new())
            .await;
        assert!(matches!(result, Err(PagingError::PayloadTooLarge(_))));

        assert_eq!(sender.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(sender.notifies.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sender_error_propagates() {
        struct Broken;

        #[async_trait]
        impl DataPageSender for Broken {
            async fn get_page(
                &self,
                id: SessionId,
                _page_num: u32,
            ) -> pagelink_rpc::Result<PageResponse> {
                Err(RpcError::InvalidSession(id))
            }

            async fn notify_paging_complete(&self, _id: SessionId) -> pagelink_rpc::Result<()> {
                Ok(())
            }
        }

        let session = PagingRequestSession::new(
            &Broken,
            RequestedSession {
                session_id: SessionId::new(1),
                origin_data_len: 4,
                origin_address: None,
            },
        );
        let result: Result<Bytes> = session.execute(CancellationToken::new()).await;
        assert!(matches!(result, Err(PagingError::InvalidSession(_))));
    }
}
