//! Calling side of both paging protocols.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use pagelink_core::{
    CborSerializer, PayloadSerializer, RequestedSession, SenderChunkPackage, ServiceAddress,
    SessionId,
};
use pagelink_rpc::{DataPageReceiver, DataPageSender, ProxyFactory};

use crate::config::PagingConfig;
use crate::error::{PagingError, Result};
use crate::session::PagingRequestSession;

/// Sends payloads to remote receivers and collects payloads from remote
/// senders, resolving endpoints through a [`ProxyFactory`].
pub struct PagingHelper<F: ProxyFactory, Z: PayloadSerializer + Clone = CborSerializer> {
    factory: F,
    serializer: Z,
    config: PagingConfig,
}

impl<F: ProxyFactory> PagingHelper<F> {
    pub fn new(factory: F, config: PagingConfig) -> Result<Self> {
        Self::with_serializer(factory, CborSerializer, config)
    }
}

impl<F: ProxyFactory, Z: PayloadSerializer + Clone> PagingHelper<F, Z> {
    pub fn with_serializer(factory: F, serializer: Z, config: PagingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            factory,
            serializer,
            config,
        })
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Push `payload` to the receiver at `address`.
    ///
    /// Returns the session id the receiver assigned; the receiver's owner
    /// uses it to read the payload.
    pub async fn send_data_paged<T>(
        &self,
        payload: &T,
        address: &ServiceAddress,
    ) -> Result<SessionId>
    where
        T: Serialize + Sync + ?Sized,
    {
        let receiver = self.factory.create_receiver(address)?;
        self.send_data_paged_to(payload, receiver.as_ref()).await
    }

    /// Push `payload` to `receiver`, one awaited page at a time.
    pub async fn send_data_paged_to<T>(
        &self,
        payload: &T,
        receiver: &dyn DataPageReceiver,
    ) -> Result<SessionId>
    where
        T: Serialize + Sync + ?Sized,
    {
        let mut package =
            SenderChunkPackage::from_payload(&self.serializer, payload, self.config.page_size)?;
        let id = receiver
            .begin_paging_data(package.total_length() as u64)
            .await?;

        let mut pages = 0usize;
        while let Some(page) = package.get_next_page() {
            receiver.send_data_page(id, page).await?;
            pages += 1;
        }

        tracing::debug!(session = %id, pages, len = package.total_length(), "payload pushed");
        Ok(id)
    }

    /// Pull the payload described by `session` from its origin address.
    pub async fn get_paged_results<T: DeserializeOwned>(
        &self,
        session: &RequestedSession,
    ) -> Result<T> {
        let address = session
            .origin_address
            .as_ref()
            .ok_or(PagingError::MissingOriginAddress(session.session_id))?;
        let sender = self.factory.create_sender(address)?;

        self.get_paged_results_from(session.clone(), sender.as_ref(), CancellationToken::new())
            .await
    }

    /// Pull the payload described by `session` from `sender`.
    pub async fn get_paged_results_from<T: DeserializeOwned>(
        &self,
        session: RequestedSession,
        sender: &dyn DataPageSender,
        cancel: CancellationToken,
    ) -> Result<T> {
        PagingRequestSession::with_serializer(sender, session, self.serializer.clone())
            .with_max_payload_len(self.config.max_payload_len)
            .execute(cancel)
            .await
    }
}
