//! The serving side of both paging protocols.
//!
//! A [`DataPageManager`] owns the session records of one endpoint: receiving
//! sessions filled by push-mode senders, and requested sessions prepared for
//! pull-mode consumers. Each kind draws ids from its own allocator, so the
//! same [`SessionId`] may name one session of each kind at once.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use pagelink_core::{
    CborSerializer, PayloadSerializer, ReceiverAssemblyPackage, RequestedSession,
    SenderChunkPackage, SessionId, SessionIdAllocator,
};
use pagelink_rpc::{DataPageReceiver, DataPageSender, PageResponse, RpcError};
use pagelink_store::PageStore;

use crate::config::PagingConfig;
use crate::error::{PagingError, Result};

/// Live session counts per pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveSessions {
    /// Push-mode sessions still receiving or awaiting the consumer.
    pub receiving: usize,
    /// Pull-mode sessions prepared and not yet completed.
    pub requested: usize,
}

impl ActiveSessions {
    pub fn total(&self) -> usize {
        self.receiving + self.requested
    }
}

/// Session manager for one paging endpoint.
///
/// Generic over the [`PageStore`] backend and the payload serializer.
pub struct DataPageManager<S: PageStore, Z: PayloadSerializer = CborSerializer> {
    store: Arc<S>,
    serializer: Z,
    config: PagingConfig,
    receiving_ids: SessionIdAllocator,
    requested_ids: SessionIdAllocator,
}

impl<S: PageStore> DataPageManager<S> {
    /// Create a manager that encodes payloads as CBOR.
    pub fn new(store: S, config: PagingConfig) -> Result<Self> {
        Self::with_serializer(store, CborSerializer, config)
    }
}

impl<S: PageStore, Z: PayloadSerializer> DataPageManager<S, Z> {
    pub fn with_serializer(store: S, serializer: Z, config: PagingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(store),
            serializer,
            config,
            receiving_ids: SessionIdAllocator::new(),
            requested_ids: SessionIdAllocator::new(),
        })
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    /// Reserve the ids of sessions already in the store.
    ///
    /// Call once after opening a durable store that may hold sessions from a
    /// previous run, before serving any request.
    pub async fn recover(&self) -> Result<ActiveSessions> {
        let receiving = self.store.keys::<ReceiverAssemblyPackage>().await?;
        let requested = self.store.keys::<SenderChunkPackage>().await?;

        for id in &receiving {
            self.receiving_ids.reserve(*id);
        }
        for id in &requested {
            self.requested_ids.reserve(*id);
        }

        let recovered = ActiveSessions {
            receiving: receiving.len(),
            requested: requested.len(),
        };
        tracing::info!(
            receiving = recovered.receiving,
            requested = recovered.requested,
            "recovered paging sessions"
        );
        Ok(recovered)
    }

    pub fn active_sessions(&self) -> ActiveSessions {
        ActiveSessions {
            receiving: self.receiving_ids.in_use(),
            requested: self.requested_ids.in_use(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Push: receiving sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a receiving session for a payload of `origin_len` bytes.
    pub async fn begin_paging_data(&self, origin_len: u64) -> Result<SessionId> {
        let len = self.config.checked_payload_len(origin_len)?;
        let id = self.receiving_ids.allocate()?;

        if let Err(e) = self.store_package(id, ReceiverAssemblyPackage::new(len)).await {
            self.receiving_ids.free(id);
            return Err(e);
        }

        tracing::info!(session = %id, origin_len, "receiving session opened");
        Ok(id)
    }

    /// Append the next page of a receiving session.
    pub async fn send_data_page(&self, id: SessionId, page: Bytes) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let (position, expected) = self
            .store
            .update(&mut tx, id, |package: &mut ReceiverAssemblyPackage| {
                package.add_data(&page);
                (package.position(), package.expected_len())
            })
            .await?
            .ok_or(PagingError::InvalidSession(id))?;
        self.store.commit(tx).await?;

        tracing::debug!(session = %id, len = page.len(), position, expected, "page received");
        Ok(())
    }

    /// Deserialize the assembled payload of a receiving session.
    ///
    /// The session stays open; finish it with
    /// [`end_paging_data`](Self::end_paging_data).
    pub async fn get_data_as<T: DeserializeOwned>(&self, id: SessionId) -> Result<T> {
        let mut tx = self.store.begin().await?;
        let package: ReceiverAssemblyPackage = self
            .store
            .try_get(&mut tx, id)
            .await?
            .ok_or(PagingError::InvalidSession(id))?;

        if package.remaining() > 0 {
            tracing::debug!(
                session = %id,
                missing = package.remaining(),
                "reading partially received payload"
            );
        }

        Ok(self.serializer.deserialize(package.data())?)
    }

    /// Remove a receiving session and release its id.
    pub async fn end_paging_data(&self, id: SessionId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let removed: Option<ReceiverAssemblyPackage> =
            self.store.try_remove(&mut tx, id).await?;
        if removed.is_none() {
            return Err(PagingError::InvalidSession(id));
        }
        self.store.commit(tx).await?;
        self.receiving_ids.free(id);

        tracing::info!(session = %id, "receiving session ended");
        Ok(())
    }

    /// Read the payload of a receiving session and end it.
    pub async fn take_data_as<T: DeserializeOwned>(&self, id: SessionId) -> Result<T> {
        let value = self.get_data_as(id).await?;
        self.end_paging_data(id).await?;
        Ok(value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pull: requested sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Serialize `payload` and keep it for consumers to fetch page by page.
    ///
    /// The returned descriptor is handed to the consumer out of band.
    pub async fn prepare_data_for_paging<T>(&self, payload: &T) -> Result<RequestedSession>
    where
        T: Serialize + Sync + ?Sized,
    {
        let package =
            SenderChunkPackage::from_payload(&self.serializer, payload, self.config.page_size)?;
        let origin_data_len = package.total_length() as u64;
        let id = self.requested_ids.allocate()?;

        if let Err(e) = self.store_package(id, package).await {
            self.requested_ids.free(id);
            return Err(e);
        }

        tracing::info!(session = %id, origin_data_len, "requested session prepared");
        Ok(RequestedSession {
            session_id: id,
            origin_data_len,
            origin_address: self.config.origin_address.clone(),
        })
    }

    /// Serve one page of a requested session.
    ///
    /// Unknown sessions and pages past the end answer `success == false`.
    pub async fn get_page(&self, id: SessionId, page_num: u32) -> Result<PageResponse> {
        let mut tx = self.store.begin().await?;
        let package: Option<SenderChunkPackage> = self.store.try_get(&mut tx, id).await?;

        let page = package.and_then(|p| p.get_data_at_page(page_num as usize));
        tracing::debug!(session = %id, page_num, found = page.is_some(), "page requested");

        Ok(page.map(PageResponse::found).unwrap_or_else(PageResponse::missing))
    }

    /// Remove a requested session and release its id.
    ///
    /// Unknown ids are ignored, so repeated notifications never free an id
    /// that has since been handed to a new session.
    pub async fn notify_paging_session_complete(&self, id: SessionId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let removed: Option<SenderChunkPackage> = self.store.try_remove(&mut tx, id).await?;

        match removed {
            Some(_) => {
                self.store.commit(tx).await?;
                self.requested_ids.free(id);
                tracing::info!(session = %id, "requested session completed");
            }
            None => tracing::debug!(session = %id, "completion for unknown session ignored"),
        }
        Ok(())
    }

    async fn store_package<P>(&self, id: SessionId, package: P) -> Result<()>
    where
        P: pagelink_store::StoredPackage,
    {
        let mut tx = self.store.begin().await?;
        self.store.put(&mut tx, id, package).await?;
        self.store.commit(tx).await?;
        Ok(())
    }
}

impl<S: PageStore, Z: PayloadSerializer> std::fmt::Debug for DataPageManager<S, Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataPageManager")
            .field("config", &self.config)
            .field("active", &self.active_sessions())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S, Z> DataPageReceiver for DataPageManager<S, Z>
where
    S: PageStore,
    Z: PayloadSerializer + 'static,
{
    async fn begin_paging_data(&self, origin_len: u64) -> pagelink_rpc::Result<SessionId> {
        Ok(DataPageManager::begin_paging_data(self, origin_len).await?)
    }

    async fn send_data_page(
        &self,
        session_id: SessionId,
        page: Bytes,
    ) -> pagelink_rpc::Result<()> {
        Ok(DataPageManager::send_data_page(self, session_id, page).await?)
    }
}

#[async_trait]
impl<S, Z> DataPageSender for DataPageManager<S, Z>
where
    S: PageStore,
    Z: PayloadSerializer + 'static,
{
    async fn get_page(
        &self,
        session_id: SessionId,
        page_num: u32,
    ) -> pagelink_rpc::Result<PageResponse> {
        DataPageManager::get_page(self, session_id, page_num)
            .await
            .map_err(RpcError::from)
    }

    async fn notify_paging_complete(&self, session_id: SessionId) -> pagelink_rpc::Result<()> {
        DataPageManager::notify_paging_session_complete(self, session_id)
            .await
            .map_err(RpcError::from)
    }
}
