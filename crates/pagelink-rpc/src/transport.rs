//! In-process transport for paging endpoints.
//!
//! Endpoints register under a [`ServiceAddress`]. Each endpoint is served by
//! a tokio task reading request envelopes from a channel. Requests and
//! responses travel as CBOR bytes, so every call goes through the same
//! encoding a network transport would.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, RwLock};

use pagelink_core::{ServiceAddress, SessionId};

use crate::error::{Result, RpcError};
use crate::messages::{PageResponse, PagingRequest, PagingResponse};
use crate::service::{dispatch, DataPageReceiver, DataPageSender, ProxyFactory};

/// Configuration for the in-process network.
#[derive(Debug, Clone)]
pub struct MemoryNetworkConfig {
    /// Queued requests per endpoint before callers wait.
    pub channel_capacity: usize,
}

impl Default for MemoryNetworkConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

impl MemoryNetworkConfig {
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

/// One encoded request and the slot its encoded response goes to.
struct Envelope {
    request: Vec<u8>,
    reply: oneshot::Sender<Vec<u8>>,
}

struct NetworkInner {
    config: MemoryNetworkConfig,
    endpoints: RwLock<HashMap<ServiceAddress, mpsc::Sender<Envelope>>>,
}

/// Shared registry of in-process endpoints.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone)]
pub struct MemoryNetwork {
    inner: Arc<NetworkInner>,
}

impl MemoryNetwork {
    /// Create a new memory network.
    pub fn new() -> Self {
        Self::with_config(MemoryNetworkConfig::default())
    }

    pub fn with_config(config: MemoryNetworkConfig) -> Self {
        Self {
            inner: Arc::new(NetworkInner {
                config,
                endpoints: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Serve `handler` at `address`.
    ///
    /// Replaces any endpoint already registered there; the old serving task
    /// drains its queue and exits.
    pub async fn register<H>(&self, address: impl Into<ServiceAddress>, handler: Arc<H>)
    where
        H: DataPageReceiver + DataPageSender + 'static,
    {
        let address = address.into();
        let capacity = self.inner.config.channel_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        tokio::spawn(serve(address.clone(), handler, rx));
        self.inner.endpoints.write().await.insert(address.clone(), tx);

        tracing::debug!(%address, "endpoint registered");
    }

    /// Stop routing calls to `address`. Returns whether it was registered.
    pub async fn unregister(&self, address: &ServiceAddress) -> bool {
        let removed = self.inner.endpoints.write().await.remove(address).is_some();
        if removed {
            tracing::debug!(%address, "endpoint unregistered");
        }
        removed
    }

    pub async fn is_registered(&self, address: &ServiceAddress) -> bool {
        self.inner.endpoints.read().await.contains_key(address)
    }

    /// Send one request to `address` and wait for its response.
    async fn call(
        &self,
        address: &ServiceAddress,
        request: PagingRequest,
    ) -> Result<PagingResponse> {
        let sender = self
            .inner
            .endpoints
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| RpcError::Transport(format!("no endpoint at {}", address)))?;

        let (reply, response) = oneshot::channel();
        let envelope = Envelope {
            request: request.encode()?,
            reply,
        };

        sender
            .send(envelope)
            .await
            .map_err(|_| RpcError::Transport(format!("endpoint {} disconnected", address)))?;

        let bytes = response
            .await
            .map_err(|_| RpcError::Transport(format!("endpoint {} dropped the call", address)))?;

        PagingResponse::decode(&bytes)?.into_result()
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNetwork")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ProxyFactory for MemoryNetwork {
    fn create_receiver(&self, address: &ServiceAddress) -> Result<Arc<dyn DataPageReceiver>> {
        Ok(Arc::new(MemoryProxy::new(self.clone(), address.clone())))
    }

    fn create_sender(&self, address: &ServiceAddress) -> Result<Arc<dyn DataPageSender>> {
        Ok(Arc::new(MemoryProxy::new(self.clone(), address.clone())))
    }
}

/// Serving loop for one endpoint. Each request runs in its own task.
async fn serve<H>(address: ServiceAddress, handler: Arc<H>, mut rx: mpsc::Receiver<Envelope>)
where
    H: DataPageReceiver + DataPageSender + 'static,
{
    while let Some(envelope) = rx.recv().await {
        let handler = Arc::clone(&handler);
        let address = address.clone();

        tokio::spawn(async move {
            let response = match PagingRequest::decode(&envelope.request) {
                Ok(request) => {
                    let kind = request.kind();
                    let response = dispatch(handler.as_ref(), request).await;
                    if let PagingResponse::Error { code, message, .. } = &response {
                        tracing::warn!(%address, kind, ?code, %message, "paging request failed");
                    }
                    response
                }
                Err(e) => {
                    tracing::warn!(%address, error = %e, "undecodable paging request");
                    PagingResponse::from_error(&e)
                }
            };

            match response.encode() {
                Ok(bytes) => {
                    // Caller may have given up; nothing to do then.
                    let _ = envelope.reply.send(bytes);
                }
                Err(e) => tracing::warn!(%address, error = %e, "failed to encode response"),
            }
        });
    }

    tracing::debug!(%address, "endpoint serving loop stopped");
}

/// Client-side proxy for an endpoint on a [`MemoryNetwork`].
#[derive(Debug, Clone)]
pub struct MemoryProxy {
    network: MemoryNetwork,
    address: ServiceAddress,
}

impl MemoryProxy {
    pub fn new(network: MemoryNetwork, address: ServiceAddress) -> Self {
        Self { network, address }
    }

    async fn call(&self, request: PagingRequest) -> Result<PagingResponse> {
        self.network.call(&self.address, request).await
    }
}

fn unexpected(expected: &str, got: PagingResponse) -> RpcError {
    RpcError::UnexpectedResponse(format!("expected {}, got {:?}", expected, got))
}

#[async_trait]
impl DataPageReceiver for MemoryProxy {
    async fn begin_paging_data(&self, origin_len: u64) -> Result<SessionId> {
        match self.call(PagingRequest::BeginPagingData { origin_len }).await? {
            PagingResponse::SessionStarted { session_id } => Ok(session_id),
            other => Err(unexpected("SessionStarted", other)),
        }
    }

    async fn send_data_page(&self, session_id: SessionId, page: Bytes) -> Result<()> {
        match self
            .call(PagingRequest::SendDataPage { session_id, page })
            .await?
        {
            PagingResponse::Ack => Ok(()),
            other => Err(unexpected("Ack", other)),
        }
    }
}

#[async_trait]
impl DataPageSender for MemoryProxy {
    async fn get_page(&self, session_id: SessionId, page_num: u32) -> Result<PageResponse> {
        match self
            .call(PagingRequest::GetPage {
                session_id,
                page_num,
            })
            .await?
        {
            PagingResponse::Page(page) => Ok(page),
            other => Err(unexpected("Page", other)),
        }
    }

    async fn notify_paging_complete(&self, session_id: SessionId) -> Result<()> {
        match self
            .call(PagingRequest::NotifyPagingComplete { session_id })
            .await?
        {
            PagingResponse::Ack => Ok(()),
            other => Err(unexpected("Ack", other)),
        }
    }
}
