//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use pagelink::{DataPageManager, PagingConfig, PagingHelper};
use pagelink_core::ServiceAddress;
use pagelink_rpc::MemoryNetwork;
use pagelink_store::{MemoryPageStore, PageStore, SqlitePageStore};

/// Install a test-friendly tracing subscriber, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A numbered payload with an opaque body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPayload {
    pub payload_num: u32,
    pub body: Bytes,
}

impl TestPayload {
    /// A payload whose body is `len` pseudo-random bytes seeded by `payload_num`.
    pub fn new(payload_num: u32, len: usize) -> Self {
        let mut body = vec![0u8; len];
        StdRng::seed_from_u64(u64::from(payload_num)).fill_bytes(&mut body);
        Self {
            payload_num,
            body: Bytes::from(body),
        }
    }
}

/// Two paging endpoints on one in-process network.
///
/// The `sender` side pushes to, and pulls from, the `receiver` side. Each
/// manager is registered under its own address and stamps it into the pull
/// sessions it prepares.
pub struct PagingFixture<S: PageStore> {
    pub network: MemoryNetwork,
    pub sender: Arc<DataPageManager<S>>,
    pub receiver: Arc<DataPageManager<S>>,
    pub sender_address: ServiceAddress,
    pub receiver_address: ServiceAddress,
    /// Calling side, sharing the fixture's network.
    pub helper: PagingHelper<MemoryNetwork>,
}

impl<S: PageStore> PagingFixture<S> {
    /// Wire two managers over a fresh network.
    pub async fn new(sender_store: S, receiver_store: S, page_size: usize) -> Self {
        let network = MemoryNetwork::new();
        let sender_address = ServiceAddress::new("mem:/pagelink/sender");
        let receiver_address = ServiceAddress::new("mem:/pagelink/receiver");

        let sender = Arc::new(
            DataPageManager::new(sender_store, config(page_size, &sender_address))
                .expect("valid fixture config"),
        );
        let receiver = Arc::new(
            DataPageManager::new(receiver_store, config(page_size, &receiver_address))
                .expect("valid fixture config"),
        );

        network.register(sender_address.clone(), Arc::clone(&sender)).await;
        network.register(receiver_address.clone(), Arc::clone(&receiver)).await;

        let helper = PagingHelper::new(
            network.clone(),
            PagingConfig::default().with_page_size(page_size),
        )
        .expect("valid fixture config");

        Self {
            network,
            sender,
            receiver,
            sender_address,
            receiver_address,
            helper,
        }
    }
}

impl PagingFixture<MemoryPageStore> {
    /// Endpoints backed by the volatile store.
    pub async fn memory(page_size: usize) -> Self {
        Self::new(MemoryPageStore::new(), MemoryPageStore::new(), page_size).await
    }
}

impl PagingFixture<SqlitePageStore> {
    /// Endpoints backed by SQLite files inside `dir`.
    pub async fn sqlite(dir: &Path, page_size: usize) -> Self {
        let sender = SqlitePageStore::open(dir.join("sender.db")).expect("open sender store");
        let receiver = SqlitePageStore::open(dir.join("receiver.db")).expect("open receiver store");
        Self::new(sender, receiver, page_size).await
    }
}

fn config(page_size: usize, address: &ServiceAddress) -> PagingConfig {
    PagingConfig::default()
        .with_page_size(page_size)
        .with_origin_address(address.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_deterministic() {
        let a = TestPayload::new(5, 256);
        let b = TestPayload::new(5, 256);
        let c = TestPayload::new(6, 256);

        assert_eq!(a, b);
        assert_ne!(a.body, c.body);
        assert_eq!(a.body.len(), 256);
    }

    #[tokio::test]
    async fn test_fixture_round_trip() {
        let fixture = PagingFixture::memory(128).await;
        let payload = TestPayload::new(1, 1000);

        let id = fixture
            .helper
            .send_data_paged(&payload, &fixture.receiver_address)
            .await
            .unwrap();
        let back: TestPayload = fixture.receiver.take_data_as(id).await.unwrap();
        assert_eq!(back, payload);
    }

    #[tokio::test]
    async fn test_sqlite_fixture_uses_files() {
        let dir = tempfile::tempdir().unwrap();
        let _fixture = PagingFixture::sqlite(dir.path(), 128).await;

        assert!(dir.path().join("sender.db").exists());
        assert!(dir.path().join("receiver.db").exists());
    }
}
