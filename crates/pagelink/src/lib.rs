//! # Pagelink
//!
//! Transfer payloads too large for one request/response call between remote
//! endpoints, by splitting them into fixed-size pages.
//!
//! ## Overview
//!
//! Two disciplines are supported:
//!
//! - **Push**: the sender opens a session on the receiver and sends every
//!   page in order. The receiver's owner reads the reassembled payload with
//!   [`DataPageManager::take_data_as`].
//! - **Pull**: the sender prepares the payload locally with
//!   [`DataPageManager::prepare_data_for_paging`] and hands the resulting
//!   [`RequestedSession`] to the consumer, which fetches pages by index and
//!   then notifies completion.
//!
//! Session records live in a [`PageStore`](store::PageStore): in memory, or
//! in SQLite when sessions must survive a restart.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use pagelink::rpc::MemoryNetwork;
//! use pagelink::store::MemoryPageStore;
//! use pagelink::{DataPageManager, PagingConfig, PagingHelper};
//!
//! async fn example() -> pagelink::Result<()> {
//!     let network = MemoryNetwork::new();
//!     let manager = Arc::new(DataPageManager::new(
//!         MemoryPageStore::new(),
//!         PagingConfig::default(),
//!     )?);
//!     network.register("mem:/ledger", Arc::clone(&manager)).await;
//!
//!     let helper = PagingHelper::new(network, PagingConfig::default())?;
//!     let orders: Vec<u64> = (0..1_000_000).collect();
//!     let id = helper.send_data_paged(&orders, &"mem:/ledger".into()).await?;
//!
//!     let received: Vec<u64> = manager.take_data_as(id).await?;
//!     assert_eq!(received, orders);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `pagelink::core` - Session ids, chunk packages, payload codec
//! - `pagelink::store` - Page store trait and backends
//! - `pagelink::rpc` - Endpoint contracts and the in-process network

pub mod config;
pub mod error;
pub mod helper;
pub mod manager;
pub mod session;

// Re-export component crates
pub use pagelink_core as core;
pub use pagelink_rpc as rpc;
pub use pagelink_store as store;

pub use config::{PagingConfig, DEFAULT_MAX_PAYLOAD_LEN};
pub use error::{PagingError, Result};
pub use helper::PagingHelper;
pub use manager::{ActiveSessions, DataPageManager};
pub use session::PagingRequestSession;

pub use pagelink_core::{RequestedSession, ServiceAddress, SessionId, DEFAULT_PAGE_SIZE};
