//! # Pagelink Store
//!
//! Storage abstraction for in-flight paging sessions. Provides a trait-based
//! interface for session package persistence with SQLite and in-memory
//! implementations.
//!
//! ## Key Types
//!
//! - [`PageStore`] - The async trait for all storage operations
//! - [`StoredPackage`] - Package kinds the store can hold, one collection each
//! - [`SqlitePageStore`] - Durable, transactional storage
//! - [`MemoryPageStore`] - Volatile storage backed by concurrent maps
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pagelink_core::{ReceiverAssemblyPackage, SessionId};
//! use pagelink_store::{PageStore, SqlitePageStore};
//!
//! async fn example() {
//!     let store = SqlitePageStore::open("pages.db").unwrap();
//!
//!     let mut tx = store.begin().await.unwrap();
//!     store
//!         .put(&mut tx, SessionId::new(0), ReceiverAssemblyPackage::new(1024))
//!         .await
//!         .unwrap();
//!     store.commit(tx).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Staged writes**: the SQLite store applies a transaction's writes only on
//!   commit; dropping the transaction discards them
//! - **Per-key atomicity**: the memory store applies every call immediately
//! - **Separate key spaces**: requested and receiving packages never collide

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryPageStore, MemoryTransaction};
pub use sqlite::{SqlitePageStore, SqliteTransaction};
pub use traits::{Collection, PageStore, StoredPackage};

/// Current wall-clock time in Unix milliseconds, for row bookkeeping.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
