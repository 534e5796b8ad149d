//! PageStore trait: the abstract interface for session package persistence.
//!
//! The orchestrator is storage-agnostic. Implementations include SQLite
//! (durable) and an in-memory concurrent map (volatile).

use std::fmt;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use pagelink_core::{ReceiverAssemblyPackage, SenderChunkPackage, SessionId};

use crate::error::Result;
use crate::memory::MemoryPageStore;

/// The keyed collection a package kind lives in.
///
/// Each kind gets its own key space, so the same [`SessionId`] can name a
/// requested session and an unrelated receiving session at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    /// Sender packages staged for pull-mode fetches.
    Requested,
    /// Receiver packages being filled by push-mode chunks.
    Receiving,
}

impl Collection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Requested => "requested",
            Collection::Receiving => "receiving",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A package type that can be kept in a [`PageStore`].
///
/// The collection is resolved at compile time from the type; there is no
/// runtime type inspection anywhere in the store.
pub trait StoredPackage: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection this package kind is stored in.
    const COLLECTION: Collection;

    /// The in-memory map holding this package kind.
    #[doc(hidden)]
    fn memory_map(store: &MemoryPageStore) -> &DashMap<SessionId, Self>;
}

impl StoredPackage for SenderChunkPackage {
    const COLLECTION: Collection = Collection::Requested;

    fn memory_map(store: &MemoryPageStore) -> &DashMap<SessionId, Self> {
        &store.requested
    }
}

impl StoredPackage for ReceiverAssemblyPackage {
    const COLLECTION: Collection = Collection::Receiving;

    fn memory_map(store: &MemoryPageStore) -> &DashMap<SessionId, Self> {
        &store.receiving
    }
}

/// The PageStore trait: async, transaction-scoped keyed package storage.
///
/// Every operation takes a transaction obtained from [`begin`](Self::begin);
/// changes become durable only through [`commit`](Self::commit).
///
/// # Design Notes
///
/// - **Durable backends** stage writes in the transaction. A transaction
///   dropped without commit leaves nothing visible and performs no other
///   rollback; callers own the begin/commit discipline.
/// - **Volatile backends** accept the transaction and ignore it: every call is
///   immediately visible and atomic per key.
/// - **Isolation** across transactions touching the same key is not defined
///   beyond last-writer-wins.
#[async_trait]
pub trait PageStore: Send + Sync + 'static {
    /// Transaction token scoping a group of operations.
    type Transaction: Send + Sync;

    /// Open a new transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Make a transaction's writes visible.
    async fn commit(&self, tx: Self::Transaction) -> Result<()>;

    /// Create or replace the package stored under `key`.
    async fn put<P: StoredPackage>(
        &self,
        tx: &mut Self::Transaction,
        key: SessionId,
        value: P,
    ) -> Result<()>;

    /// Get the package stored under `key`.
    async fn try_get<P: StoredPackage>(
        &self,
        tx: &mut Self::Transaction,
        key: SessionId,
    ) -> Result<Option<P>>;

    /// Check whether a package is stored under `key`.
    async fn contains_key<P: StoredPackage>(
        &self,
        tx: &mut Self::Transaction,
        key: SessionId,
    ) -> Result<bool>;

    /// Modify the package stored under `key` in place.
    ///
    /// Returns `None` without calling `f` when no package is stored. The
    /// memory backend mutates the live entry under its per-key lock; durable
    /// backends stage the modified package in `tx`.
    async fn update<P, F, R>(
        &self,
        tx: &mut Self::Transaction,
        key: SessionId,
        f: F,
    ) -> Result<Option<R>>
    where
        P: StoredPackage,
        F: FnOnce(&mut P) -> R + Send,
        R: Send;

    /// Remove and return the package stored under `key`.
    async fn try_remove<P: StoredPackage>(
        &self,
        tx: &mut Self::Transaction,
        key: SessionId,
    ) -> Result<Option<P>>;

    /// List the committed keys of one collection, ascending.
    ///
    /// Used to re-reserve session ids after a restart.
    async fn keys<P: StoredPackage>(&self) -> Result<Vec<SessionId>>;
}
