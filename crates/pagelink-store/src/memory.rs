//! In-memory implementation of the PageStore trait.
//!
//! Volatile: everything is lost when the store is dropped. Each collection is
//! a concurrent keyed map, so operations are atomic per key and immediately
//! visible. Transactions exist only to satisfy the shared contract.

use async_trait::async_trait;
use dashmap::DashMap;

use pagelink_core::{ReceiverAssemblyPackage, SenderChunkPackage, SessionId};

use crate::error::Result;
use crate::traits::{PageStore, StoredPackage};

/// In-memory page store.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    /// Sender packages awaiting pull-mode fetches.
    pub(crate) requested: DashMap<SessionId, SenderChunkPackage>,

    /// Receiver packages being filled by push-mode chunks.
    pub(crate) receiving: DashMap<SessionId, ReceiverAssemblyPackage>,
}

/// Transaction token for [`MemoryPageStore`]. Carries no state.
#[derive(Debug, Default)]
pub struct MemoryTransaction {
    _private: (),
}

impl MemoryPageStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of packages in a collection.
    pub fn len<P: StoredPackage>(&self) -> usize {
        P::memory_map(self).len()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    type Transaction = MemoryTransaction;

    async fn begin(&self) -> Result<MemoryTransaction> {
        Ok(MemoryTransaction::default())
    }

    async fn commit(&self, _tx: MemoryTransaction) -> Result<()> {
        Ok(())
    }

    async fn put<P: StoredPackage>(
        &self,
        _tx: &mut MemoryTransaction,
        key: SessionId,
        value: P,
    ) -> Result<()> {
        P::memory_map(self).insert(key, value);
        Ok(())
    }

    async fn try_get<P: StoredPackage>(
        &self,
        _tx: &mut MemoryTransaction,
        key: SessionId,
    ) -> Result<Option<P>> {
        Ok(P::memory_map(self).get(&key).map(|entry| entry.value().clone()))
    }

    async fn contains_key<P: StoredPackage>(
        &self,
        _tx: &mut MemoryTransaction,
        key: SessionId,
    ) -> Result<bool> {
        Ok(P::memory_map(self).contains_key(&key))
    }

    async fn update<P, F, R>(
        &self,
        _tx: &mut MemoryTransaction,
        key: SessionId,
        f: F,
    ) -> Result<Option<R>>
    where
        P: StoredPackage,
        F: FnOnce(&mut P) -> R + Send,
        R: Send,
    {
        Ok(P::memory_map(self)
            .get_mut(&key)
            .map(|mut entry| f(entry.value_mut())))
    }

    async fn try_remove<P: StoredPackage>(
        &self,
        _tx: &mut MemoryTransaction,
        key: SessionId,
    ) -> Result<Option<P>> {
        Ok(P::memory_map(self).remove(&key).map(|(_, value)| value))
    }

    async fn keys<P: StoredPackage>(&self) -> Result<Vec<SessionId>> {
        let mut keys: Vec<SessionId> = P::memory_map(self).iter().map(|e| *e.key()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryPageStore::new();
        let id = SessionId::new(1);
        let mut tx = store.begin().await.unwrap();

        store
            .put(&mut tx, id, ReceiverAssemblyPackage::new(8))
            .await
            .unwrap();
        assert!(store
            .contains_key::<ReceiverAssemblyPackage>(&mut tx, id)
            .await
            .unwrap());

        let pkg: Option<ReceiverAssemblyPackage> = store.try_get(&mut tx, id).await.unwrap();
        assert_eq!(pkg.unwrap().expected_len(), 8);

        let removed: Option<ReceiverAssemblyPackage> =
            store.try_remove(&mut tx, id).await.unwrap();
        assert!(removed.is_some());
        let again: Option<ReceiverAssemblyPackage> = store.try_remove(&mut tx, id).await.unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_writes_visible_without_commit() {
        let store = MemoryPageStore::new();
        let id = SessionId::new(3);

        let mut tx = store.begin().await.unwrap();
        store
            .put(&mut tx, id, ReceiverAssemblyPackage::new(4))
            .await
            .unwrap();
        drop(tx);

        let mut other = store.begin().await.unwrap();
        assert!(store
            .contains_key::<ReceiverAssemblyPackage>(&mut other, id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_collections_are_independent() {
        let store = MemoryPageStore::new();
        let id = SessionId::new(0);
        let mut tx = store.begin().await.unwrap();

        store
            .put(&mut tx, id, SenderChunkPackage::new(vec![1u8, 2, 3], 2).unwrap())
            .await
            .unwrap();

        assert!(store.contains_key::<SenderChunkPackage>(&mut tx, id).await.unwrap());
        assert!(!store
            .contains_key::<ReceiverAssemblyPackage>(&mut tx, id)
            .await
            .unwrap());
        assert_eq!(store.len::<SenderChunkPackage>(), 1);
        assert_eq!(store.len::<ReceiverAssemblyPackage>(), 0);
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let store = MemoryPageStore::new();
        let id = SessionId::new(2);
        let mut tx = store.begin().await.unwrap();

        let missing = store
            .update(&mut tx, id, |pkg: &mut ReceiverAssemblyPackage| pkg.add_data(&[1]))
            .await
            .unwrap();
        assert!(missing.is_none());

        store
            .put(&mut tx, id, ReceiverAssemblyPackage::new(4))
            .await
            .unwrap();
        for chunk in [&[1u8, 2][..], &[3][..]] {
            let position = store
                .update(&mut tx, id, |pkg: &mut ReceiverAssemblyPackage| {
                    pkg.add_data(chunk);
                    pkg.position()
                })
                .await
                .unwrap();
            assert!(position.is_some());
        }

        let stored: ReceiverAssemblyPackage = store.try_get(&mut tx, id).await.unwrap().unwrap();
        assert_eq!(stored.data(), &[1, 2, 3, 0]);
        assert_eq!(stored.position(), 3);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let store = MemoryPageStore::new();
        let id = SessionId::new(9);
        let mut tx = store.begin().await.unwrap();

        let mut pkg = ReceiverAssemblyPackage::new(4);
        store.put(&mut tx, id, pkg.clone()).await.unwrap();
        pkg.add_data(&[1, 2]);
        store.put(&mut tx, id, pkg).await.unwrap();

        let stored: ReceiverAssemblyPackage = store.try_get(&mut tx, id).await.unwrap().unwrap();
        assert_eq!(stored.data(), &[1, 2, 0, 0]);
        assert_eq!(
            store.keys::<ReceiverAssemblyPackage>().await.unwrap(),
            vec![id]
        );
    }
}
