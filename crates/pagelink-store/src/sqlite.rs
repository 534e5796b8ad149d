//! SQLite implementation of the PageStore trait.
//!
//! This is the durable backend. It uses rusqlite with bundled SQLite, wrapped
//! in async via tokio::spawn_blocking. Packages are stored as CBOR blobs.
//!
//! Writes made through a [`SqliteTransaction`] are staged in memory and
//! applied in a single SQLite transaction on commit, so an abandoned
//! transaction never becomes visible.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use pagelink_core::{from_cbor, to_cbor, SessionId};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{Collection, PageStore, StoredPackage};

/// SQLite-based page store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqlitePageStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

/// A staged change to one row.
#[derive(Debug, Clone)]
enum Staged {
    Put(Vec<u8>),
    Remove,
}

/// Transaction token for [`SqlitePageStore`].
///
/// Holds the staged write set. Reads through the transaction see its own
/// staged writes first.
pub struct SqliteTransaction {
    staged: BTreeMap<(Collection, SessionId), Staged>,
    finished: bool,
}

impl SqliteTransaction {
    fn new() -> Self {
        Self {
            staged: BTreeMap::new(),
            finished: false,
        }
    }

    /// Number of staged changes.
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    fn staged(&self, collection: Collection, key: SessionId) -> Option<Staged> {
        self.staged.get(&(collection, key)).cloned()
    }

    fn take_staged(&mut self) -> BTreeMap<(Collection, SessionId), Staged> {
        self.finished = true;
        std::mem::take(&mut self.staged)
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.finished && !self.staged.is_empty() {
            tracing::warn!(
                pending = self.staged.len(),
                "page store transaction dropped without commit, staged writes discarded"
            );
        }
    }
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction")
            .field("pending", &self.staged.len())
            .finish()
    }
}

impl SqlitePageStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::BlockingTask(format!("spawn_blocking failed: {}", e)))?
    }

    /// Load the committed blob for a row.
    async fn load(&self, collection: Collection, key: SessionId) -> Result<Option<Vec<u8>>> {
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT package FROM pages WHERE collection = ?1 AND session_id = ?2",
                params![collection.as_str(), key.value()],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    /// Check whether a committed row exists.
    async fn exists(&self, collection: Collection, key: SessionId) -> Result<bool> {
        self.with_conn(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM pages WHERE collection = ?1 AND session_id = ?2)",
                params![collection.as_str(), key.value()],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    /// Current blob for a row as seen through `tx`.
    async fn visible(
        &self,
        tx: &SqliteTransaction,
        collection: Collection,
        key: SessionId,
    ) -> Result<Option<Vec<u8>>> {
        match tx.staged(collection, key) {
            Some(Staged::Put(bytes)) => Ok(Some(bytes)),
            Some(Staged::Remove) => Ok(None),
            None => self.load(collection, key).await,
        }
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|e| {
        StoreError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
            Some(format!("mutex poisoned: {}", e)),
        ))
    })
}

fn decode<P: StoredPackage>(bytes: &[u8]) -> Result<P> {
    from_cbor(bytes).map_err(|e| {
        StoreError::InvalidData(format!("{} package: {}", P::COLLECTION, e))
    })
}

#[async_trait]
impl PageStore for SqlitePageStore {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> Result<SqliteTransaction> {
        Ok(SqliteTransaction::new())
    }

    async fn commit(&self, mut tx: SqliteTransaction) -> Result<()> {
        let staged = tx.take_staged();
        if staged.is_empty() {
            return Ok(());
        }

        let count = staged.len();
        self.with_conn(move |conn| {
            let sql_tx = conn.transaction()?;

            for ((collection, key), change) in staged {
                match change {
                    Staged::Put(bytes) => sql_tx.execute(
                        "INSERT OR REPLACE INTO pages (collection, session_id, package)
                         VALUES (?1, ?2, ?3)",
                        params![collection.as_str(), key.value(), bytes],
                    )?,
                    Staged::Remove => sql_tx.execute(
                        "DELETE FROM pages WHERE collection = ?1 AND session_id = ?2",
                        params![collection.as_str(), key.value()],
                    )?,
                };
            }

            sql_tx.commit()?;
            Ok(())
        })
        .await?;

        tracing::trace!(changes = count, "page store transaction committed");
        Ok(())
    }

    async fn put<P: StoredPackage>(
        &self,
        tx: &mut SqliteTransaction,
        key: SessionId,
        value: P,
    ) -> Result<()> {
        let bytes = to_cbor(&value)?;
        tx.staged.insert((P::COLLECTION, key), Staged::Put(bytes));
        Ok(())
    }

    async fn try_get<P: StoredPackage>(
        &self,
        tx: &mut SqliteTransaction,
        key: SessionId,
    ) -> Result<Option<P>> {
        self.visible(tx, P::COLLECTION, key)
            .await?
            .map(|bytes| decode::<P>(&bytes))
            .transpose()
    }

    async fn contains_key<P: StoredPackage>(
        &self,
        tx: &mut SqliteTransaction,
        key: SessionId,
    ) -> Result<bool> {
        match tx.staged(P::COLLECTION, key) {
            Some(Staged::Put(_)) => Ok(true),
            Some(Staged::Remove) => Ok(false),
            None => self.exists(P::COLLECTION, key).await,
        }
    }

    async fn update<P, F, R>(
        &self,
        tx: &mut SqliteTransaction,
        key: SessionId,
        f: F,
    ) -> Result<Option<R>>
    where
        P: StoredPackage,
        F: FnOnce(&mut P) -> R + Send,
        R: Send,
    {
        let Some(bytes) = self.visible(tx, P::COLLECTION, key).await? else {
            return Ok(None);
        };

        let mut package = decode::<P>(&bytes)?;
        let result = f(&mut package);
        tx.staged
            .insert((P::COLLECTION, key), Staged::Put(to_cbor(&package)?));
        Ok(Some(result))
    }

    async fn try_remove<P: StoredPackage>(
        &self,
        tx: &mut SqliteTransaction,
        key: SessionId,
    ) -> Result<Option<P>> {
        let current = self.visible(tx, P::COLLECTION, key).await?;
        let Some(bytes) = current else {
            return Ok(None);
        };

        tx.staged.insert((P::COLLECTION, key), Staged::Remove);
        decode::<P>(&bytes).map(Some)
    }

    async fn keys<P: StoredPackage>(&self) -> Result<Vec<SessionId>> {
        let collection = P::COLLECTION;

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id FROM pages WHERE collection = ?1 ORDER BY session_id",
            )?;

            let keys = stmt
                .query_map(params![collection.as_str()], |row| {
                    row.get::<_, u16>(0).map(SessionId::new)
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            Ok(keys)
        })
        .await
    }
}
