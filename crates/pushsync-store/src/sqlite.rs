//! SQLite implementation of the ChunkStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use pushsync_core::{Chunk, ChunkAddress};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{ChunkStore, PutResult};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations run on the blocking pool.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::TaskFailed(e.to_string()))?
    }
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn put(&self, chunk: &Chunk) -> Result<PutResult> {
        let address = *chunk.address();
        let data = chunk.data().clone();

        self.blocking(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO chunks (address, data, stored_at) VALUES (?1, ?2, ?3)",
                params![address.as_bytes().as_slice(), data.as_ref(), now_millis()],
            )?;

            Ok(if inserted == 0 {
                PutResult::AlreadyExists
            } else {
                PutResult::Stored
            })
        })
        .await
    }

    async fn get(&self, address: &ChunkAddress) -> Result<Option<Chunk>> {
        let address = *address;

        self.blocking(move |conn| {
            let data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM chunks WHERE address = ?1",
                    params![address.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;

            Ok(data.map(|data| Chunk::with_address(address, Bytes::from(data))))
        })
        .await
    }

    async fn has(&self, address: &ChunkAddress) -> Result<bool> {
        let address = *address;

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM chunks WHERE address = ?1",
                    params![address.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
            usize::try_from(count)
                .map_err(|_| StoreError::InvalidData(format!("negative row count: {}", count)))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_basic() {
        let store = SqliteStore::open_memory().unwrap();
        let chunk = Chunk::new(b"sqlite payload".to_vec());

        assert_eq!(store.put(&chunk).await.unwrap(), PutResult::Stored);

        let retrieved = store.get(chunk.address()).await.unwrap().unwrap();
        assert_eq!(retrieved, chunk);
        assert!(store.has(chunk.address()).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_idempotent() {
        let store = SqliteStore::open_memory().unwrap();
        let chunk = Chunk::new(b"sqlite payload".to_vec());

        assert_eq!(store.put(&chunk).await.unwrap(), PutResult::Stored);
        assert_eq!(store.put(&chunk).await.unwrap(), PutResult::AlreadyExists);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_missing() {
        let store = SqliteStore::open_memory().unwrap();
        let address = ChunkAddress::from_bytes([0x55; 32]);
        assert!(store.get(&address).await.unwrap().is_none());
        assert!(!store.has(&address).await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.db");
        let chunk = Chunk::new(vec![7u8; 4096]);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put(&chunk).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(chunk.address()).await.unwrap(), Some(chunk));
    }

    #[tokio::test]
    async fn test_sqlite_store_concurrent_puts() {
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let chunk = Chunk::new(b"contended".to_vec());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let chunk = chunk.clone();
            handles.push(tokio::spawn(async move { store.put(&chunk).await.unwrap() }));
        }

        let mut stored = 0;
        for handle in handles {
            if handle.await.unwrap() == PutResult::Stored {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
