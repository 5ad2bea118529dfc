//! SQLite implementation of the ContentStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{ContentPointer, ContentStore};

/// SQLite-based content store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking.
#[derive(Clone)]
pub struct SqliteContentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteContentStore {
    /// Open a SQLite database at the given path, running migrations.
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

    /// Run a blocking closure against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {e}")))?
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| StoreError::LockPoisoned(format!("connection mutex: {e}")))
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn put(&self, bytes: Bytes) -> Result<ContentPointer> {
        let pointer = ContentPointer::for_content(&bytes);

        self.blocking(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO blobs (digest, data, size, stored_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    &pointer.digest().as_bytes()[..],
                    &bytes[..],
                    bytes.len() as i64,
                    now_millis()
                ],
            )?;
            if inserted > 0 {
                tracing::debug!(%pointer, size = bytes.len(), "stored blob");
            }
            Ok(pointer)
        })
        .await
    }

    async fn get(&self, pointer: &ContentPointer) -> Result<Bytes> {
        let pointer = *pointer;

        self.blocking(move |conn| {
            let data: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT data FROM blobs WHERE digest = ?1",
                    params![&pointer.digest().as_bytes()[..]],
                    |row| row.get(0),
                )
                .optional()?;

            let data = data.ok_or_else(|| StoreError::NotFound(pointer.to_string()))?;
            if !pointer.matches(&data) {
                tracing::warn!(%pointer, "stored content does not match its pointer");
                return Err(StoreError::Corrupted(pointer.to_string()));
            }
            Ok(Bytes::from(data))
        })
        .await
    }

    async fn has(&self, pointer: &ContentPointer) -> Result<bool> {
        let pointer = *pointer;

        self.blocking(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blobs WHERE digest = ?1",
                    params![&pointer.digest().as_bytes()[..]],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SqliteContentStore::open_memory().unwrap();
        let ptr = store.put(Bytes::from_static(b"ciphertext")).await.unwrap();

        assert_eq!(ptr, ContentPointer::for_content(b"ciphertext"));
        assert_eq!(store.get(&ptr).await.unwrap(), Bytes::from_static(b"ciphertext"));
        assert!(store.has(&ptr).await.unwrap());
    }

    #[tokio::test]
    async fn test_idempotent_put() {
        let store = SqliteContentStore::open_memory().unwrap();
        let a = store.put(Bytes::from_static(b"same")).await.unwrap();
        let b = store.put(Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(a, b);

        let count: i64 = lock(&store.conn)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = SqliteContentStore::open_memory().unwrap();
        let ptr = ContentPointer::for_content(b"absent");
        assert!(matches!(store.get(&ptr).await, Err(StoreError::NotFound(_))));
        assert!(!store.has(&ptr).await.unwrap());
    }

    #[tokio::test]
    async fn test_poisoned_connection_is_not_retryable() {
        let store = SqliteContentStore::open_memory().unwrap();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.conn.lock().unwrap();
            panic!("task died holding the connection");
        }));

        let err = store.put(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StoreError::LockPoisoned(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_corruption_detected() {
        let store = SqliteContentStore::open_memory().unwrap();
        let ptr = store.put(Bytes::from_static(b"original")).await.unwrap();

        lock(&store.conn)
            .unwrap()
            .execute("UPDATE blobs SET data = X'00'", [])
            .unwrap();

        assert!(matches!(store.get(&ptr).await, Err(StoreError::Corrupted(_))));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.db");

        let ptr = {
            let store = SqliteContentStore::open(&path).unwrap();
            store.put(Bytes::from_static(b"durable")).await.unwrap()
        };

        let reopened = SqliteContentStore::open(&path).unwrap();
        assert_eq!(reopened.get(&ptr).await.unwrap(), Bytes::from_static(b"durable"));
    }
}
