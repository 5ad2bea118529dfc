//! In-memory implementation of the ContentStore trait.
//!
//! Same semantics as SQLite, no persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::{ContentPointer, ContentStore};

/// In-memory store. All data is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentPointer, Bytes>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ContentPointer, Bytes>>> {
        self.blobs
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ContentPointer, Bytes>>> {
        self.blobs
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    #[cfg(test)]
    fn overwrite(&self, pointer: ContentPointer, bytes: Bytes) {
        self.write().unwrap().insert(pointer, bytes);
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: Bytes) -> Result<ContentPointer> {
        let pointer = ContentPointer::for_content(&bytes);
        self.write()?.entry(pointer).or_insert(bytes);
        Ok(pointer)
    }

    async fn get(&self, pointer: &ContentPointer) -> Result<Bytes> {
        let bytes = self
            .read()?
            .get(pointer)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(pointer.to_string()))?;

        if !pointer.matches(&bytes) {
            tracing::warn!(%pointer, "stored content does not match its pointer");
            return Err(StoreError::Corrupted(pointer.to_string()));
        }
        Ok(bytes)
    }

    async fn has(&self, pointer: &ContentPointer) -> Result<bool> {
        Ok(self.read()?.contains_key(pointer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryContentStore::new();
        let ptr = store.put(Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(store.get(&ptr).await.unwrap(), Bytes::from_static(b"hello"));
        assert!(store.has(&ptr).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_idempotent() {
        let store = MemoryContentStore::new();
        let a = store.put(Bytes::from_static(b"same")).await.unwrap();
        let b = store.put(Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_pointer() {
        let store = MemoryContentStore::new();
        let ptr = ContentPointer::for_content(b"never stored");
        assert!(matches!(store.get(&ptr).await, Err(StoreError::NotFound(_))));
        assert!(!store.has(&ptr).await.unwrap());
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_not_retryable() {
        let store = MemoryContentStore::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.blobs.write().unwrap();
            panic!("writer died holding the lock");
        }));

        let err = store.put(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StoreError::LockPoisoned(_)));
        assert!(!err.is_retryable());
        assert!(matches!(store.len(), Err(StoreError::LockPoisoned(_))));
        assert!(store.is_empty().is_err());
    }

    #[tokio::test]
    async fn test_corruption_detected() {
        let store = MemoryContentStore::new();
        let ptr = store.put(Bytes::from_static(b"original")).await.unwrap();
        store.overwrite(ptr, Bytes::from_static(b"tampered"));
        assert!(matches!(store.get(&ptr).await, Err(StoreError::Corrupted(_))));
    }
}
