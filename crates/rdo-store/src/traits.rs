//! ContentStore trait: the abstract interface for blob persistence.

use async_trait::async_trait;
use bytes::Bytes;
use rdo_core::Blake3Hash;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

const POINTER_PREFIX: &str = "b3";

/// A content address: `b3` followed by the hex Blake3 digest of the bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentPointer(Blake3Hash);

impl ContentPointer {
    /// Address of the given bytes.
    pub fn for_content(bytes: &[u8]) -> Self {
        Self(Blake3Hash::hash(bytes))
    }

    pub fn digest(&self) -> &Blake3Hash {
        &self.0
    }

    /// Whether `bytes` hash to this pointer.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        Blake3Hash::hash(bytes) == self.0
    }
}

impl fmt::Display for ContentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{POINTER_PREFIX}{}", self.0.to_hex())
    }
}

impl fmt::Debug for ContentPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentPointer({POINTER_PREFIX}{})", &self.0.to_hex()[..16])
    }
}

impl FromStr for ContentPointer {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix(POINTER_PREFIX)
            .ok_or_else(|| StoreError::InvalidPointer(s.to_string()))?;
        if hex.starts_with("0x") {
            return Err(StoreError::InvalidPointer(s.to_string()));
        }
        Blake3Hash::from_hex(hex)
            .map(Self)
            .map_err(|_| StoreError::InvalidPointer(s.to_string()))
    }
}

/// The ContentStore trait: async interface for content-addressed blobs.
///
/// For SQLite, `spawn_blocking` is used internally to avoid blocking the runtime.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes and return their pointer. Idempotent.
    async fn put(&self, bytes: Bytes) -> Result<ContentPointer>;

    /// Fetch the bytes behind a pointer.
    ///
    /// Returns `NotFound` for unknown pointers and `Corrupted` if the stored
    /// bytes no longer hash to the pointer.
    async fn get(&self, pointer: &ContentPointer) -> Result<Bytes>;

    /// Check whether a pointer is stored.
    async fn has(&self, pointer: &ContentPointer) -> Result<bool>;
}
