//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use rdo::{Client, ProtocolConfig};
use rdo_core::{Identity, Keypair, ManualClock};
use rdo_registry::{Registry, SharedRegistry};
use rdo_store::{ContentPointer, ContentStore, MemoryContentStore, Result, StoreError};

/// Start time of every fixture clock: 2025-01-14T16:00:00Z.
pub const FIXTURE_EPOCH: u64 = 1_736_870_400;

/// Deterministic identity for a one-byte seed.
pub fn identity(seed: u8) -> Identity {
    Keypair::from_seed(&[seed; 32]).identity()
}

/// A memory store, a registry and a manual clock shared by every client.
pub struct TestFixture {
    pub clock: ManualClock,
    pub store: Arc<MemoryContentStore>,
    pub ledger: Arc<SharedRegistry>,
    pub config: ProtocolConfig,
}

impl TestFixture {
    pub fn new() -> Self {
        let clock = ManualClock::new(FIXTURE_EPOCH);
        let registry = Registry::new(Arc::new(clock.clone()));
        Self {
            clock,
            store: Arc::new(MemoryContentStore::new()),
            ledger: Arc::new(SharedRegistry::new(registry)),
            config: ProtocolConfig {
                retry_backoff_ms: 1,
                ..ProtocolConfig::default()
            },
        }
    }

    /// A client acting as [`identity(seed)`](identity).
    pub fn client(&self, seed: u8) -> Client<MemoryContentStore, SharedRegistry> {
        self.client_with_store(seed, self.store.clone())
    }

    /// A client on a different store, sharing the fixture's registry and clock.
    pub fn client_with_store<S: ContentStore>(
        &self,
        seed: u8,
        store: Arc<S>,
    ) -> Client<S, SharedRegistry> {
        Client::new(
            Keypair::from_seed(&[seed; 32]),
            store,
            self.ledger.clone(),
            self.config.clone(),
        )
        .with_clock(Arc::new(self.clock.clone()))
    }

    /// Move the shared clock forward.
    pub fn advance(&self, secs: u64) {
        self.clock.advance(secs);
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A store wrapper that reports `Unavailable` for its first `failures` calls.
pub struct FlakyStore<S> {
    inner: S,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl<S: ContentStore> FlakyStore<S> {
    pub fn new(inner: S, failures: u32) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    /// Total calls seen, failed ones included.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fail the next `n` calls.
    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn trip(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tripped = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::Unavailable("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: ContentStore> ContentStore for FlakyStore<S> {
    async fn put(&self, bytes: Bytes) -> Result<ContentPointer> {
        self.trip()?;
        self.inner.put(bytes).await
    }

    async fn get(&self, pointer: &ContentPointer) -> Result<Bytes> {
        self.trip()?;
        self.inner.get(pointer).await
    }

    async fn has(&self, pointer: &ContentPointer) -> Result<bool> {
        self.trip()?;
        self.inner.has(pointer).await
    }
}
