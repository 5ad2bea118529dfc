//! A registry shared between tasks.
//!
//! Each call takes the lock once, so the read-evaluate-mutate sequence of one
//! request never interleaves with another.

use std::sync::Arc;

use rdo_core::{ActionType, Identity, RdoId, RuleSet};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::event::{EventRef, Outcome, RefusalProof, RegistryEvent};
use crate::record::{CreateRequest, RdoRecord};
use crate::registry::Registry;

/// Cloneable handle to a [`Registry`] behind an async mutex.
#[derive(Clone, Debug)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub async fn create(&self, creator: Identity, req: CreateRequest) -> Result<RdoId> {
        self.inner.lock().await.create(creator, req)
    }

    pub async fn request_action(
        &self,
        actor: Identity,
        id: RdoId,
        action: ActionType,
        context: &[u8],
    ) -> Result<Outcome> {
        self.inner
            .lock()
            .await
            .request_action(actor, id, action, context)
    }

    /// A copy of the current record.
    pub async fn read(&self, id: RdoId) -> Result<RdoRecord> {
        self.inner.lock().await.read(id).cloned()
    }

    pub async fn event(&self, event: EventRef) -> Option<RegistryEvent> {
        self.inner.lock().await.event(event).cloned()
    }

    pub async fn events_for(&self, id: RdoId) -> Vec<(EventRef, RegistryEvent)> {
        self.inner
            .lock()
            .await
            .events_for(id)
            .into_iter()
            .map(|(r, e)| (r, e.clone()))
            .collect()
    }

    pub async fn verify_refusal(&self, event: EventRef) -> Result<RefusalProof> {
        self.inner.lock().await.verify_refusal(event)
    }

    pub async fn verify_rules(&self, id: RdoId, rules: &RuleSet) -> Result<bool> {
        self.inner.lock().await.verify_rules(id, rules)
    }

    pub async fn snapshot(&self) -> Result<Vec<u8>> {
        self.inner.lock().await.snapshot()
    }
}
