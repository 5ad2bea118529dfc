//! The ledger seam: where the client submits creates and action requests.

use async_trait::async_trait;
use rdo_core::{ActionType, Identity, RdoId};
use rdo_registry::{
    CreateRequest, EventRef, Outcome, RdoRecord, RefusalProof, Result, SharedRegistry,
};

/// The authority a client talks to.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn create(&self, creator: Identity, req: CreateRequest) -> Result<RdoId>;

    async fn request_action(
        &self,
        actor: Identity,
        id: RdoId,
        action: ActionType,
        context: &[u8],
    ) -> Result<Outcome>;

    async fn read(&self, id: RdoId) -> Result<RdoRecord>;

    async fn verify_refusal(&self, event: EventRef) -> Result<RefusalProof>;
}

#[async_trait]
impl Ledger for SharedRegistry {
    async fn create(&self, creator: Identity, req: CreateRequest) -> Result<RdoId> {
        SharedRegistry::create(self, creator, req).await
    }

    async fn request_action(
        &self,
        actor: Identity,
        id: RdoId,
        action: ActionType,
        context: &[u8],
    ) -> Result<Outcome> {
        SharedRegistry::request_action(self, actor, id, action, context).await
    }

    async fn read(&self, id: RdoId) -> Result<RdoRecord> {
        SharedRegistry::read(self, id).await
    }

    async fn verify_refusal(&self, event: EventRef) -> Result<RefusalProof> {
        SharedRegistry::verify_refusal(self, event).await
    }
}
