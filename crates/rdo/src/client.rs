//! The Client: creator and actor flows over a store and a ledger.
//!
//! Creating an object compiles the rules, seals the content under a fresh
//! key, stores ciphertext and metadata, registers the object, and hands back a
//! capability link. Requesting access asks the ledger for a verdict and only
//! decrypts on an allowed one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rdo_core::{
    compile, ActionType, Clock, Identity, Keypair, RdoId, RuleIntent, RulesHash, SchemaVersion,
    SystemClock,
};
use rdo_gate::{decrypt, encrypt, ContentKey};
use rdo_registry::{CreateRequest, EventRef, RefusalProof, RefusalReason, Verdict};
use rdo_store::{ContentPointer, ContentStore, StoreError};

use crate::config::ProtocolConfig;
use crate::error::{ProtocolError, Result};
use crate::ledger::Ledger;
use crate::link::CapabilityLink;
use crate::metadata::MetadataDocument;

/// Everything a creator gets back from [`Client::create_object`].
#[derive(Debug, Clone)]
pub struct CreatedObject {
    pub id: RdoId,
    pub rules_hash: RulesHash,
    /// The canonical rule string the hash was computed over.
    pub canonical: String,
    pub metadata_pointer: ContentPointer,
    pub content_pointer: ContentPointer,
    /// The capability link. Carries the key; share it only with intended holders.
    pub link: String,
}

/// The result of [`Client::request_access`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Allowed, and the content was decrypted.
    Opened { plaintext: Vec<u8>, event: EventRef },
    /// Refused. Nothing was decrypted.
    Refused {
        reason: RefusalReason,
        event: EventRef,
    },
}

impl AccessOutcome {
    pub fn event(&self) -> EventRef {
        match self {
            Self::Opened { event, .. } | Self::Refused { event, .. } => *event,
        }
    }

    pub fn plaintext(&self) -> Option<&[u8]> {
        match self {
            Self::Opened { plaintext, .. } => Some(plaintext),
            Self::Refused { .. } => None,
        }
    }

    pub fn refusal(&self) -> Option<RefusalReason> {
        match self {
            Self::Refused { reason, .. } => Some(*reason),
            Self::Opened { .. } => None,
        }
    }
}

/// A protocol client acting as one identity.
pub struct Client<S: ContentStore, L: Ledger> {
    keypair: Keypair,
    store: Arc<S>,
    ledger: Arc<L>,
    config: ProtocolConfig,
    clock: Arc<dyn Clock>,
}

impl<S: ContentStore, L: Ledger> Client<S, L> {
    pub fn new(keypair: Keypair, store: Arc<S>, ledger: Arc<L>, config: ProtocolConfig) -> Self {
        Self {
            keypair,
            store,
            ledger,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` to resolve relative expiries at compile time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn identity(&self) -> Identity {
        self.keypair.identity()
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creator Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an object holding `content` under the rules in `intent`.
    ///
    /// Fails before anything is stored if the intent does not validate. A
    /// store failure leaves the registry untouched.
    pub async fn create_object(&self, intent: &RuleIntent, content: &[u8]) -> Result<CreatedObject> {
        intent.validate()?;

        let now = self.clock.now();
        let compiled = compile(intent, now);

        let key = ContentKey::generate();
        let sealed = encrypt(&key, content)?;

        let content_pointer = self.put(Bytes::from(sealed.ciphertext)).await?;

        let metadata = MetadataDocument::new(
            intent.name.clone(),
            intent.description.clone(),
            self.config.image.clone(),
            &compiled.digest,
            &content_pointer,
            &sealed.iv,
            now,
        );
        let metadata_pointer = self.put(Bytes::from(metadata.to_json()?)).await?;

        let req = CreateRequest {
            rules_hash: compiled.digest,
            rules_version: SchemaVersion::Structured,
            object_type: intent.object_type(),
            rules: compiled.compact,
            metadata_pointer: metadata_pointer.to_string(),
            whitelist: intent.whitelist.clone(),
        };
        let id = self.ledger.create(self.identity(), req).await?;

        let link = CapabilityLink::new(self.config.origin.clone(), id, key).encode()?;
        tracing::info!(%id, rules_hash = %compiled.digest, "created object");

        Ok(CreatedObject {
            id,
            rules_hash: compiled.digest,
            canonical: compiled.canonical,
            metadata_pointer,
            content_pointer,
            link,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actor Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Request `action` on the object behind `link`, decrypting only if allowed.
    pub async fn request_access(
        &self,
        link: &str,
        action: ActionType,
        context: &[u8],
    ) -> Result<AccessOutcome> {
        let link = CapabilityLink::parse(link)?;
        let record = self.ledger.read(link.id).await?;

        let metadata_pointer: ContentPointer = record.metadata_pointer.parse()?;
        let metadata = MetadataDocument::from_json(&self.get(&metadata_pointer).await?)?;

        if self.config.verify_metadata {
            let found = metadata.rules_hash()?;
            if found != record.rules_hash {
                tracing::warn!(id = %link.id, "metadata names different rules than the registry");
                return Err(ProtocolError::MetadataMismatch {
                    expected: record.rules_hash,
                    found,
                });
            }
        }

        let outcome = self
            .ledger
            .request_action(self.identity(), link.id, action, context)
            .await?;

        match outcome.verdict {
            Verdict::Refused(reason) => Ok(AccessOutcome::Refused {
                reason,
                event: outcome.event,
            }),
            Verdict::Allowed { .. } => {
                let ciphertext = self.get(&metadata.content_pointer()?).await?;
                let plaintext = decrypt(&link.key, &metadata.iv()?, &ciphertext).map_err(|e| {
                    tracing::warn!(id = %link.id, "decryption failed after allowed verdict");
                    e
                })?;
                Ok(AccessOutcome::Opened {
                    plaintext,
                    event: outcome.event,
                })
            }
        }
    }

    /// Check a refusal against the object's immutable rules hash.
    pub async fn verify_refusal(&self, event: EventRef) -> Result<RefusalProof> {
        Ok(self.ledger.verify_refusal(event).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Store Access
    // ─────────────────────────────────────────────────────────────────────────

    async fn put(&self, bytes: Bytes) -> Result<ContentPointer> {
        let store = &self.store;
        self.retry("put", move || store.put(bytes.clone())).await
    }

    async fn get(&self, pointer: &ContentPointer) -> Result<Bytes> {
        let store = &self.store;
        self.retry("get", move || store.get(pointer)).await
    }

    /// Run a store operation, retrying retryable failures with linear backoff.
    async fn retry<T, F, Fut>(&self, op: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, StoreError>>,
    {
        let mut attempt = 0u32;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.store_retries => {
                    attempt += 1;
                    let delay = self.config.retry_backoff_ms.saturating_mul(attempt.into());
                    tracing::warn!(op, attempt, delay_ms = delay, error = %e, "retrying store operation");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
