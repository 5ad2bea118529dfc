//! # RDO
//!
//! Rule-Defined Objects: encrypted objects whose usage rules are fixed at
//! creation and enforced by an authority registry.
//!
//! ## Overview
//!
//! - A creator describes what may be done with an object as a [`RuleIntent`].
//! - The intent compiles to a canonical rule string and its digest, the
//!   object's immutable rules hash.
//! - Content is sealed under a fresh key. Ciphertext and a public metadata
//!   document go to a [`ContentStore`]; the object is registered with a
//!   [`Ledger`].
//! - The creator shares a capability link carrying the key in its fragment.
//! - Holders request actions; the ledger allows or refuses each one and
//!   records the verdict. The client decrypts only on an allowed verdict.
//!
//! ## Trust model
//!
//! Verdicts gate compliant clients. Anyone holding the link holds the key, and
//! a client that skips the ledger can decrypt without asking. What the ledger
//! guarantees is an auditable record of every request and a rules hash no one
//! can change.
//!
//! Identities are not signed. The actor on a request is whoever the client
//! says it is, so per-actor rules (whitelists, creator-only) hold only among
//! clients that report their own identity honestly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use rdo::core::{ActionType, ForbiddenAction, Keypair, RuleIntent};
//! use rdo::registry::{Registry, SharedRegistry};
//! use rdo::store::MemoryContentStore;
//! use rdo::{Client, ProtocolConfig};
//!
//! async fn example() -> rdo::Result<()> {
//!     let store = Arc::new(MemoryContentStore::new());
//!     let ledger = Arc::new(SharedRegistry::new(Registry::with_system_clock()));
//!
//!     let creator = Client::new(Keypair::generate(), store.clone(), ledger.clone(), ProtocolConfig::default());
//!     let intent = RuleIntent::message("memo", "see attached").forbid(ForbiddenAction::Forward);
//!     let created = creator.create_object(&intent, b"the content").await?;
//!
//!     let holder = Client::new(Keypair::generate(), store, ledger, ProtocolConfig::default());
//!     let outcome = holder.request_access(&created.link, ActionType::Read, b"").await?;
//!     assert!(outcome.plaintext().is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `rdo::core` - identities, digests, the rule compiler
//! - `rdo::gate` - content keys and authenticated encryption
//! - `rdo::store` - content-addressed storage
//! - `rdo::registry` - the authority registry

pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod link;
pub mod metadata;

pub use rdo_core as core;
pub use rdo_gate as gate;
pub use rdo_registry as registry;
pub use rdo_store as store;

pub use client::{AccessOutcome, Client, CreatedObject};
pub use config::ProtocolConfig;
pub use error::{ProtocolError, Result};
pub use ledger::Ledger;
pub use link::CapabilityLink;
pub use metadata::{MetadataDocument, MetadataProperties};

pub use rdo_core::{
    compile, AccessType, ActionType, ForbiddenAction, Identity, Keypair, ObjectType, RdoId,
    RuleIntent, RulesHash,
};
pub use rdo_registry::{EventRef, RefusalReason, Verdict};
pub use rdo_store::ContentStore;
