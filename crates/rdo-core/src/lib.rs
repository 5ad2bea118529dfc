//! # RDO Core
//!
//! Pure primitives for Rule-Defined Objects: identities, digests, wire codes,
//! and the rule compiler.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`RuleIntent`] - What a creator wants to enforce
//! - [`CompiledRules`] - Canonical rule string, its digest, and the compact projection
//! - [`RuleSet`] - A rule set under either schema version
//! - [`CompactRules`] - The fixed-size struct the registry evaluates
//! - [`Identity`] - An actor's public identity
//!
//! ## Canonicalization
//!
//! Rules are hashed over a sorted-key text encoding. See [`canonical`].

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod rules;
pub mod time;
pub mod types;

pub use canonical::{encode_canonical, CanonicalValue};
pub use crypto::{Blake3Hash, Identity, Keypair, RulesHash};
pub use error::{CoreError, ValidationError};
pub use rules::{
    compile, CanonicalRules, CompactRules, CompiledRules, ForbiddenAction, IdentityRequirement,
    LegacyRules, Payload, PayloadDescriptor, RuleBlock, RuleIntent, RuleSet, SchemaVersion,
    ViolationPolicy,
};
pub use time::{unix_now, Clock, ManualClock, SystemClock};
pub use types::{AccessType, ActionType, ObjectType, RdoId};
