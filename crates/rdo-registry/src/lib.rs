//! # RDO Registry
//!
//! The authority that decides whether an action on a Rule-Defined Object is
//! allowed, and the permanent record of every decision.
//!
//! ## Overview
//!
//! Each object is a [`RdoRecord`]: an immutable rules hash and compact rule
//! struct, plus a small amount of monotonic state (lock flag, violation count,
//! remaining uses). [`Registry::request_action`] evaluates a request against
//! that state, applies its side effects, and appends a [`RegistryEvent`].
//!
//! ## Evaluation order
//!
//! 1. Unknown id: `NotFound`, nothing recorded
//! 2. Locked: refused with `OBJECT_LOCKED`
//! 3. Access scope (whitelist, creator-only)
//! 4. Expiry, against the registry clock
//! 5. Forbidden actions (counts a violation, may lock)
//! 6. Use budget
//! 7. Allowed, spending one use if the budget is finite
//!
//! ## States
//!
//! An object is ACTIVE until a violation under a lock-on-violation policy
//! makes it LOCKED. LOCKED is absorbing.

pub mod error;
pub mod event;
pub mod record;
pub mod registry;
pub mod shared;

pub use error::{RegistryError, Result};
pub use event::{EventRef, Outcome, RefusalProof, RefusalReason, RegistryEvent, Verdict};
pub use record::{action_hash, CreateRequest, RdoRecord, WireCreateRequest};
pub use registry::Registry;
pub use shared::SharedRegistry;
