//! Object records and the per-action state transition.

use std::collections::BTreeSet;

use rdo_core::{
    AccessType, ActionType, Blake3Hash, CompactRules, ForbiddenAction, Identity, ObjectType,
    RdoId, RulesHash, SchemaVersion,
};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};
use crate::event::{RefusalReason, Verdict};

/// The registry's record of one object.
///
/// `rules_hash`, `rules_version` and `rules` never change after creation.
/// `locked` only goes from false to true, `violation_count` only grows, and
/// `uses_remaining` only shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdoRecord {
    pub id: RdoId,
    pub creator: Identity,
    pub object_type: ObjectType,
    pub rules_hash: RulesHash,
    pub rules_version: SchemaVersion,
    pub rules: CompactRules,
    pub whitelist: BTreeSet<Identity>,
    pub metadata_pointer: String,
    pub created_at: u64,
    pub locked: bool,
    pub violation_count: u64,
    pub uses_remaining: u64,
}

impl RdoRecord {
    pub fn is_whitelisted(&self, actor: &Identity) -> bool {
        self.whitelist.contains(actor)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.rules.expiry != 0 && now >= self.rules.expiry
    }

    /// Decide one action and apply its side effects to this record.
    ///
    /// Checks run in a fixed order and the first failing one wins.
    pub(crate) fn evaluate(
        &mut self,
        actor: &Identity,
        action: ActionType,
        context: &[u8],
        now: u64,
    ) -> Verdict {
        if self.locked {
            return Verdict::Refused(RefusalReason::ObjectLocked);
        }

        match self.rules.access_type {
            AccessType::List if !self.is_whitelisted(actor) => {
                return Verdict::Refused(RefusalReason::NotWhitelisted);
            }
            AccessType::CreatorOnly if *actor != self.creator => {
                return Verdict::Refused(RefusalReason::CreatorOnly);
            }
            _ => {}
        }

        if self.is_expired(now) {
            return Verdict::Refused(RefusalReason::Expired);
        }

        if let Some(forbidden) = forbidden_by(&self.rules, action) {
            self.violation_count += 1;
            if self.rules.lock_on_violation {
                self.locked = true;
            }
            return Verdict::Refused(RefusalReason::Forbidden {
                action: forbidden,
                locked: self.locked,
            });
        }

        if self.rules.max_uses != 0 {
            if self.uses_remaining == 0 {
                return Verdict::Refused(RefusalReason::UsageLimitExceeded);
            }
            self.uses_remaining -= 1;
        }

        Verdict::Allowed {
            action_hash: action_hash(action, context),
        }
    }
}

/// The forbidden flag an action trips, if any. READ and EXECUTE never do.
fn forbidden_by(rules: &CompactRules, action: ActionType) -> Option<ForbiddenAction> {
    match action {
        ActionType::Copy if rules.forbid_copy => Some(ForbiddenAction::Copy),
        ActionType::Forward if rules.forbid_forward => Some(ForbiddenAction::Forward),
        ActionType::Export | ActionType::Download if rules.forbid_export => {
            Some(ForbiddenAction::Export)
        }
        _ => None,
    }
}

/// Digest binding an allowed action to its context: `Blake3(code || context)`.
pub fn action_hash(action: ActionType, context: &[u8]) -> Blake3Hash {
    Blake3Hash::hash_parts(&[&[action.to_u8()], context])
}

/// A validated request to register an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub rules_hash: RulesHash,
    pub rules_version: SchemaVersion,
    pub object_type: ObjectType,
    pub rules: CompactRules,
    pub metadata_pointer: String,
    pub whitelist: Vec<Identity>,
}

/// A create request as it arrives on the wire, with raw enum codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCreateRequest {
    pub rules_hash: [u8; 32],
    pub rules_version: u8,
    pub object_type: u8,
    pub access_type: u8,
    pub forbid_copy: bool,
    pub forbid_forward: bool,
    pub forbid_export: bool,
    pub expiry: u64,
    pub max_uses: u64,
    pub lock_on_violation: bool,
    pub require_identity: bool,
    pub metadata_pointer: String,
    pub whitelist: Vec<[u8; 32]>,
}

impl TryFrom<WireCreateRequest> for CreateRequest {
    type Error = RegistryError;

    fn try_from(wire: WireCreateRequest) -> Result<Self> {
        let malformed = |e: rdo_core::CoreError| RegistryError::MalformedRequest(e.to_string());

        let object_type = ObjectType::try_from(wire.object_type).map_err(malformed)?;
        let access_type = AccessType::try_from(wire.access_type).map_err(malformed)?;
        let rules_version = SchemaVersion::from_u8(wire.rules_version).ok_or_else(|| {
            malformed(rdo_core::CoreError::UnsupportedVersion(wire.rules_version))
        })?;

        Ok(Self {
            rules_hash: RulesHash::from_bytes(wire.rules_hash),
            rules_version,
            object_type,
            rules: CompactRules {
                forbid_copy: wire.forbid_copy,
                forbid_forward: wire.forbid_forward,
                forbid_export: wire.forbid_export,
                expiry: wire.expiry,
                access_type,
                max_uses: wire.max_uses,
                lock_on_violation: wire.lock_on_violation,
                require_identity: wire.require_identity,
            },
            metadata_pointer: wire.metadata_pointer,
            whitelist: wire.whitelist.into_iter().map(Identity::from_bytes).collect(),
        })
    }
}
