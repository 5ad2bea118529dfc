//! Verdicts and the append-only event log.

use rdo_core::{ActionType, Blake3Hash, ForbiddenAction, Identity, ObjectType, RdoId, RulesHash};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an event in the registry log. Durable reference to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventRef(pub u64);

impl EventRef {
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefusalReason {
    /// The object is locked. Every action is refused.
    ObjectLocked,
    /// LIST access and the actor is not on the whitelist.
    NotWhitelisted,
    /// CREATOR_ONLY access and the actor is not the creator.
    CreatorOnly,
    /// The expiry time has passed.
    Expired,
    /// The action is forbidden. `locked` is set when this refusal locked the object.
    Forbidden {
        action: ForbiddenAction,
        locked: bool,
    },
    /// The use budget is spent.
    UsageLimitExceeded,
}

impl RefusalReason {
    /// Whether this refusal counted as a violation.
    pub fn is_violation(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }
}

impl fmt::Display for RefusalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectLocked => f.write_str("OBJECT_LOCKED"),
            Self::NotWhitelisted => f.write_str("Access denied (Not in whitelist)"),
            Self::CreatorOnly => f.write_str("Access denied (Creator only)"),
            Self::Expired => f.write_str("RDO has expired"),
            Self::Forbidden { action, locked } => {
                let base = match action {
                    ForbiddenAction::Copy => "Copying forbidden",
                    ForbiddenAction::Forward => "Forwarding forbidden",
                    ForbiddenAction::Export => "Export forbidden",
                };
                if *locked {
                    write!(f, "{base} (Object Locked)")
                } else {
                    f.write_str(base)
                }
            }
            Self::UsageLimitExceeded => f.write_str("Usage limit exceeded"),
        }
    }
}

/// The decision for one action request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Allowed { action_hash: Blake3Hash },
    Refused(RefusalReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn refusal(&self) -> Option<RefusalReason> {
        match self {
            Self::Refused(reason) => Some(*reason),
            Self::Allowed { .. } => None,
        }
    }
}

/// A verdict together with the event that records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub event: EventRef,
}

/// An entry in the registry log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    Created {
        id: RdoId,
        creator: Identity,
        object_type: ObjectType,
        rules_hash: RulesHash,
        metadata_pointer: String,
        at: u64,
    },
    Allowed {
        id: RdoId,
        actor: Identity,
        action: ActionType,
        action_hash: Blake3Hash,
        at: u64,
    },
    Refused {
        id: RdoId,
        actor: Identity,
        action: ActionType,
        rules_hash: RulesHash,
        reason: RefusalReason,
        at: u64,
    },
}

impl RegistryEvent {
    /// The object this event concerns.
    pub fn object_id(&self) -> RdoId {
        match self {
            Self::Created { id, .. } | Self::Allowed { id, .. } | Self::Refused { id, .. } => *id,
        }
    }
}

/// A checked refusal, suitable for showing to a third party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefusalProof {
    pub event: EventRef,
    pub id: RdoId,
    pub actor: Identity,
    pub action: ActionType,
    pub reason: RefusalReason,
    /// The rules hash the refusal was issued against.
    pub rules_hash: RulesHash,
    /// Whether that hash equals the object's immutable rules hash.
    pub rules_match: bool,
    pub at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refusal_reason_strings() {
        assert_eq!(RefusalReason::ObjectLocked.to_string(), "OBJECT_LOCKED");
        assert_eq!(
            RefusalReason::NotWhitelisted.to_string(),
            "Access denied (Not in whitelist)"
        );
        assert_eq!(RefusalReason::Expired.to_string(), "RDO has expired");
        assert_eq!(
            RefusalReason::Forbidden {
                action: ForbiddenAction::Forward,
                locked: false
            }
            .to_string(),
            "Forwarding forbidden"
        );
        assert_eq!(
            RefusalReason::Forbidden {
                action: ForbiddenAction::Copy,
                locked: true
            }
            .to_string(),
            "Copying forbidden (Object Locked)"
        );
        assert_eq!(
            RefusalReason::UsageLimitExceeded.to_string(),
            "Usage limit exceeded"
        );
    }

    #[test]
    fn test_only_forbidden_counts_as_violation() {
        assert!(RefusalReason::Forbidden {
            action: ForbiddenAction::Export,
            locked: false
        }
        .is_violation());
        assert!(!RefusalReason::Expired.is_violation());
        assert!(!RefusalReason::ObjectLocked.is_violation());
    }
}
