//! Proptest generators for property-based testing.

use proptest::prelude::*;

use rdo_core::{
    AccessType, ActionType, ForbiddenAction, Identity, IdentityRequirement, Keypair, Payload,
    RuleIntent, ViolationPolicy,
};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    keypair().prop_map(|kp| kp.identity())
}

pub fn action_type() -> impl Strategy<Value = ActionType> {
    (0u8..=5).prop_map(|code| ActionType::from_u8(code).unwrap_or(ActionType::Read))
}

pub fn forbidden_action() -> impl Strategy<Value = ForbiddenAction> {
    prop_oneof![
        Just(ForbiddenAction::Copy),
        Just(ForbiddenAction::Export),
        Just(ForbiddenAction::Forward),
    ]
}

/// A forbidden list, possibly with duplicates, in arbitrary order.
pub fn forbidden_list() -> impl Strategy<Value = Vec<ForbiddenAction>> {
    prop::collection::vec(forbidden_action(), 0..6)
}

/// Access scopes that do not need a whitelist.
pub fn open_access() -> impl Strategy<Value = AccessType> {
    prop_oneof![
        Just(AccessType::Any),
        Just(AccessType::Link),
        Just(AccessType::CreatorOnly),
        Just(AccessType::SingleUse),
    ]
}

pub fn identity_requirement() -> impl Strategy<Value = IdentityRequirement> {
    prop_oneof![
        Just(IdentityRequirement::Always),
        Just(IdentityRequirement::Conditional),
        Just(IdentityRequirement::Never),
    ]
}

/// Printable text, including characters the canonical encoding must escape.
pub fn text() -> impl Strategy<Value = String> {
    "[ -~\\n\\t\"\\\\é]{1,48}".prop_map(String::from)
}

pub fn payload() -> impl Strategy<Value = Payload> {
    prop_oneof![
        text().prop_map(|text| Payload::Message { text }),
        (text(), text(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(
            |(file_name, mime_type, data)| Payload::File {
                file_name,
                mime_type,
                content_ref: String::new(),
                data: Some(data),
            }
        ),
        text().prop_map(|url| Payload::Link { url }),
        (text(), text()).prop_map(|(scope, resource)| Payload::Permission { scope, resource }),
    ]
}

/// Generate a valid intent with an open access scope.
pub fn rule_intent() -> impl Strategy<Value = RuleIntent> {
    (
        "[a-z][a-z0-9 ]{0,23}",
        payload(),
        open_access(),
        forbidden_list(),
        prop_oneof![Just(0u64), 1u64..=31_536_000],
        any::<bool>(),
        0u64..10,
        identity_requirement(),
    )
        .prop_map(
            |(name, payload, access, forbidden, expiry, lock, max_uses, require)| {
                let mut intent = RuleIntent::new(name, payload)
                    .access(access)
                    .expires_in(expiry)
                    .max_uses(max_uses)
                    .require_identity(require);
                intent.forbidden = forbidden;
                if lock {
                    intent.violation = ViolationPolicy::Lock;
                }
                intent
            },
        )
}

/// An intent paired with the same intent under a shuffled forbidden list.
pub fn intent_and_permutation() -> impl Strategy<Value = (RuleIntent, RuleIntent)> {
    rule_intent().prop_flat_map(|intent| {
        let forbidden = intent.forbidden.clone();
        (Just(intent), Just(forbidden).prop_shuffle()).prop_map(|(intent, shuffled)| {
            let mut permuted = intent.clone();
            permuted.forbidden = shuffled;
            (intent, permuted)
        })
    })
}
