//! The rule compiler: creator intent in, canonical rule set and digest out.
//!
//! Compilation is a pure function of the intent and the compile time. Two
//! intents that differ only in ordering (the forbidden-action list) compile to
//! byte-identical canonical strings and therefore identical digests.
//!
//! ## Schema versions
//!
//! - **v1 (legacy)**: two fields, `expiry` and `allow_forward`, hashed as a
//!   packed `u256 || bool`.
//! - **v2 (structured)**: the full canonical object produced by [`compile`].
//!
//! [`RuleSet`] dispatches on the version so that digests minted under either
//! schema can be re-derived and checked.

use serde::{Deserialize, Serialize};

use crate::canonical::{encode_canonical, CanonicalValue};
use crate::crypto::{Identity, RulesHash};
use crate::error::ValidationError;
use crate::types::{AccessType, ObjectType};

/// Rule schema version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SchemaVersion {
    Legacy = 1,
    Structured = 2,
}

impl SchemaVersion {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Legacy),
            2 => Some(Self::Structured),
            _ => None,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Actions a creator can forbid. READ is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ForbiddenAction {
    // Declaration order is alphabetical so the derived Ord sorts by name.
    Copy,
    Export,
    Forward,
}

impl ForbiddenAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Copy => "COPY",
            Self::Export => "EXPORT",
            Self::Forward => "FORWARD",
        }
    }
}

/// What happens when a forbidden action is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViolationPolicy {
    /// Refuse the action; the object stays usable.
    #[default]
    Refuse,
    /// Refuse the action and lock the object permanently.
    Lock,
}

/// Whether actors must present a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdentityRequirement {
    Always,
    Conditional,
    #[default]
    Never,
}

impl IdentityRequirement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "ALWAYS",
            Self::Conditional => "CONDITIONAL",
            Self::Never => "NEVER",
        }
    }
}

/// Type-specific content of an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Message {
        text: String,
    },
    File {
        file_name: String,
        mime_type: String,
        content_ref: String,
        /// Raw file bytes. Client-side only, never hashed.
        data: Option<Vec<u8>>,
    },
    Link {
        url: String,
    },
    Permission {
        scope: String,
        resource: String,
    },
}

impl Payload {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Message { .. } => ObjectType::Message,
            Self::File { .. } => ObjectType::File,
            Self::Link { .. } => ObjectType::Link,
            Self::Permission { .. } => ObjectType::Permission,
        }
    }

    /// Strip non-hashable fields, leaving only metadata.
    pub fn descriptor(&self) -> PayloadDescriptor {
        match self {
            Self::Message { text } => PayloadDescriptor::Message { text: text.clone() },
            Self::File {
                file_name,
                mime_type,
                content_ref,
                data: _,
            } => PayloadDescriptor::File {
                file_name: file_name.clone(),
                mime_type: mime_type.clone(),
                content_ref: content_ref.clone(),
            },
            Self::Link { url } => PayloadDescriptor::Link { url: url.clone() },
            Self::Permission { scope, resource } => PayloadDescriptor::Permission {
                scope: scope.clone(),
                resource: resource.clone(),
            },
        }
    }
}

/// The hashable part of a [`Payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadDescriptor {
    Message {
        text: String,
    },
    File {
        file_name: String,
        mime_type: String,
        content_ref: String,
    },
    Link {
        url: String,
    },
    Permission {
        scope: String,
        resource: String,
    },
}

impl PayloadDescriptor {
    fn to_value(&self) -> CanonicalValue {
        match self {
            Self::Message { text } => CanonicalValue::object([("text", CanonicalValue::text(text))]),
            Self::File {
                file_name,
                mime_type,
                content_ref,
            } => CanonicalValue::object([
                ("contentRef", CanonicalValue::text(content_ref)),
                ("fileName", CanonicalValue::text(file_name)),
                ("mimeType", CanonicalValue::text(mime_type)),
            ]),
            Self::Link { url } => CanonicalValue::object([("url", CanonicalValue::text(url))]),
            Self::Permission { scope, resource } => CanonicalValue::object([
                ("resource", CanonicalValue::text(resource)),
                ("scope", CanonicalValue::text(scope)),
            ]),
        }
    }
}

/// A creator's intent. Ephemeral; never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIntent {
    pub name: String,
    pub description: String,
    pub payload: Payload,
    pub access: AccessType,
    pub forbidden: Vec<ForbiddenAction>,
    /// Relative lifetime in seconds; 0 means never expires.
    pub expiry_seconds: u64,
    pub violation: ViolationPolicy,
    /// 0 means unlimited.
    pub max_uses: u64,
    pub require_identity: IdentityRequirement,
    pub whitelist: Vec<Identity>,
}

impl RuleIntent {
    /// Start an intent with permissive defaults.
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            payload,
            access: AccessType::Any,
            forbidden: Vec::new(),
            expiry_seconds: 0,
            violation: ViolationPolicy::Refuse,
            max_uses: 0,
            require_identity: IdentityRequirement::Never,
            whitelist: Vec::new(),
        }
    }

    pub fn message(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Payload::Message { text: text.into() })
    }

    pub fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Payload::Link { url: url.into() })
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self::new(
            name,
            Payload::File {
                file_name: file_name.into(),
                mime_type: mime_type.into(),
                content_ref: String::new(),
                data: Some(data),
            },
        )
    }

    pub fn permission(
        name: impl Into<String>,
        scope: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            Payload::Permission {
                scope: scope.into(),
                resource: resource.into(),
            },
        )
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn forbid(mut self, action: ForbiddenAction) -> Self {
        self.forbidden.push(action);
        self
    }

    pub fn access(mut self, access: AccessType) -> Self {
        self.access = access;
        self
    }

    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.expiry_seconds = seconds;
        self
    }

    pub fn lock_on_violation(mut self) -> Self {
        self.violation = ViolationPolicy::Lock;
        self
    }

    pub fn max_uses(mut self, max_uses: u64) -> Self {
        self.max_uses = max_uses;
        self
    }

    pub fn require_identity(mut self, requirement: IdentityRequirement) -> Self {
        self.require_identity = requirement;
        self
    }

    /// Restrict access to the given identities (sets LIST access).
    pub fn whitelist(mut self, identities: impl IntoIterator<Item = Identity>) -> Self {
        self.access = AccessType::List;
        self.whitelist = identities.into_iter().collect();
        self
    }

    pub fn object_type(&self) -> ObjectType {
        self.payload.object_type()
    }

    /// Check the intent for mistakes a creator should fix before minting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        match &self.payload {
            Payload::Message { text } if text.is_empty() => {
                return Err(ValidationError::EmptyPayloadField("text"));
            }
            Payload::Link { url } if url.is_empty() => {
                return Err(ValidationError::EmptyPayloadField("url"));
            }
            Payload::Permission { resource, .. } if resource.is_empty() => {
                return Err(ValidationError::EmptyPayloadField("resource"));
            }
            _ => {}
        }
        match self.access {
            AccessType::List if self.whitelist.is_empty() => Err(ValidationError::EmptyWhitelist),
            AccessType::List => Ok(()),
            _ if !self.whitelist.is_empty() => Err(ValidationError::WhitelistWithoutList),
            _ => Ok(()),
        }
    }
}

/// The rules block of a structured rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBlock {
    pub access_scope: AccessType,
    /// Sorted, no duplicates.
    pub forbidden: Vec<ForbiddenAction>,
    /// Absolute epoch seconds; 0 = never.
    pub expiry: u64,
    /// 0 = unlimited.
    pub max_uses: u64,
    pub lock_on_violation: bool,
    pub require_identity: IdentityRequirement,
}

/// A structured (v2) canonical rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRules {
    pub object_type: ObjectType,
    pub payload: PayloadDescriptor,
    pub rules: RuleBlock,
}

impl CanonicalRules {
    fn to_value(&self) -> CanonicalValue {
        let r = &self.rules;
        let forbidden = r
            .forbidden
            .iter()
            .map(|a| CanonicalValue::text(a.as_str()))
            .collect();

        CanonicalValue::object([
            ("payload", self.payload.to_value()),
            (
                "rules",
                CanonicalValue::object([
                    ("access_scope", CanonicalValue::text(r.access_scope.as_str())),
                    ("expiry", CanonicalValue::Integer(r.expiry)),
                    ("forbidden", CanonicalValue::Array(forbidden)),
                    ("lock_on_violation", CanonicalValue::Bool(r.lock_on_violation)),
                    ("max_uses", CanonicalValue::Integer(r.max_uses)),
                    ("require_identity", CanonicalValue::text(r.require_identity.as_str())),
                ]),
            ),
            ("type", CanonicalValue::text(self.object_type.as_str())),
            (
                "v",
                CanonicalValue::Integer(SchemaVersion::Structured.to_u8().into()),
            ),
        ])
    }

    /// The canonical serialization that gets hashed.
    pub fn canonical_string(&self) -> String {
        encode_canonical(&self.to_value())
    }

    /// Project onto the compact struct the registry evaluates.
    pub fn compact(&self) -> CompactRules {
        let r = &self.rules;
        CompactRules {
            forbid_copy: r.forbidden.contains(&ForbiddenAction::Copy),
            forbid_forward: r.forbidden.contains(&ForbiddenAction::Forward),
            forbid_export: r.forbidden.contains(&ForbiddenAction::Export),
            expiry: r.expiry,
            access_type: r.access_scope,
            max_uses: r.max_uses,
            lock_on_violation: r.lock_on_violation,
            require_identity: r.require_identity == IdentityRequirement::Always,
        }
    }
}

/// The legacy (v1) two-field rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyRules {
    pub expiry: u64,
    pub allow_forward: bool,
}

impl LegacyRules {
    /// Packed encoding: `expiry` as a 32-byte big-endian integer, then one bool byte.
    pub fn packed_bytes(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 24];
        buf.extend_from_slice(&self.expiry.to_be_bytes());
        buf.push(u8::from(self.allow_forward));
        buf
    }

    pub fn compact(&self) -> CompactRules {
        CompactRules {
            forbid_forward: !self.allow_forward,
            expiry: self.expiry,
            ..CompactRules::default()
        }
    }
}

/// The fixed-size rule struct stored and evaluated by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompactRules {
    pub forbid_copy: bool,
    pub forbid_forward: bool,
    pub forbid_export: bool,
    /// Absolute epoch seconds; 0 = never.
    pub expiry: u64,
    pub access_type: AccessType,
    /// 0 = unlimited.
    pub max_uses: u64,
    pub lock_on_violation: bool,
    pub require_identity: bool,
}

/// A rule set under any supported schema version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSet {
    Legacy(LegacyRules),
    Structured(CanonicalRules),
}

impl RuleSet {
    pub fn version(&self) -> SchemaVersion {
        match self {
            Self::Legacy(_) => SchemaVersion::Legacy,
            Self::Structured(_) => SchemaVersion::Structured,
        }
    }

    /// The exact bytes the digest is computed over.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        match self {
            Self::Legacy(rules) => rules.packed_bytes(),
            Self::Structured(rules) => rules.canonical_string().into_bytes(),
        }
    }

    pub fn digest(&self) -> RulesHash {
        RulesHash::hash(&self.canonical_bytes())
    }

    pub fn compact(&self) -> CompactRules {
        match self {
            Self::Legacy(rules) => rules.compact(),
            Self::Structured(rules) => rules.compact(),
        }
    }
}

/// Output of [`compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRules {
    pub canonical: String,
    pub digest: RulesHash,
    pub rules: CanonicalRules,
    pub compact: CompactRules,
}

impl CompiledRules {
    pub fn rule_set(&self) -> RuleSet {
        RuleSet::Structured(self.rules.clone())
    }
}

/// Compile an intent into its canonical form and digest.
///
/// `now` is the compile time in epoch seconds; a relative expiry is resolved
/// against it. Malformed intents are compiled as given; see
/// [`RuleIntent::validate`].
pub fn compile(intent: &RuleIntent, now: u64) -> CompiledRules {
    let mut forbidden = intent.forbidden.clone();
    forbidden.sort();
    forbidden.dedup();

    let expiry = match intent.expiry_seconds {
        0 => 0,
        secs => now.saturating_add(secs),
    };

    let max_uses = match (intent.access, intent.max_uses) {
        (AccessType::SingleUse, 0) => 1,
        (_, n) => n,
    };

    let rules = CanonicalRules {
        object_type: intent.object_type(),
        payload: intent.payload.descriptor(),
        rules: RuleBlock {
            access_scope: intent.access,
            forbidden,
            expiry,
            max_uses,
            lock_on_violation: intent.violation == ViolationPolicy::Lock,
            require_identity: intent.require_identity,
        },
    };

    let canonical = rules.canonical_string();
    let digest = RulesHash::hash(canonical.as_bytes());
    let compact = rules.compact();

    CompiledRules {
        canonical,
        digest,
        rules,
        compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use proptest::prelude::*;

    const NOW: u64 = 1_736_870_400;

    #[test]
    fn test_canonical_string_exact() {
        let intent = RuleIntent::message("memo", "hello")
            .forbid(ForbiddenAction::Forward)
            .expires_in(3600);
        let compiled = compile(&intent, NOW);

        assert_eq!(
            compiled.canonical,
            concat!(
                r#"{"payload":{"text":"hello"},"#,
                r#""rules":{"access_scope":"ANY","expiry":1736874000,"forbidden":["FORWARD"],"#,
                r#""lock_on_violation":false,"max_uses":0,"require_identity":"NEVER"},"#,
                r#""type":"MESSAGE","v":2}"#
            )
        );
        assert_eq!(compiled.digest, RulesHash::hash(compiled.canonical.as_bytes()));
    }

    #[test]
    fn test_forbidden_order_does_not_change_digest() {
        let a = RuleIntent::message("memo", "x")
            .forbid(ForbiddenAction::Export)
            .forbid(ForbiddenAction::Copy);
        let b = RuleIntent::message("memo", "x")
            .forbid(ForbiddenAction::Copy)
            .forbid(ForbiddenAction::Export);

        let ca = compile(&a, NOW);
        let cb = compile(&b, NOW);
        assert_eq!(ca.canonical, cb.canonical);
        assert_eq!(ca.digest, cb.digest);
    }

    #[test]
    fn test_duplicate_forbidden_collapses() {
        let a = RuleIntent::message("memo", "x")
            .forbid(ForbiddenAction::Copy)
            .forbid(ForbiddenAction::Copy);
        let b = RuleIntent::message("memo", "x").forbid(ForbiddenAction::Copy);
        assert_eq!(compile(&a, NOW).digest, compile(&b, NOW).digest);
    }

    #[test]
    fn test_zero_expiry_stays_zero() {
        let compiled = compile(&RuleIntent::message("memo", "x"), NOW);
        assert_eq!(compiled.rules.rules.expiry, 0);
        assert_eq!(compiled.compact.expiry, 0);
    }

    #[test]
    fn test_file_bytes_are_not_hashed() {
        let a = RuleIntent::file("report", "q3.pdf", "application/pdf", vec![1, 2, 3]);
        let b = RuleIntent::file("report", "q3.pdf", "application/pdf", vec![9, 9, 9, 9]);
        assert_eq!(compile(&a, NOW).digest, compile(&b, NOW).digest);
        assert!(compile(&a, NOW).canonical.contains(r#""fileName":"q3.pdf""#));
    }

    #[test]
    fn test_display_name_is_not_hashed() {
        let a = RuleIntent::message("one", "x").description("first");
        let b = RuleIntent::message("two", "x").description("second");
        assert_eq!(compile(&a, NOW).digest, compile(&b, NOW).digest);
    }

    #[test]
    fn test_semantic_change_changes_digest() {
        let base = RuleIntent::message("memo", "x");
        let locked = base.clone().lock_on_violation();
        let capped = base.clone().max_uses(3);
        let d = compile(&base, NOW).digest;
        assert_ne!(d, compile(&locked, NOW).digest);
        assert_ne!(d, compile(&capped, NOW).digest);
    }

    #[test]
    fn test_compact_projection() {
        let intent = RuleIntent::file("f", "a.bin", "application/octet-stream", vec![])
            .forbid(ForbiddenAction::Copy)
            .forbid(ForbiddenAction::Export)
            .lock_on_violation()
            .max_uses(5)
            .require_identity(IdentityRequirement::Always);
        let compact = compile(&intent, NOW).compact;

        assert!(compact.forbid_copy);
        assert!(compact.forbid_export);
        assert!(!compact.forbid_forward);
        assert!(compact.lock_on_violation);
        assert!(compact.require_identity);
        assert_eq!(compact.max_uses, 5);
        assert_eq!(compact.access_type, AccessType::Any);
    }

    #[test]
    fn test_single_use_gets_budget_of_one() {
        let intent = RuleIntent::link("l", "https://example.com").access(AccessType::SingleUse);
        assert_eq!(compile(&intent, NOW).compact.max_uses, 1);

        let explicit = intent.max_uses(4);
        assert_eq!(compile(&explicit, NOW).compact.max_uses, 4);
    }

    #[test]
    fn test_validate() {
        assert!(RuleIntent::message("m", "x").validate().is_ok());
        assert_eq!(
            RuleIntent::message(" ", "x").validate(),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            RuleIntent::message("m", "").validate(),
            Err(ValidationError::EmptyPayloadField("text"))
        );
        assert_eq!(
            RuleIntent::message("m", "x").access(AccessType::List).validate(),
            Err(ValidationError::EmptyWhitelist)
        );

        let mut stray = RuleIntent::message("m", "x");
        stray.whitelist.push(Keypair::generate().identity());
        assert_eq!(stray.validate(), Err(ValidationError::WhitelistWithoutList));

        let listed = RuleIntent::message("m", "x").whitelist([Keypair::generate().identity()]);
        assert!(listed.validate().is_ok());
    }

    #[test]
    fn test_legacy_packed_encoding() {
        let legacy = LegacyRules {
            expiry: 0x0102,
            allow_forward: true,
        };
        let bytes = legacy.packed_bytes();
        assert_eq!(bytes.len(), 33);
        assert_eq!(&bytes[30..], &[0x01, 0x02, 0x01]);
        assert!(bytes[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_rule_set_dispatches_on_version() {
        let legacy = RuleSet::Legacy(LegacyRules {
            expiry: 100,
            allow_forward: false,
        });
        assert_eq!(legacy.version(), SchemaVersion::Legacy);
        assert!(legacy.compact().forbid_forward);
        assert_eq!(legacy.digest(), RulesHash::hash(&legacy.canonical_bytes()));

        let compiled = compile(&RuleIntent::message("m", "x"), NOW);
        let structured = compiled.rule_set();
        assert_eq!(structured.version(), SchemaVersion::Structured);
        assert_eq!(structured.digest(), compiled.digest);
        assert_ne!(legacy.digest(), structured.digest());
    }

    fn forbidden_list() -> impl Strategy<Value = Vec<ForbiddenAction>> {
        prop::collection::vec(
            prop_oneof![
                Just(ForbiddenAction::Copy),
                Just(ForbiddenAction::Export),
                Just(ForbiddenAction::Forward),
            ],
            0..6,
        )
    }

    proptest! {
        #[test]
        fn prop_permuting_forbidden_is_stable(
            list in forbidden_list(),
            text in "[ -~]{0,40}",
            expiry in 0u64..100_000,
            now in 0u64..4_000_000_000,
        ) {
            let mut reversed = list.clone();
            reversed.reverse();

            let mut a = RuleIntent::message("m", text.clone()).expires_in(expiry);
            a.forbidden = list;
            let mut b = RuleIntent::message("m", text).expires_in(expiry);
            b.forbidden = reversed;

            let ca = compile(&a, now);
            let cb = compile(&b, now);
            prop_assert_eq!(ca.canonical, cb.canonical);
            prop_assert_eq!(ca.digest, cb.digest);
        }

        #[test]
        fn prop_compile_is_pure(text in ".{0,64}", now in any::<u64>()) {
            let intent = RuleIntent::message("m", text).expires_in(60);
            prop_assert_eq!(compile(&intent, now), compile(&intent, now));
        }
    }
}
