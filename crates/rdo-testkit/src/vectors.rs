//! Golden test vectors for the rule compiler.
//!
//! Each vector pins the exact canonical string an intent compiles to. The
//! rules hash is Blake3 over those bytes, so any drift in key order, escaping
//! or number formatting shows up here first.

use rdo_core::{
    compile, AccessType, ForbiddenAction, IdentityRequirement, LegacyRules, RuleIntent, RuleSet,
    RulesHash,
};

use crate::fixtures::FIXTURE_EPOCH;

/// A golden vector for the structured (v2) schema.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Builds the intent.
    pub intent: fn() -> RuleIntent,
    /// Compile time in epoch seconds.
    pub now: u64,
    /// Expected canonical rule string.
    pub expected_canonical: &'static str,
}

impl GoldenVector {
    /// The digest the expected canonical string hashes to.
    pub fn expected_digest(&self) -> RulesHash {
        RulesHash::hash(self.expected_canonical.as_bytes())
    }
}

/// Get all structured golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Message, forward forbidden, one hour expiry",
            intent: || {
                RuleIntent::message("memo", "hello")
                    .forbid(ForbiddenAction::Forward)
                    .expires_in(3600)
            },
            now: FIXTURE_EPOCH,
            expected_canonical: concat!(
                r#"{"payload":{"text":"hello"},"rules":{"access_scope":"ANY","#,
                r#""expiry":1736874000,"forbidden":["FORWARD"],"lock_on_violation":false,"#,
                r#""max_uses":0,"require_identity":"NEVER"},"type":"MESSAGE","v":2}"#
            ),
        },
        GoldenVector {
            name: "File, copy and export forbidden, lock, three uses",
            intent: || {
                RuleIntent::file("quarterly", "q3.pdf", "application/pdf", b"%PDF-1.7".to_vec())
                    .forbid(ForbiddenAction::Export)
                    .forbid(ForbiddenAction::Copy)
                    .lock_on_violation()
                    .max_uses(3)
                    .require_identity(IdentityRequirement::Always)
            },
            now: FIXTURE_EPOCH,
            expected_canonical: concat!(
                r#"{"payload":{"contentRef":"","fileName":"q3.pdf","mimeType":"application/pdf"},"#,
                r#""rules":{"access_scope":"ANY","expiry":0,"forbidden":["COPY","EXPORT"],"#,
                r#""lock_on_violation":true,"max_uses":3,"require_identity":"ALWAYS"},"#,
                r#""type":"FILE","v":2}"#
            ),
        },
        GoldenVector {
            name: "Single-use link with quotes in the url",
            intent: || {
                RuleIntent::link("invite", r#"https://example.com/a?b="c""#)
                    .access(AccessType::SingleUse)
            },
            now: 0,
            expected_canonical: concat!(
                r#"{"payload":{"url":"https://example.com/a?b=\"c\""},"#,
                r#""rules":{"access_scope":"SINGLE_USE","expiry":0,"forbidden":[],"#,
                r#""lock_on_violation":false,"max_uses":1,"require_identity":"NEVER"},"#,
                r#""type":"LINK","v":2}"#
            ),
        },
        GoldenVector {
            name: "Creator-only permission",
            intent: || {
                RuleIntent::permission("grant", "read", "docs/1")
                    .access(AccessType::CreatorOnly)
                    .require_identity(IdentityRequirement::Conditional)
            },
            now: FIXTURE_EPOCH,
            expected_canonical: concat!(
                r#"{"payload":{"resource":"docs/1","scope":"read"},"#,
                r#""rules":{"access_scope":"CREATOR_ONLY","expiry":0,"forbidden":[],"#,
                r#""lock_on_violation":false,"max_uses":0,"require_identity":"CONDITIONAL"},"#,
                r#""type":"PERMISSION","v":2}"#
            ),
        },
    ]
}

/// A golden vector for the legacy (v1) schema.
#[derive(Debug, Clone)]
pub struct LegacyVector {
    pub name: &'static str,
    pub rules: LegacyRules,
    /// Expected packed bytes (hex).
    pub expected_packed: &'static str,
}

/// Get all legacy golden vectors.
pub fn legacy_vectors() -> Vec<LegacyVector> {
    vec![
        LegacyVector {
            name: "Expiring, forwarding not allowed",
            rules: LegacyRules {
                expiry: 1_736_874_000,
                allow_forward: false,
            },
            expected_packed: concat!(
                "0000000000000000000000000000000000000000000000000000000067869810",
                "00"
            ),
        },
        LegacyVector {
            name: "Never expires, forwarding allowed",
            rules: LegacyRules {
                expiry: 0,
                allow_forward: true,
            },
            expected_packed: concat!(
                "0000000000000000000000000000000000000000000000000000000000000000",
                "01"
            ),
        },
    ]
}

/// Compile every structured vector and report the ones that drift.
pub fn verify_vectors() -> Vec<(&'static str, String)> {
    all_vectors()
        .into_iter()
        .filter_map(|v| {
            let compiled = compile(&(v.intent)(), v.now);
            (compiled.canonical != v.expected_canonical || compiled.digest != v.expected_digest())
                .then(|| (v.name, compiled.canonical))
        })
        .collect()
}
