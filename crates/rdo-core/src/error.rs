//! Error types for the RDO core.

use thiserror::Error;

/// Core errors that can occur while decoding primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown object type code: {0}")]
    UnknownObjectType(u8),

    #[error("unknown action type code: {0}")]
    UnknownActionType(u8),

    #[error("unknown access type code: {0}")]
    UnknownAccessType(u8),

    #[error("unsupported rule schema version: {0}")]
    UnsupportedVersion(u8),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Problems with a creator's intent.
///
/// These are reported by [`RuleIntent::validate`](crate::rules::RuleIntent::validate)
/// for the caller to surface. The compiler itself never raises them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("object name must not be empty")]
    EmptyName,

    #[error("payload field `{0}` must not be empty")]
    EmptyPayloadField(&'static str),

    #[error("whitelist is only valid with LIST access")]
    WhitelistWithoutList,

    #[error("LIST access requires a non-empty whitelist")]
    EmptyWhitelist,
}
