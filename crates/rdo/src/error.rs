//! Error types for the protocol client.

use rdo_core::{RulesHash, ValidationError};
use rdo_gate::GateError;
use rdo_registry::RegistryError;
use rdo_store::StoreError;
use thiserror::Error;

/// Errors that can occur during protocol operations.
///
/// A refused action is not an error; see [`AccessOutcome`](crate::AccessOutcome).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The creator's intent is invalid.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Content store error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Registry error.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Encryption or decryption error.
    #[error("gate error: {0}")]
    Gate(#[from] GateError),

    /// A capability link could not be parsed.
    #[error("invalid capability link: {0}")]
    InvalidLink(String),

    /// A metadata document could not be encoded or decoded.
    #[error("invalid metadata document: {0}")]
    Metadata(String),

    /// The metadata document names different rules than the registry.
    #[error("metadata rules hash {found} does not match registry {expected}")]
    MetadataMismatch {
        expected: RulesHash,
        found: RulesHash,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
