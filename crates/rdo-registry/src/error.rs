//! Error types for the registry.
//!
//! A refused action is not an error; it is a [`Verdict`](crate::Verdict).

use rdo_core::RdoId;
use thiserror::Error;

use crate::event::EventRef;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No object with this id.
    #[error("object not found: {0}")]
    NotFound(RdoId),

    /// Malformed input. Rejected without any state change.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// No event at this log position.
    #[error("event not found: {0}")]
    EventNotFound(EventRef),

    /// The event exists but is not a refusal.
    #[error("event {0} is not a refusal")]
    NotARefusal(EventRef),

    /// Snapshot encoding or decoding failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
