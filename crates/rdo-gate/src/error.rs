//! Error types for the encryption gate.

use thiserror::Error;

/// Errors that can occur while sealing or opening content.
#[derive(Debug, Error)]
pub enum GateError {
    /// Encryption failed.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Wrong key, wrong nonce, or tampered ciphertext.
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decryption,

    /// An exported key could not be parsed.
    #[error("invalid key encoding: {0}")]
    InvalidKey(String),

    /// A nonce could not be parsed.
    #[error("invalid iv: {0}")]
    InvalidIv(String),
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
