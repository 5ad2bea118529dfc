//! Error types for the content store.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No blob stored under this pointer.
    #[error("content not found: {0}")]
    NotFound(String),

    /// Stored bytes no longer hash to their pointer.
    #[error("content corrupted: {0}")]
    Corrupted(String),

    /// A pointer string could not be parsed.
    #[error("invalid content pointer: {0}")]
    InvalidPointer(String),

    /// The backend is temporarily unreachable. Safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A thread panicked while holding the store's lock. Not retryable.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Whether the operation may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
