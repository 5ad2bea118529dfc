//! # RDO Store
//!
//! Content-addressed blob storage for encrypted object content and metadata
//! documents.
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The async trait every backend implements
//! - [`ContentPointer`] - A content address (`b3` + hex Blake3 digest)
//! - [`SqliteContentStore`] - SQLite-backed persistent storage
//! - [`MemoryContentStore`] - In-memory storage for tests
//!
//! ## Design Notes
//!
//! - **Idempotent puts**: identical bytes always land at the same pointer
//! - **Verified reads**: a blob whose bytes no longer match its pointer is
//!   reported as [`StoreError::Corrupted`], never returned

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryContentStore;
pub use sqlite::SqliteContentStore;
pub use traits::{ContentPointer, ContentStore};
