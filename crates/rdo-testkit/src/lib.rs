//! # RDO Testkit
//!
//! Testing utilities for Rule-Defined Objects.
//!
//! - **Golden vectors**: intents with their exact canonical rule strings
//! - **Generators**: proptest strategies for intents, identities and actions
//! - **Fixtures**: a shared store, registry and manual clock, plus a store
//!   that fails on demand
//!
//! ## Golden Vectors
//!
//! ```rust
//! use rdo_core::compile;
//! use rdo_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let compiled = compile(&(vector.intent)(), vector.now);
//!     assert_eq!(compiled.canonical, vector.expected_canonical);
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use rdo_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let alice = fixture.client(1);
//! let bob = fixture.client(2);
//! assert_ne!(alice.identity(), bob.identity());
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{identity, FlakyStore, TestFixture, FIXTURE_EPOCH};
