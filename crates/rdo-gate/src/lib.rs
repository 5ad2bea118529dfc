//! # RDO Gate
//!
//! Symmetric encryption of object content.
//!
//! Each object gets a fresh 256-bit [`ContentKey`]. Content is sealed with
//! ChaCha20-Poly1305 under a random 96-bit [`Iv`]; the ciphertext goes to the
//! content store and the key travels only inside the capability link.
//!
//! ```rust
//! use rdo_gate::{decrypt, encrypt, ContentKey};
//!
//! let key = ContentKey::generate();
//! let sealed = encrypt(&key, b"hello").unwrap();
//! let opened = decrypt(&key, &sealed.iv, &sealed.ciphertext).unwrap();
//! assert_eq!(opened, b"hello");
//! ```

pub mod error;
pub mod key;
pub mod seal;

pub use error::{GateError, Result};
pub use key::ContentKey;
pub use seal::{decrypt, encrypt, Iv, Sealed};
