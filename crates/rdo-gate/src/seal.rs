//! Authenticated encryption of content.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};
use crate::key::ContentKey;

/// A 96-bit nonce. Fresh for every encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iv(pub [u8; 12]);

impl Iv {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|e| GateError::InvalidIv(e.to_string()))?;
        let arr: [u8; 12] = bytes
            .try_into()
            .map_err(|_| GateError::InvalidIv("iv must be 12 bytes".into()))?;
        Ok(Self(arr))
    }
}

/// Ciphertext plus the nonce needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub iv: Iv,
    /// Includes the 16-byte authentication tag.
    pub ciphertext: Vec<u8>,
}

impl Sealed {
    /// Open with the given key.
    pub fn open(&self, key: &ContentKey) -> Result<Vec<u8>> {
        decrypt(key, &self.iv, &self.ciphertext)
    }

    pub fn ciphertext_hex(&self) -> String {
        hex::encode(&self.ciphertext)
    }
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(key: &ContentKey, plaintext: &[u8]) -> Result<Sealed> {
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| GateError::Encryption(e.to_string()))?;

    let iv = Iv::generate();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv.0), plaintext)
        .map_err(|e| GateError::Encryption(e.to_string()))?;

    Ok(Sealed { iv, ciphertext })
}

/// Decrypt `ciphertext` with `key` and `iv`.
///
/// Fails with [`GateError::Decryption`] on a wrong key, wrong nonce, or any
/// modification of the ciphertext.
pub fn decrypt(key: &ContentKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher =
        ChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| GateError::Decryption)?;

    cipher
        .decrypt(Nonce::from_slice(&iv.0), ciphertext)
        .map_err(|_| GateError::Decryption)
}
