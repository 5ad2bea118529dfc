//! Content keys and their portable export format.
//!
//! An exported key is a small JSON document:
//!
//! ```json
//! {"alg":"C20P","ext":true,"k":"<base64url, no padding>","kty":"oct"}
//! ```

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GateError, Result};

const KEY_TYPE: &str = "oct";
const KEY_ALG: &str = "C20P";

/// A 256-bit symmetric key for ChaCha20-Poly1305.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey([u8; 32]);

#[derive(Serialize, Deserialize)]
struct ExportedKey {
    alg: String,
    ext: bool,
    k: String,
    kty: String,
}

impl ContentKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Export to the portable JSON form.
    pub fn export(&self) -> Result<String> {
        let exported = ExportedKey {
            alg: KEY_ALG.to_string(),
            ext: true,
            k: URL_SAFE_NO_PAD.encode(self.0),
            kty: KEY_TYPE.to_string(),
        };
        serde_json::to_string(&exported).map_err(|e| GateError::InvalidKey(e.to_string()))
    }

    /// Import from the portable JSON form.
    pub fn import(json: &str) -> Result<Self> {
        let exported: ExportedKey =
            serde_json::from_str(json).map_err(|e| GateError::InvalidKey(e.to_string()))?;

        if exported.kty != KEY_TYPE {
            return Err(GateError::InvalidKey(format!(
                "unsupported key type {:?}",
                exported.kty
            )));
        }
        if exported.alg != KEY_ALG {
            return Err(GateError::InvalidKey(format!(
                "unsupported algorithm {:?}",
                exported.alg
            )));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(exported.k.as_bytes())
            .map_err(|e| GateError::InvalidKey(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| GateError::InvalidKey("key must be 32 bytes".into()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(<redacted>)")
    }
}
