//! The public metadata document stored alongside each object.
//!
//! It names the rules hash, where the ciphertext lives and the nonce it was
//! sealed with. It never contains the key.

use rdo_core::RulesHash;
use rdo_gate::Iv;
use rdo_store::ContentPointer;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub name: String,
    pub description: String,
    pub image: String,
    pub properties: MetadataProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataProperties {
    #[serde(rename = "rulesHash")]
    pub rules_hash: String,
    #[serde(rename = "encryptedContentCID")]
    pub encrypted_content_cid: String,
    pub iv: String,
    /// Epoch seconds.
    #[serde(rename = "createdAt")]
    pub created_at: u64,
}

impl MetadataDocument {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
        rules_hash: &RulesHash,
        content: &ContentPointer,
        iv: &Iv,
        created_at: u64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            image: image.into(),
            properties: MetadataProperties {
                rules_hash: rules_hash.to_string(),
                encrypted_content_cid: content.to_string(),
                iv: iv.to_hex(),
                created_at,
            },
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Metadata(e.to_string()))
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Metadata(e.to_string()))
    }

    pub fn rules_hash(&self) -> Result<RulesHash> {
        RulesHash::from_hex(&self.properties.rules_hash)
            .map_err(|e| ProtocolError::Metadata(format!("rulesHash: {e}")))
    }

    pub fn content_pointer(&self) -> Result<ContentPointer> {
        self.properties
            .encrypted_content_cid
            .parse()
            .map_err(|e| ProtocolError::Metadata(format!("encryptedContentCID: {e}")))
    }

    pub fn iv(&self) -> Result<Iv> {
        Iv::from_hex(&self.properties.iv)
            .map_err(|e| ProtocolError::Metadata(format!("iv: {e}")))
    }
}
