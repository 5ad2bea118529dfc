//! Capability links.
//!
//! A link has the form `<origin>/<id>#<key>`, where `<key>` is the exported
//! content key, base64url-encoded without padding. The fragment is never sent
//! to any server; holding the link is holding the key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rdo_core::RdoId;
use rdo_gate::ContentKey;

use crate::error::{ProtocolError, Result};

/// A parsed capability link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityLink {
    pub origin: String,
    pub id: RdoId,
    pub key: ContentKey,
}

impl CapabilityLink {
    pub fn new(origin: impl Into<String>, id: RdoId, key: ContentKey) -> Self {
        Self {
            origin: origin.into(),
            id,
            key,
        }
    }

    /// Render the link as a URL string.
    pub fn encode(&self) -> Result<String> {
        let fragment = URL_SAFE_NO_PAD.encode(self.key.export()?);
        Ok(format!(
            "{}/{}#{}",
            self.origin.trim_end_matches('/'),
            self.id,
            fragment
        ))
    }

    /// Parse a link string.
    pub fn parse(link: &str) -> Result<Self> {
        let (location, fragment) = link
            .split_once('#')
            .ok_or_else(|| ProtocolError::InvalidLink("missing key fragment".into()))?;
        let (origin, id) = location
            .rsplit_once('/')
            .ok_or_else(|| ProtocolError::InvalidLink("missing object id".into()))?;

        let id: RdoId = id
            .parse()
            .map_err(|e: rdo_core::CoreError| ProtocolError::InvalidLink(e.to_string()))?;

        let json = URL_SAFE_NO_PAD
            .decode(fragment.as_bytes())
            .map_err(|e| ProtocolError::InvalidLink(format!("key fragment: {e}")))?;
        let json = String::from_utf8(json)
            .map_err(|e| ProtocolError::InvalidLink(format!("key fragment: {e}")))?;
        let key = ContentKey::import(&json)?;

        Ok(Self {
            origin: origin.to_string(),
            id,
            key,
        })
    }
}
