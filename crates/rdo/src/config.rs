//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Configuration for a protocol [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Base URL that capability links are built on.
    pub origin: String,
    /// Extra attempts for a store operation that failed with a retryable error.
    pub store_retries: u32,
    /// Delay before the first retry. Grows linearly with each attempt.
    pub retry_backoff_ms: u64,
    /// Check the metadata document's rules hash against the registry record
    /// before requesting access.
    pub verify_metadata: bool,
    /// Image URL written into metadata documents.
    pub image: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            origin: "https://rdo.local/rdo".to_string(),
            store_retries: 3,
            retry_backoff_ms: 100,
            verify_metadata: true,
            image: "ipfs://placeholder".to_string(),
        }
    }
}

impl ProtocolConfig {
    /// Load from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ProtocolError::Config(e.to_string()))?;
        if config.origin.is_empty() || config.origin.contains('#') {
            return Err(ProtocolError::Config(format!(
                "origin {:?} is not a usable link base",
                config.origin
            )));
        }
        Ok(config)
    }
}
