//! Environment-based configuration for the ingest engine

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};

/// Default bound on waiting for the ingest lock, in seconds.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 600;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base URL of the draft-based repository
    pub repository_url: String,

    /// Bearer token for the repository API
    pub repository_token: Option<String>,

    /// Base URL of the identifier registrar (optional; no minting without it)
    pub registrar_url: Option<String>,

    /// Registrar account name
    pub registrar_user: Option<String>,

    /// Registrar account password
    pub registrar_password: Option<String>,

    /// Prefix under which identifiers are minted (e.g. a DOI prefix)
    pub identifier_prefix: Option<String>,

    /// Name recorded as creator on the auxiliary preservation record
    pub depositor: String,

    /// Bound on waiting for the ingest lock, in seconds
    pub lock_timeout_secs: u64,
}

impl IngestConfig {
    /// Load configuration from environment variables (reads `.env` if present)
    ///
    /// - `ADP_REPOSITORY_URL` (required)
    /// - `ADP_REPOSITORY_TOKEN`
    /// - `ADP_REGISTRAR_URL`
    /// - `ADP_REGISTRAR_USER`
    /// - `ADP_REGISTRAR_PASSWORD`
    /// - `ADP_IDENTIFIER_PREFIX`
    /// - `ADP_DEPOSITOR`
    /// - `ADP_LOCK_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let repository_url = std::env::var("ADP_REPOSITORY_URL")
            .map_err(|_| IngestError::config("ADP_REPOSITORY_URL is not set"))?;

        let lock_timeout_secs = std::env::var("ADP_LOCK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LOCK_TIMEOUT_SECS);

        Ok(Self {
            repository_url,
            repository_token: std::env::var("ADP_REPOSITORY_TOKEN").ok(),
            registrar_url: std::env::var("ADP_REGISTRAR_URL").ok(),
            registrar_user: std::env::var("ADP_REGISTRAR_USER").ok(),
            registrar_password: std::env::var("ADP_REGISTRAR_PASSWORD").ok(),
            identifier_prefix: std::env::var("ADP_IDENTIFIER_PREFIX").ok(),
            depositor: std::env::var("ADP_DEPOSITOR").unwrap_or_else(|_| "ADP".to_string()),
            lock_timeout_secs,
        })
    }

    /// Whether enough registrar settings are present to mint identifiers
    pub fn registrar_configured(&self) -> bool {
        self.registrar_url.is_some() && self.identifier_prefix.is_some()
    }
}
