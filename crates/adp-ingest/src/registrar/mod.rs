//! Identifier registrar collaborator
//!
//! Mints draft identifiers under a configured prefix, pushes landing-page
//! metadata, and moves drafts to findable or deletes them wholesale. Kept
//! behind a trait so the engine and tests never depend on the wire shape.

pub mod client;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A freshly minted draft identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedIdentifier {
    /// Full identifier, `<prefix>/<suffix>`
    pub id: String,
    /// Registrar-assigned suffix
    pub suffix: String,
}

/// Landing-page metadata pushed to the registrar alongside a minted
/// identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarMetadata {
    pub title: String,
    #[serde(default)]
    pub creators: Vec<String>,
    pub publication_year: i32,
    /// Landing page the identifier resolves to
    pub url: String,
}

/// Draft-identifier lifecycle at the external registrar
#[async_trait]
pub trait RegistrarApi: Send + Sync {
    /// Mint a new draft identifier under the prefix
    async fn mint_draft(&self, prefix: &str) -> Result<MintedIdentifier>;

    /// Attach or update landing-page metadata for an identifier
    async fn update_metadata(&self, id: &str, metadata: &RegistrarMetadata) -> Result<()>;

    /// Move every draft identifier under the prefix to the findable state
    async fn publish_all_drafts(&self, prefix: &str) -> Result<()>;

    /// Delete every draft identifier under the prefix
    ///
    /// Only drafts can be deleted; findable identifiers are permanent, which
    /// is exactly why publication is the last step of an ingest.
    async fn delete_all_drafts(&self, prefix: &str) -> Result<()>;
}
