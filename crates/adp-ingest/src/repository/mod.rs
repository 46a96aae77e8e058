//! Repository collaborator: record model, client trait, HTTP implementation
//!
//! The engine only talks to the repository through [`RepositoryApi`], so
//! tests can substitute an in-memory implementation and the HTTP client
//! stays a thin translation layer.

pub mod client;
pub mod endpoints;
pub mod types;

pub use types::{
    denormalize_key, is_placeholder, normalize_key, Access, AccessLevel, AlternateIdentifier,
    DraftRecord, FileEntry, FileListing, FilesOptions, IdentifierScheme, RecordId, RecordInfo,
    RecordLinks, RecordMetadata, RelatedIdentifier, RelationKind, ResourceType, DOI_PLACEHOLDER,
};

use crate::error::Result;
use async_trait::async_trait;

/// Draft/record lifecycle operations of the remote repository
///
/// Relationship edges are stored inside record metadata, so "wiring" edges
/// is an `update_draft` with amended related identifiers.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Create a new draft record and return its assigned view
    async fn create_draft(&self, draft: &DraftRecord) -> Result<RecordInfo>;

    async fn get_draft(&self, id: &str) -> Result<DraftRecord>;

    async fn update_draft(&self, id: &str, draft: &DraftRecord) -> Result<()>;

    async fn delete_draft(&self, id: &str) -> Result<()>;

    /// Move a draft to the published, immutable state
    async fn publish_draft(&self, id: &str) -> Result<RecordInfo>;

    /// Create a new version of a published record as a fresh draft
    async fn new_version(&self, id: &str) -> Result<DraftRecord>;

    /// Derive an editable draft from a published record without versioning it
    async fn draft_from_published(&self, id: &str) -> Result<DraftRecord>;

    /// Import the previous version's files into a new-version draft by reference
    async fn import_files(&self, draft_id: &str) -> Result<()>;

    /// Ids of every draft record currently owned by this client
    async fn list_drafts(&self) -> Result<Vec<String>>;

    async fn list_record_files(&self, id: &str) -> Result<FileListing>;

    async fn list_draft_files(&self, id: &str) -> Result<FileListing>;

    /// Upload one file onto a draft under the given (normalized) key
    async fn upload_draft_file(&self, id: &str, key: &str, content: Vec<u8>) -> Result<()>;

    async fn delete_draft_file(&self, id: &str, key: &str) -> Result<()>;

    async fn get_draft_file(&self, id: &str, key: &str) -> Result<Vec<u8>>;

    async fn get_record_file(&self, id: &str, key: &str) -> Result<Vec<u8>>;

    /// Find a published or draft record by exact title
    ///
    /// Title is the natural idempotency key: nothing else about a record is
    /// externally stable before identifiers are minted.
    async fn find_record_by_title(&self, title: &str) -> Result<Option<String>>;

    async fn get_record(&self, id: &str) -> Result<RecordInfo>;

    /// Whether the given id currently refers to an unpublished draft
    async fn is_draft(&self, id: &str) -> Result<bool>;

    /// Public URL of a record, used for relationship edges
    fn record_url(&self, id: &str) -> String;
}

/// Extract a record id from a record URL produced by [`RepositoryApi::record_url`]
pub fn record_id_from_url(url: &str) -> Option<&str> {
    url.rsplit_once("/records/").map(|(_, id)| id)
}
