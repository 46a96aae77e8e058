//! Record model shared by the repository trait and its HTTP client

use adp_common::checksum::ChecksumString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Path separator used in remote file keys instead of `/`, which is
/// awkward inside URLs.
pub const KEY_SEPARATOR: char = '>';

/// Sentinel substring marking an identifier value as "not yet minted"
pub const PID_PLACEHOLDER: &str = "NOTYET";

/// Canonical placeholder value for a DOI that has not been minted yet
pub const DOI_PLACEHOLDER: &str = "10.0/NOTYET";

/// Whether an identifier value is a placeholder and must never be
/// treated as final
pub fn is_placeholder(value: &str) -> bool {
    value.contains(PID_PLACEHOLDER)
}

/// Turn a package-relative path into a remote file key
pub fn normalize_key(name: &str) -> String {
    name.replace('/', &KEY_SEPARATOR.to_string())
}

/// Turn a remote file key back into a package-relative path
pub fn denormalize_key(key: &str) -> String {
    key.replace(KEY_SEPARATOR, "/")
}

/// Identifier of a remote record, tagged by lifecycle state
///
/// Draft records support mutation; published records are read-only and
/// only reachable through the relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordId {
    Draft(String),
    Published(String),
}

impl RecordId {
    pub fn id(&self) -> &str {
        match self {
            RecordId::Draft(id) | RecordId::Published(id) => id,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, RecordId::Draft(_))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Draft(id) => write!(f, "draft:{id}"),
            RecordId::Published(id) => write!(f, "record:{id}"),
        }
    }
}

/// Access level of a record or its file bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Restricted,
}

/// Record access policy: the descriptive metadata is always public,
/// file access covers the whole bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    pub record: AccessLevel,
    pub files: AccessLevel,
}

impl Access {
    /// Public metadata with the given file access
    pub fn with_files(files: AccessLevel) -> Self {
        Self {
            record: AccessLevel::Public,
            files,
        }
    }
}

/// Scheme of a persistent identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierScheme {
    Doi,
    Handle,
    Ark,
    Url,
}

/// Externally assigned identifier attached to a record's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateIdentifier {
    pub scheme: IdentifierScheme,
    pub value: String,
}

impl AlternateIdentifier {
    pub fn new(scheme: IdentifierScheme, value: impl Into<String>) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }

    pub fn is_doi_placeholder(&self) -> bool {
        self.scheme == IdentifierScheme::Doi && is_placeholder(&self.value)
    }
}

/// Controlled-vocabulary relation between two records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    HasPart,
    IsPartOf,
    Describes,
    IsDescribedBy,
}

/// Typed edge from a record to another resource, stored in the record's
/// descriptive metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedIdentifier {
    /// Target, as a resolvable URL
    pub identifier: String,
    pub scheme: IdentifierScheme,
    pub relation: RelationKind,
}

impl RelatedIdentifier {
    /// URL-scheme edge, the form used for record-to-record links
    pub fn record_link(url: impl Into<String>, relation: RelationKind) -> Self {
        Self {
            identifier: url.into(),
            scheme: IdentifierScheme::Url,
            relation,
        }
    }
}

/// Resource type of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Dataset,
    Other,
}

/// Descriptive metadata of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub title: String,
    pub resource_type: ResourceType,
    pub creators: Vec<String>,
    /// ISO date (YYYY-MM-DD)
    pub publication_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub alternate_identifiers: Vec<AlternateIdentifier>,
    #[serde(default)]
    pub related_identifiers: Vec<RelatedIdentifier>,
}

impl RecordMetadata {
    pub fn new(title: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            title: title.into(),
            resource_type,
            creators: Vec::new(),
            publication_date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            description: None,
            alternate_identifiers: Vec::new(),
            related_identifiers: Vec::new(),
        }
    }

    /// First identifier of the given scheme, if any
    pub fn first_identifier(&self, scheme: IdentifierScheme) -> Option<&AlternateIdentifier> {
        self.alternate_identifiers
            .iter()
            .find(|i| i.scheme == scheme)
    }

    /// Related identifiers with the given relation
    pub fn related(&self, relation: RelationKind) -> impl Iterator<Item = &RelatedIdentifier> {
        self.related_identifiers
            .iter()
            .filter(move |r| r.relation == relation)
    }
}

/// File options of a draft: whether the record carries files at all, and
/// which file key is shown as the default preview
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesOptions {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_preview: Option<String>,
}

impl FilesOptions {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            default_preview: None,
        }
    }
}

/// Link map of a record; `record_html` is the public landing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_html: Option<String>,
}

/// A mutable draft record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    /// Absent until the repository has assigned an id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub access: Access,
    pub files: FilesOptions,
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub links: RecordLinks,
}

impl DraftRecord {
    pub fn new(access: Access, files: FilesOptions, metadata: RecordMetadata) -> Self {
        Self {
            id: None,
            access,
            files,
            metadata,
            links: RecordLinks::default(),
        }
    }
}

/// An immutable view of a record as returned by the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordInfo {
    pub id: String,
    pub is_published: bool,
    pub metadata: RecordMetadata,
    #[serde(default)]
    pub links: RecordLinks,
}

/// One entry of a remote file listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Remote key (normalized, `>`-separated)
    pub key: String,
    /// `<algorithm>:<hex>` content checksum
    pub checksum: String,
}

/// Remote file listing of a record or draft
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListing {
    pub entries: Vec<FileEntry>,
}

impl FileListing {
    /// Index the listing by package-relative filename
    ///
    /// Recomputed per operation and never persisted; used both for
    /// idempotent-update detection and post-upload validation.
    pub fn checksum_index(&self) -> crate::Result<HashMap<String, ChecksumString>> {
        let mut index = HashMap::new();
        for entry in &self.entries {
            let checksum = entry
                .checksum
                .parse::<ChecksumString>()
                .map_err(adp_common::AdpError::from)?;
            index.insert(denormalize_key(&entry.key), checksum);
        }
        Ok(index)
    }
}
