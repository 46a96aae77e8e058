//! Depth-first upload of the resolved record tree
//!
//! Walks the mapping tree, creating or updating one remote draft per node,
//! wiring parent/child relationship links, and tracking every draft the
//! run touched so the downstream stages and the rollback path know what
//! this run owns. Children are uploaded strictly after their parent's
//! draft exists and strictly before the parent's edges are finalized.

use crate::cmdi;
use crate::error::{IngestError, Result};
use crate::mapping::{is_private_split_title, MapRecord};
use crate::repository::{
    normalize_key, Access, AccessLevel, AlternateIdentifier, DraftRecord, FilesOptions,
    IdentifierScheme, RecordId, RecordMetadata, RelatedIdentifier, RelationKind, RepositoryApi,
    ResourceType, DOI_PLACEHOLDER,
};
use adp_common::Report;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const BUCKET: &str = "uploader";

/// Title suffix of the auxiliary preservation record
pub const PRESERVATION_TITLE_SUFFIX: &str = ": Preservation information";

/// Result of a tree upload: the root's id plus every draft this run
/// created or derived, in upload order
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub root: RecordId,
    pub edited: Vec<RecordId>,
}

/// Behavior switches for the tree walk
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Whether an existing record with the same title may be versioned
    /// instead of being a conflict
    pub update_existing: bool,
    /// Whether an up-to-date record's children are skipped entirely
    pub skip_unchanged_subtrees: bool,
    /// Creator name stamped on every record this run creates
    pub depositor: String,
}

pub struct RecordTreeUploader<'a> {
    repository: &'a dyn RepositoryApi,
    package_root: &'a Path,
    policy: UploadPolicy,
}

/// Context a node inherits from its parent
#[derive(Debug, Clone)]
struct ParentScope {
    title: String,
    metadata_path: Option<String>,
    record_id: String,
}

struct NodeOutcome {
    id: RecordId,
    title: String,
}

/// How an existing record compares to what the mapping expects
struct ChangeSet {
    updated: Vec<String>,
    deleted: Vec<String>,
    added: Vec<String>,
}

impl ChangeSet {
    fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted.is_empty() && self.added.is_empty()
    }
}

/// Parse an externally assigned identifier out of a metadata self-link
///
/// Recognizes resolver URLs, `hdl:` URIs, and `ark:` URIs. Anything else
/// is a hard error: a present but unintelligible self-link means the
/// package and the repository would disagree about the object's identity.
pub fn identifier_from_self_link(link: &str) -> Result<AlternateIdentifier> {
    if let Some(rest) = link.strip_prefix("https://hdl.handle.net/") {
        return Ok(AlternateIdentifier::new(IdentifierScheme::Handle, rest));
    }
    if let Some(rest) = link.strip_prefix("hdl:") {
        return Ok(AlternateIdentifier::new(
            IdentifierScheme::Handle,
            rest.trim_start_matches('/'),
        ));
    }
    if let Some(pos) = link.find("ark:") {
        let rest = link[pos + 4..].trim_start_matches('/');
        return Ok(AlternateIdentifier::new(IdentifierScheme::Ark, rest));
    }
    Err(IngestError::IdentifierExtraction(format!(
        "self-link uses no recognized identifier scheme: {link}"
    )))
}

/// Canonicalize placeholder identifier values
///
/// Identifier values marked as not-yet-minted come in several spellings;
/// downstream stages only ever match the canonical one.
pub fn sanitize_alternate_identifiers(identifiers: &mut [AlternateIdentifier]) {
    for identifier in identifiers {
        if identifier.is_doi_placeholder() {
            identifier.value = DOI_PLACEHOLDER.to_string();
        }
    }
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

impl<'a> RecordTreeUploader<'a> {
    pub fn new(
        repository: &'a dyn RepositoryApi,
        package_root: &'a Path,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            repository,
            package_root,
            policy,
        }
    }

    /// Upload the whole tree and materialize the preservation record
    pub async fn upload(&self, mapping: &MapRecord, report: &mut Report) -> Result<UploadOutcome> {
        let mut edited = Vec::new();
        let root = self
            .upload_node(mapping, None, &mut edited, report)
            .await?;
        self.materialize_preservation_record(&root, &mut edited, report)
            .await?;
        info!(root = %root.id, drafts = edited.len(), "record tree uploaded");
        Ok(UploadOutcome {
            root: root.id,
            edited,
        })
    }

    fn upload_node<'b>(
        &'b self,
        node: &'b MapRecord,
        parent: Option<ParentScope>,
        edited: &'b mut Vec<RecordId>,
        report: &'b mut Report,
    ) -> BoxFuture<'b, Result<NodeOutcome>> {
        async move {
            let metadata_path = self.effective_metadata_path(node, parent.as_ref());
            let title = self.effective_title(node, parent.as_ref(), metadata_path.as_deref())?;
            let private_split = node
                .title
                .as_deref()
                .is_some_and(is_private_split_title);

            let existing = self.repository.find_record_by_title(&title).await?;
            let (record_id, recurse) = match existing {
                None => {
                    let id = self
                        .create_record(node, &title, metadata_path.as_deref(), private_split, report)
                        .await?;
                    (id, true)
                }
                Some(_) if !self.policy.update_existing => {
                    return Err(IngestError::Conflict(format!(
                        "a record titled '{title}' already exists; re-run with updates enabled to version it"
                    )));
                }
                Some(existing_id) => {
                    self.update_record(
                        node,
                        &existing_id,
                        &title,
                        metadata_path.as_deref(),
                        private_split,
                        report,
                    )
                    .await?
                }
            };
            edited.push(record_id.clone());

            let mut child_ids = Vec::new();
            if recurse {
                let scope = ParentScope {
                    title: title.clone(),
                    metadata_path: metadata_path.clone(),
                    record_id: record_id.id().to_string(),
                };
                for child in node.children() {
                    let child_outcome = self
                        .upload_node(child, Some(scope.clone()), edited, report)
                        .await?;
                    child_ids.push(child_outcome.id);
                }
            }

            self.attach_edges(&record_id, parent.as_ref(), &child_ids)
                .await?;

            Ok(NodeOutcome {
                id: record_id,
                title,
            })
        }
        .boxed()
    }

    fn effective_metadata_path(
        &self,
        node: &MapRecord,
        parent: Option<&ParentScope>,
    ) -> Option<String> {
        node.metadata
            .clone()
            .or_else(|| parent.and_then(|p| p.metadata_path.clone()))
    }

    /// Effective title: the node's own metadata document names it; a node
    /// without one disambiguates by appending its title to the parent's.
    fn effective_title(
        &self,
        node: &MapRecord,
        parent: Option<&ParentScope>,
        metadata_path: Option<&str>,
    ) -> Result<String> {
        let own_document_title = match (&node.metadata, metadata_path) {
            (Some(_), Some(path)) => {
                let content = std::fs::read_to_string(self.package_root.join(path))?;
                cmdi::read_title(&content)?
            }
            _ => None,
        };
        let base = own_document_title.or_else(|| parent.map(|p| p.title.clone()));
        match (&node.title, base) {
            (Some(title), Some(base)) if node.metadata.is_none() => Ok(format!("{base}: {title}")),
            (_, Some(base)) => Ok(base),
            (Some(title), None) => Ok(title.clone()),
            (None, None) => Err(IngestError::Validation(
                "record has neither a title nor a titled metadata document".to_string(),
            )),
        }
    }

    fn node_access(&self, node: &MapRecord) -> Access {
        let all_public = node.files().iter().all(|f| f.public);
        Access::with_files(if all_public {
            AccessLevel::Public
        } else {
            AccessLevel::Restricted
        })
    }

    /// Remote files the mapping expects for this node, keyed by
    /// package-relative name
    fn expected_files(
        &self,
        node: &MapRecord,
        metadata_path: Option<&str>,
        private_split: bool,
    ) -> Vec<String> {
        let mut expected: Vec<String> = node.files().iter().map(|f| f.name.clone()).collect();
        // Private-split records share their parent's metadata document and
        // must not publish a second copy of it
        if !private_split {
            if let Some(path) = metadata_path {
                expected.push(path.to_string());
            }
        }
        expected
    }

    async fn create_record(
        &self,
        node: &MapRecord,
        title: &str,
        metadata_path: Option<&str>,
        private_split: bool,
        report: &mut Report,
    ) -> Result<RecordId> {
        let mut metadata = RecordMetadata::new(title, ResourceType::Dataset);
        metadata.creators.push(self.policy.depositor.clone());

        if let Some(path) = metadata_path {
            let content = std::fs::read_to_string(self.package_root.join(path))?;
            if let Some(link) = cmdi::read_self_link(&content)? {
                metadata
                    .alternate_identifiers
                    .push(identifier_from_self_link(&link)?);
            }
        }
        metadata.alternate_identifiers.push(AlternateIdentifier::new(
            IdentifierScheme::Doi,
            DOI_PLACEHOLDER,
        ));
        sanitize_alternate_identifiers(&mut metadata.alternate_identifiers);

        let expected = self.expected_files(node, metadata_path, private_split);
        let mut files = FilesOptions::new(!expected.is_empty());
        if !private_split {
            files.default_preview = metadata_path.map(normalize_key);
        }

        let draft = DraftRecord::new(self.node_access(node), files, metadata);
        let info = self.repository.create_draft(&draft).await?;
        debug!(record = %info.id, title, "created draft record");

        for name in &expected {
            self.upload_local_file(&info.id, name).await?;
        }
        report.add_correct(
            BUCKET,
            format!("{title}: created draft {} with {} files", info.id, expected.len()),
        );
        Ok(RecordId::Draft(info.id))
    }

    /// Version or derive an existing record depending on whether its
    /// content changed; returns the draft id and whether to recurse into
    /// children
    async fn update_record(
        &self,
        node: &MapRecord,
        existing_id: &str,
        title: &str,
        metadata_path: Option<&str>,
        private_split: bool,
        report: &mut Report,
    ) -> Result<(RecordId, bool)> {
        let info = self.repository.get_record(existing_id).await?;
        if !info.is_published {
            return Err(IngestError::Conflict(format!(
                "an unpublished draft titled '{title}' already exists; delete stale drafts before re-running"
            )));
        }

        let expected = self.expected_files(node, metadata_path, private_split);
        let changes = self.classify_changes(existing_id, &expected).await?;

        if changes.is_empty() {
            let draft = self.repository.draft_from_published(existing_id).await?;
            let draft_id = require_id(draft.id)?;
            report.add_note(BUCKET, format!("{title}: already up to date"));
            return Ok((
                RecordId::Draft(draft_id),
                !self.policy.skip_unchanged_subtrees,
            ));
        }

        let draft = self.repository.new_version(existing_id).await?;
        let draft_id = require_id(draft.id)?;
        self.repository.import_files(&draft_id).await?;

        for name in changes.updated.iter().chain(changes.deleted.iter()) {
            self.repository
                .delete_draft_file(&draft_id, &normalize_key(name))
                .await?;
        }
        for name in changes.updated.iter().chain(changes.added.iter()) {
            self.upload_local_file(&draft_id, name).await?;
        }

        let mut draft = self.repository.get_draft(&draft_id).await?;
        if !private_split {
            draft.files.default_preview = metadata_path.map(normalize_key);
        }
        draft.metadata.publication_date = today();
        self.repository.update_draft(&draft_id, &draft).await?;

        report.add_correct(
            BUCKET,
            format!(
                "{title}: new version {} ({} updated, {} added, {} deleted)",
                draft_id,
                changes.updated.len(),
                changes.added.len(),
                changes.deleted.len()
            ),
        );
        Ok((RecordId::Draft(draft_id), true))
    }

    async fn classify_changes(&self, existing_id: &str, expected: &[String]) -> Result<ChangeSet> {
        let remote_index: BTreeMap<_, _> = self
            .repository
            .list_record_files(existing_id)
            .await?
            .checksum_index()?
            .into_iter()
            .collect();

        let mut changes = ChangeSet {
            updated: Vec::new(),
            deleted: Vec::new(),
            added: Vec::new(),
        };
        for name in expected {
            match remote_index.get(name) {
                Some(checksum) => {
                    let unchanged = checksum
                        .verify_file(self.package_root.join(name))
                        .map_err(IngestError::Common)?;
                    if !unchanged {
                        changes.updated.push(name.clone());
                    }
                }
                None => changes.added.push(name.clone()),
            }
        }
        for name in remote_index.keys() {
            if !expected.iter().any(|e| e == name) {
                changes.deleted.push(name.clone());
            }
        }
        Ok(changes)
    }

    async fn upload_local_file(&self, draft_id: &str, name: &str) -> Result<()> {
        let content = std::fs::read(self.package_root.join(name))?;
        self.repository
            .upload_draft_file(draft_id, &normalize_key(name), content)
            .await
    }

    /// Append relationship edges for this node: IsPartOf to the parent and
    /// HasPart per child. Existing edges are kept, duplicates are not
    /// written.
    async fn attach_edges(
        &self,
        record_id: &RecordId,
        parent: Option<&ParentScope>,
        children: &[RecordId],
    ) -> Result<()> {
        let mut edges = Vec::new();
        if let Some(parent) = parent {
            edges.push(RelatedIdentifier::record_link(
                self.repository.record_url(&parent.record_id),
                RelationKind::IsPartOf,
            ));
        }
        for child in children {
            edges.push(RelatedIdentifier::record_link(
                self.repository.record_url(child.id()),
                RelationKind::HasPart,
            ));
        }
        if edges.is_empty() {
            return Ok(());
        }
        self.append_edges(record_id.id(), edges).await
    }

    async fn append_edges(&self, draft_id: &str, edges: Vec<RelatedIdentifier>) -> Result<()> {
        let mut draft = self.repository.get_draft(draft_id).await?;
        let mut dirty = false;
        for edge in edges {
            if !draft.metadata.related_identifiers.contains(&edge) {
                draft.metadata.related_identifiers.push(edge);
                dirty = true;
            }
        }
        if dirty {
            self.repository.update_draft(draft_id, &draft).await?;
        }
        Ok(())
    }

    /// Find or create the auxiliary preservation record and cross-link it
    /// with the root
    async fn materialize_preservation_record(
        &self,
        root: &NodeOutcome,
        edited: &mut Vec<RecordId>,
        report: &mut Report,
    ) -> Result<()> {
        let title = format!("{}{}", root.title, PRESERVATION_TITLE_SUFFIX);
        let preservation_id = match self.repository.find_record_by_title(&title).await? {
            Some(existing) => {
                let draft = self.repository.draft_from_published(&existing).await?;
                require_id(draft.id)?
            }
            None => {
                let mut metadata = RecordMetadata::new(&title, ResourceType::Other);
                metadata.creators.push(self.policy.depositor.clone());
                let draft = DraftRecord::new(
                    Access::with_files(AccessLevel::Public),
                    FilesOptions::new(false),
                    metadata,
                );
                self.repository.create_draft(&draft).await?.id
            }
        };
        edited.push(RecordId::Draft(preservation_id.clone()));

        self.append_edges(
            &preservation_id,
            vec![RelatedIdentifier::record_link(
                self.repository.record_url(root.id.id()),
                RelationKind::Describes,
            )],
        )
        .await?;
        self.append_edges(
            root.id.id(),
            vec![RelatedIdentifier::record_link(
                self.repository.record_url(&preservation_id),
                RelationKind::IsDescribedBy,
            )],
        )
        .await?;

        report.add_correct(BUCKET, format!("{title}: preservation record in place"));
        Ok(())
    }
}

fn require_id(id: Option<String>) -> Result<String> {
    id.ok_or_else(|| IngestError::remote("repository returned a draft without an id"))
}
