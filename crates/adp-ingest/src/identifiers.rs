//! Identifier minting and metadata-document rewriting
//!
//! Runs after the tree is uploaded and validated. Each eligible draft
//! gets a persistent identifier minted in draft state, written back into
//! its alternate-identifier list, and pushed to the registrar together
//! with the record's landing page. The record's embedded metadata document
//! is then rewritten so its self-link and resource list reference the
//! final identifiers instead of placeholders.

use crate::cmdi::{self, ResourceProxy};
use crate::error::{IngestError, Result};
use crate::registrar::{RegistrarApi, RegistrarMetadata};
use crate::repository::{
    record_id_from_url, DraftRecord, IdentifierScheme, RecordId, RelationKind, RepositoryApi,
};
use adp_common::Report;
use tracing::{debug, info};

const BUCKET: &str = "identifiers";

/// File extension marking a descriptive metadata document
const METADATA_EXTENSION: &str = ".cmdi";

const CMDI_MIMETYPE: &str = "application/x-cmdi+xml";

/// Resolver prefix for bare minted identifiers
const RESOLVER_PREFIX: &str = "https://doi.org/";

pub struct IdentifierCoordinator<'a> {
    repository: &'a dyn RepositoryApi,
    registrar: &'a dyn RegistrarApi,
    prefix: &'a str,
}

/// Whether a draft is eligible for identifier minting: its default
/// preview must be a descriptive metadata document.
fn is_eligible(draft: &DraftRecord) -> bool {
    draft
        .files
        .default_preview
        .as_deref()
        .is_some_and(|preview| preview.to_lowercase().ends_with(METADATA_EXTENSION))
}

/// Render an identifier value as a resolvable URL, synthesizing the
/// resolver prefix when the stored value is bare
fn as_resolver_url(value: &str) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("{RESOLVER_PREFIX}{value}")
    }
}

impl<'a> IdentifierCoordinator<'a> {
    pub fn new(
        repository: &'a dyn RepositoryApi,
        registrar: &'a dyn RegistrarApi,
        prefix: &'a str,
    ) -> Self {
        Self {
            repository,
            registrar,
            prefix,
        }
    }

    /// Mint identifiers for every eligible draft, then rewrite their
    /// metadata documents
    pub async fn assign(&self, edited: &[RecordId], report: &mut Report) -> Result<()> {
        for record in edited {
            self.assign_one(record.id(), report).await?;
        }
        // Second pass: every document rewrite needs the children's minted
        // identifiers, so all minting must complete first
        for record in edited {
            self.rewrite_document(record.id()).await?;
        }
        info!(records = edited.len(), "identifier assignment complete");
        Ok(())
    }

    async fn assign_one(&self, id: &str, report: &mut Report) -> Result<()> {
        let mut draft = self.repository.get_draft(id).await?;
        let title = draft.metadata.title.clone();

        if !is_eligible(&draft) {
            // Nothing to mint an identifier for; a leftover placeholder
            // must not survive into the published record
            let before = draft.metadata.alternate_identifiers.len();
            draft
                .metadata
                .alternate_identifiers
                .retain(|i| !i.is_doi_placeholder());
            if draft.metadata.alternate_identifiers.len() != before {
                self.repository.update_draft(id, &draft).await?;
                report.add_note(BUCKET, format!("{title}: not eligible, placeholder removed"));
            }
            return Ok(());
        }

        let Some(placeholder) = draft
            .metadata
            .alternate_identifiers
            .iter_mut()
            .find(|i| i.is_doi_placeholder())
        else {
            debug!(record = %id, "identifier already minted");
            return Ok(());
        };

        let minted = self.registrar.mint_draft(self.prefix).await?;
        placeholder.value = minted.id.clone();
        self.repository.update_draft(id, &draft).await?;

        let publication_year = draft
            .metadata
            .publication_date
            .get(..4)
            .and_then(|y| y.parse().ok())
            .ok_or_else(|| {
                IngestError::metadata(format!(
                    "record {id} has no usable publication date: {}",
                    draft.metadata.publication_date
                ))
            })?;
        let registrar_metadata = RegistrarMetadata {
            title: title.clone(),
            creators: draft.metadata.creators.clone(),
            publication_year,
            url: self.repository.record_url(id),
        };
        self.registrar
            .update_metadata(&minted.id, &registrar_metadata)
            .await?;

        report.add_correct(BUCKET, format!("{title}: minted {}", minted.id));
        Ok(())
    }

    /// Rewrite a draft's metadata document in place: self-link to the
    /// record's first minted identifier, resource list regenerated with a
    /// landing page, the document itself, and one entry per child.
    async fn rewrite_document(&self, id: &str) -> Result<()> {
        let draft = self.repository.get_draft(id).await?;
        if !is_eligible(&draft) {
            return Ok(());
        }
        let Some(preview) = draft.files.default_preview.clone() else {
            return Ok(());
        };

        let self_link = draft
            .metadata
            .first_identifier(IdentifierScheme::Doi)
            .map(|i| as_resolver_url(&i.value));

        let record_url = self.repository.record_url(id);
        let mut proxies = vec![
            ResourceProxy::new("landingPage", "LandingPage", None, record_url.clone()),
            ResourceProxy::new(
                "metadata",
                "Metadata",
                Some(CMDI_MIMETYPE),
                format!("{record_url}/files/{preview}?download=1"),
            ),
        ];
        for (index, edge) in draft
            .metadata
            .related(RelationKind::HasPart)
            .enumerate()
        {
            let reference = match record_id_from_url(&edge.identifier) {
                Some(child_id) => self.child_identifier_url(child_id).await?,
                None => String::new(),
            };
            proxies.push(ResourceProxy::new(
                format!("part{index}"),
                "Metadata",
                Some(CMDI_MIMETYPE),
                reference,
            ));
        }

        let content = self.repository.get_draft_file(id, &preview).await?;
        let content = String::from_utf8(content)
            .map_err(|e| IngestError::metadata(format!("metadata of {id} is not UTF-8: {e}")))?;
        let rewritten = cmdi::rewrite(&content, self_link.as_deref(), &proxies)?;

        // Replace under the same key so the preview pointer stays valid
        self.repository.delete_draft_file(id, &preview).await?;
        self.repository
            .upload_draft_file(id, &preview, rewritten.into_bytes())
            .await?;
        debug!(record = %id, "metadata document rewritten");
        Ok(())
    }

    /// First minted identifier of a child record, as a resolver URL, or
    /// empty if the child has none yet
    async fn child_identifier_url(&self, child_id: &str) -> Result<String> {
        let metadata = if self.repository.is_draft(child_id).await? {
            self.repository.get_draft(child_id).await?.metadata
        } else {
            self.repository.get_record(child_id).await?.metadata
        };
        Ok(metadata
            .first_identifier(IdentifierScheme::Doi)
            .filter(|i| !i.is_doi_placeholder())
            .map(|i| as_resolver_url(&i.value))
            .unwrap_or_default())
    }
}
