//! The ingest engine: lock, validate, upload, verify, mint, publish
//!
//! Orchestrates the whole deposit under a single bounded-wait lock. Any
//! failure between the first draft creation and identifier assignment
//! rolls the run back by deleting every draft record and every draft
//! identifier under the configured prefix. Publication failures do not
//! roll back; published records are permanent.

use crate::consistency::ConsistencyValidator;
use crate::error::{IngestError, Result};
use crate::identifiers::IdentifierCoordinator;
use crate::mapping;
use crate::package::{self, FixityChecker, ManifestFixityChecker};
use crate::publication::PublicationCoordinator;
use crate::registrar::RegistrarApi;
use crate::repository::{denormalize_key, record_id_from_url, RecordId, RelationKind, RepositoryApi};
use crate::transaction::IngestLock;
use crate::uploader::{RecordTreeUploader, UploadOutcome, UploadPolicy};
use adp_common::Report;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, instrument, warn};

const BUCKET: &str = "engine";

/// Per-deposit behavior switches
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Default visibility for files when the package has no explicit
    /// mapping document
    pub files_public_by_default: bool,

    /// Split private files into dedicated sibling records
    pub separate_private_records: bool,

    /// Allow versioning records whose titles already exist; without this a
    /// title collision is a hard conflict
    pub update_existing: bool,

    /// Skip the children of a record that is already up to date
    ///
    /// A child added under an otherwise unchanged parent is not uploaded
    /// while this is set; disable it to force a full tree walk.
    pub skip_unchanged_subtrees: bool,

    /// Publish the uploaded drafts at the end of the run
    pub publish_records: bool,

    /// Move minted identifiers to the findable state after publication
    pub publish_identifiers: bool,

    /// Prefix under which identifiers are minted; no minting without it
    pub identifier_prefix: Option<String>,

    /// Name recorded as creator on records created by this run
    pub depositor: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            files_public_by_default: false,
            separate_private_records: false,
            update_existing: false,
            skip_unchanged_subtrees: true,
            publish_records: true,
            publish_identifiers: true,
            identifier_prefix: None,
            depositor: "ADP".to_string(),
        }
    }
}

/// The deposit engine; construct via [`IngestEngine::builder`]
pub struct IngestEngine {
    repository: Box<dyn RepositoryApi>,
    registrar: Option<Box<dyn RegistrarApi>>,
    fixity: Box<dyn FixityChecker>,
    lock: IngestLock,
}

pub struct IngestEngineBuilder {
    repository: Box<dyn RepositoryApi>,
    registrar: Option<Box<dyn RegistrarApi>>,
    fixity: Option<Box<dyn FixityChecker>>,
    lock: Option<IngestLock>,
}

impl IngestEngineBuilder {
    pub fn registrar(mut self, registrar: impl RegistrarApi + 'static) -> Self {
        self.registrar = Some(Box::new(registrar));
        self
    }

    pub fn fixity(mut self, fixity: impl FixityChecker + 'static) -> Self {
        self.fixity = Some(Box::new(fixity));
        self
    }

    pub fn lock(mut self, lock: IngestLock) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn build(self) -> IngestEngine {
        IngestEngine {
            repository: self.repository,
            registrar: self.registrar,
            fixity: self
                .fixity
                .unwrap_or_else(|| Box::new(ManifestFixityChecker)),
            lock: self.lock.unwrap_or_default(),
        }
    }
}

impl IngestEngine {
    pub fn builder(repository: impl RepositoryApi + 'static) -> IngestEngineBuilder {
        IngestEngineBuilder {
            repository: Box::new(repository),
            registrar: None,
            fixity: None,
            lock: None,
        }
    }

    /// Deposit a submission package, returning the root record's id
    ///
    /// The report receives findings from every stage, on failure included.
    #[instrument(skip(self, options, report), fields(package = %package_root.display()))]
    pub async fn deposit(
        &self,
        package_root: &Path,
        options: &IngestOptions,
        report: &mut Report,
    ) -> Result<RecordId> {
        let _guard = self.lock.acquire().await?;

        // Nothing remote exists yet; validation failures need no rollback
        let mapping = mapping::resolve(
            package_root,
            options.files_public_by_default,
            options.separate_private_records,
        )?;
        let valid =
            package::validate_package(self.fixity.as_ref(), package_root, &mapping, report)
                .await?;
        if !valid {
            return Err(IngestError::Validation(
                "package failed fixity or mapping parity checks".to_string(),
            ));
        }

        let outcome = match self.run_locked(package_root, &mapping, options, report).await {
            Ok(outcome) => outcome,
            Err(e) => {
                report.add_critical(BUCKET, format!("deposit failed, rolling back: {e}"));
                self.rollback(options.identifier_prefix.as_deref(), report)
                    .await;
                return Err(e);
            }
        };

        // Publication is terminal; failures here are gathered, never rolled
        // back
        if options.publish_records {
            let publisher = PublicationCoordinator::new(self.repository.as_ref());
            let published = publisher.publish(&outcome.edited, report).await;

            // Identifiers minted for the records that did publish must
            // still go findable, so the registrar runs even after a
            // partial publication.
            if options.publish_identifiers {
                if let (Some(registrar), Some(prefix)) =
                    (self.registrar.as_deref(), options.identifier_prefix.as_deref())
                {
                    publisher
                        .publish_identifiers(registrar, prefix, report)
                        .await?;
                }
            }
            published?;
        }

        info!(root = %outcome.root, "deposit complete");
        report.add_correct(BUCKET, format!("deposit complete, root record {}", outcome.root));
        Ok(outcome.root)
    }

    /// The rollback-protected stages: upload, consistency, identifiers
    async fn run_locked(
        &self,
        package_root: &Path,
        mapping: &mapping::MapRecord,
        options: &IngestOptions,
        report: &mut Report,
    ) -> Result<UploadOutcome> {
        let uploader = RecordTreeUploader::new(
            self.repository.as_ref(),
            package_root,
            UploadPolicy {
                update_existing: options.update_existing,
                skip_unchanged_subtrees: options.skip_unchanged_subtrees,
                depositor: options.depositor.clone(),
            },
        );
        let outcome = uploader.upload(mapping, report).await?;

        let validator = ConsistencyValidator::new(self.repository.as_ref(), package_root);
        if !validator.validate(&outcome.root, report).await? {
            return Err(IngestError::ChecksumMismatch(outcome.root.id().to_string()));
        }

        if let (Some(registrar), Some(prefix)) = (
            self.registrar.as_deref(),
            options.identifier_prefix.as_deref(),
        ) {
            IdentifierCoordinator::new(self.repository.as_ref(), registrar, prefix)
                .assign(&outcome.edited, report)
                .await?;
        } else {
            report.add_note(BUCKET, "no registrar configured, identifiers not minted");
        }

        Ok(outcome)
    }

    /// Best-effort cleanup: delete every draft record and every draft
    /// identifier under the prefix. Failures are logged, never raised; a
    /// rollback that fails halfway must still attempt the rest.
    async fn rollback(&self, prefix: Option<&str>, report: &mut Report) {
        match self.repository.list_drafts().await {
            Ok(drafts) => {
                for id in drafts {
                    if let Err(e) = self.repository.delete_draft(&id).await {
                        error!(record = %id, error = %e, "failed to delete draft during rollback");
                        report.add_warning(BUCKET, format!("rollback: could not delete draft {id}: {e}"));
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "failed to list drafts during rollback");
                report.add_warning(BUCKET, format!("rollback: could not list drafts: {e}"));
            }
        }

        if let (Some(registrar), Some(prefix)) = (self.registrar.as_deref(), prefix) {
            if let Err(e) = registrar.delete_all_drafts(prefix).await {
                error!(error = %e, "failed to delete draft identifiers during rollback");
                report.add_warning(
                    BUCKET,
                    format!("rollback: could not delete draft identifiers: {e}"),
                );
            }
        }
        warn!("deposit rolled back");
        report.add_note(BUCKET, "rollback finished");
    }

    /// Delete every draft record owned by this client
    ///
    /// Maintenance operation for cleaning up after an interrupted run.
    pub async fn delete_drafts(&self, report: &mut Report) -> Result<usize> {
        let _guard = self.lock.acquire().await?;
        let drafts = self.repository.list_drafts().await?;
        let count = drafts.len();
        for id in drafts {
            self.repository.delete_draft(&id).await?;
            report.add_note(BUCKET, format!("deleted draft {id}"));
        }
        Ok(count)
    }

    /// Download a published record tree into a local directory, recursing
    /// through its part relationships
    pub async fn download(
        &self,
        record_id: &str,
        output: &Path,
        report: &mut Report,
    ) -> Result<usize> {
        let mut visited = HashSet::new();
        self.download_record(record_id.to_string(), output, &mut visited, report)
            .await
    }

    fn download_record<'a>(
        &'a self,
        id: String,
        output: &'a Path,
        visited: &'a mut HashSet<String>,
        report: &'a mut Report,
    ) -> BoxFuture<'a, Result<usize>> {
        async move {
            if !visited.insert(id.clone()) {
                return Ok(0);
            }

            let info = self.repository.get_record(&id).await?;
            let listing = self.repository.list_record_files(&id).await?;
            let mut count = 0usize;
            for entry in &listing.entries {
                let content = self.repository.get_record_file(&id, &entry.key).await?;
                let target = output.join(denormalize_key(&entry.key));
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&target, content)?;
                count += 1;
            }
            report.add_correct(
                BUCKET,
                format!("{}: downloaded {count} files", info.metadata.title),
            );

            for edge in info.metadata.related(RelationKind::HasPart) {
                if let Some(child_id) = record_id_from_url(&edge.identifier) {
                    count += self
                        .download_record(child_id.to_string(), output, visited, report)
                        .await?;
                }
            }
            Ok(count)
        }
        .boxed()
    }
}
