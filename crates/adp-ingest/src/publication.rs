//! Publishing the uploaded drafts and their identifiers
//!
//! Publication is terminal: once a record is published it cannot be
//! unpublished, so each draft is attempted independently and failures are
//! gathered instead of aborting. Identifier publication runs once, after
//! all records have been attempted.

use crate::error::{IngestError, Result};
use crate::registrar::RegistrarApi;
use crate::repository::{RecordId, RepositoryApi};
use adp_common::Report;
use tracing::{error, info};

const BUCKET: &str = "publication";

pub struct PublicationCoordinator<'a> {
    repository: &'a dyn RepositoryApi,
}

impl<'a> PublicationCoordinator<'a> {
    pub fn new(repository: &'a dyn RepositoryApi) -> Self {
        Self { repository }
    }

    /// Publish every edited draft; failed ids are gathered into a single
    /// error after all records have been attempted
    pub async fn publish(&self, edited: &[RecordId], report: &mut Report) -> Result<()> {
        let mut failed = Vec::new();
        for record in edited {
            match self.repository.publish_draft(record.id()).await {
                Ok(info) => {
                    report.add_correct(
                        BUCKET,
                        format!("{}: published as {}", info.metadata.title, info.id),
                    );
                }
                Err(e) => {
                    error!(record = %record.id(), error = %e, "failed to publish draft");
                    report.add_critical(BUCKET, format!("{}: publish failed: {e}", record.id()));
                    failed.push(record.id().to_string());
                }
            }
        }

        if failed.is_empty() {
            info!(records = edited.len(), "all records published");
            Ok(())
        } else {
            report.add_critical(
                BUCKET,
                format!(
                    "{} of {} records failed to publish: {}",
                    failed.len(),
                    edited.len(),
                    failed.join(", ")
                ),
            );
            Err(IngestError::PartialPublication(failed))
        }
    }

    /// Move every minted identifier under the prefix to the findable state
    pub async fn publish_identifiers(
        &self,
        registrar: &dyn RegistrarApi,
        prefix: &str,
        report: &mut Report,
    ) -> Result<()> {
        registrar.publish_all_drafts(prefix).await?;
        report.add_correct(BUCKET, format!("identifiers under {prefix} published"));
        Ok(())
    }
}
