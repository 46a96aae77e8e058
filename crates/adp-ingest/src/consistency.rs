//! Post-upload consistency validation
//!
//! Re-reads the uploaded tree from the repository and verifies every
//! draft file's checksum against the local source file. Published records
//! are trusted (they were verified when first deposited) but are still
//! traversed so draft descendants under them get checked.

use crate::error::Result;
use crate::repository::{denormalize_key, record_id_from_url, RecordId, RelationKind, RepositoryApi};
use adp_common::Report;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

const BUCKET: &str = "consistency";

pub struct ConsistencyValidator<'a> {
    repository: &'a dyn RepositoryApi,
    package_root: &'a Path,
}

impl<'a> ConsistencyValidator<'a> {
    pub fn new(repository: &'a dyn RepositoryApi, package_root: &'a Path) -> Self {
        Self {
            repository,
            package_root,
        }
    }

    /// Validate the tree rooted at `root`; true iff every visited draft
    /// passed every checksum comparison
    pub async fn validate(&self, root: &RecordId, report: &mut Report) -> Result<bool> {
        let mut visited = HashSet::new();
        self.visit(root.id().to_string(), &mut visited, report).await
    }

    fn visit<'b>(
        &'b self,
        id: String,
        visited: &'b mut HashSet<String>,
        report: &'b mut Report,
    ) -> BoxFuture<'b, Result<bool>> {
        async move {
            if !visited.insert(id.clone()) {
                return Ok(true);
            }

            let is_draft = self.repository.is_draft(&id).await?;
            let mut passed = true;
            let metadata = if is_draft {
                passed = self.verify_draft_files(&id, report).await?;
                self.repository.get_draft(&id).await?.metadata
            } else {
                debug!(record = %id, "published record, files trusted");
                report.add_note(BUCKET, format!("record {id}: published, trusted"));
                self.repository.get_record(&id).await?.metadata
            };

            for edge in metadata.related(RelationKind::HasPart) {
                let Some(child_id) = record_id_from_url(&edge.identifier) else {
                    continue;
                };
                let child_ok = self
                    .visit(child_id.to_string(), visited, report)
                    .await?;
                passed = passed && child_ok;
            }
            Ok(passed)
        }
        .boxed()
    }

    async fn verify_draft_files(&self, id: &str, report: &mut Report) -> Result<bool> {
        let listing = self.repository.list_draft_files(id).await?;
        let index = listing.checksum_index()?;

        let mut failures = 0usize;
        for (name, checksum) in &index {
            let local = self.package_root.join(denormalize_key(name));
            let matches = local.is_file() && checksum.verify_file(&local).map_err(crate::error::IngestError::Common)?;
            if !matches {
                failures += 1;
                report.add_critical(
                    BUCKET,
                    format!("draft {id}: {name} does not match the local source file"),
                );
            }
        }

        if failures == 0 {
            report.add_correct(
                BUCKET,
                format!("draft {id}: all {} files verified", index.len()),
            );
            Ok(true)
        } else {
            warn!(record = %id, failures, "draft failed consistency validation");
            report.add_critical(
                BUCKET,
                format!(
                    "draft {id}: {failures} of {} files failed verification",
                    index.len()
                ),
            );
            Ok(false)
        }
    }
}
