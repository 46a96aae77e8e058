//! Submission package validation
//!
//! Two independent gates run before anything touches the repository: a
//! fixity check of the package against its checksum manifests, and a
//! parity check between the resolved mapping and the files actually on
//! disk. Every violation lands in the report; the caller decides whether
//! to proceed based on the combined verdict.

use crate::error::{IngestError, Result};
use crate::mapping::MapRecord;
use adp_common::checksum::{verify_file_checksum, ChecksumAlgorithm, ChecksumString};
use adp_common::{Report, Severity};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const FIXITY_BUCKET: &str = "fixity";
const PARITY_BUCKET: &str = "mapping parity";

/// Verifies the integrity of a package's payload
#[async_trait]
pub trait FixityChecker: Send + Sync {
    /// Check the package, adding findings to `report`; returns whether the
    /// package passed
    async fn check(&self, package_root: &Path, report: &mut Report) -> Result<bool>;
}

/// Fixity checker driven by the package's own checksum manifests
///
/// Looks for `manifest-sha256.txt` and `manifest-md5.txt` at the package
/// root, in that order of preference. Manifest lines are
/// `<hex digest>  <relative path>`. A package without any manifest fails
/// the check.
#[derive(Debug, Default)]
pub struct ManifestFixityChecker;

struct ManifestEntry {
    checksum: ChecksumString,
    name: String,
}

impl ManifestFixityChecker {
    fn manifest_candidates() -> [(&'static str, ChecksumAlgorithm); 2] {
        [
            ("manifest-sha256.txt", ChecksumAlgorithm::Sha256),
            ("manifest-md5.txt", ChecksumAlgorithm::Md5),
        ]
    }

    fn parse_manifest(
        content: &str,
        algorithm: ChecksumAlgorithm,
        manifest_name: &str,
    ) -> Result<Vec<ManifestEntry>> {
        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (digest, name) = line.split_once(char::is_whitespace).ok_or_else(|| {
                IngestError::Validation(format!(
                    "{manifest_name} line {}: expected '<digest> <path>'",
                    number + 1
                ))
            })?;
            let checksum = format!("{algorithm}:{digest}")
                .parse::<ChecksumString>()
                .map_err(|e| {
                    IngestError::Validation(format!("{manifest_name} line {}: {e}", number + 1))
                })?;
            entries.push(ManifestEntry {
                checksum,
                name: name.trim().to_string(),
            });
        }
        Ok(entries)
    }
}

#[async_trait]
impl FixityChecker for ManifestFixityChecker {
    async fn check(&self, package_root: &Path, report: &mut Report) -> Result<bool> {
        let manifest = Self::manifest_candidates()
            .into_iter()
            .map(|(name, algorithm)| (package_root.join(name), name, algorithm))
            .find(|(path, _, _)| path.exists());

        let Some((manifest_path, manifest_name, algorithm)) = manifest else {
            report.add(
                FIXITY_BUCKET,
                Severity::Critical,
                "package has no checksum manifest".to_string(),
            );
            return Ok(false);
        };
        debug!(manifest = manifest_name, "verifying package fixity");

        let content = std::fs::read_to_string(&manifest_path)?;
        let entries = match Self::parse_manifest(&content, algorithm, manifest_name) {
            Ok(entries) => entries,
            Err(e) => {
                report.add(FIXITY_BUCKET, Severity::Critical, e.to_string());
                return Ok(false);
            }
        };

        let mut passed = true;
        for entry in &entries {
            let file = package_root.join(&entry.name);
            if !file.is_file() {
                report.add(
                    FIXITY_BUCKET,
                    Severity::Critical,
                    format!("{}: listed in {} but missing", entry.name, manifest_name),
                );
                passed = false;
                continue;
            }
            match verify_file_checksum(&file, &entry.checksum) {
                Ok(()) => {
                    report.add(FIXITY_BUCKET, Severity::Correct, format!("{}: ok", entry.name));
                }
                Err(e) => {
                    report.add(
                        FIXITY_BUCKET,
                        Severity::Critical,
                        format!("{}: {e}", entry.name),
                    );
                    passed = false;
                }
            }
        }

        if passed {
            info!(files = entries.len(), "package fixity verified");
        } else {
            warn!("package failed fixity verification");
        }
        Ok(passed)
    }
}

/// Check that the mapping and the payload directory cover exactly the same
/// files
///
/// Every file the mapping references must exist on disk and every payload
/// file must be referenced by the mapping. Each violation is reported
/// individually by name.
pub fn check_mapping_parity(
    package_root: &Path,
    mapping: &MapRecord,
    report: &mut Report,
) -> Result<bool> {
    let referenced: BTreeSet<String> = mapping
        .referenced_files()
        .into_iter()
        .map(str::to_string)
        .collect();

    let data_dir = package_root.join("data");
    let mut on_disk = BTreeSet::new();
    for entry in WalkDir::new(&data_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            IngestError::Validation(format!("cannot scan payload directory: {e}"))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(package_root)
            .unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        on_disk.insert(name);
    }

    let mut passed = true;
    for name in referenced.difference(&on_disk) {
        report.add(
            PARITY_BUCKET,
            Severity::Critical,
            format!("{name}: referenced by the mapping but not in the package"),
        );
        passed = false;
    }
    for name in on_disk.difference(&referenced) {
        report.add(
            PARITY_BUCKET,
            Severity::Critical,
            format!("{name}: present in the package but not referenced by the mapping"),
        );
        passed = false;
    }

    if passed {
        report.add(
            PARITY_BUCKET,
            Severity::Correct,
            format!("mapping covers all {} payload files", on_disk.len()),
        );
    }
    Ok(passed)
}

/// Run both validation gates, reporting all findings from both
pub async fn validate_package(
    fixity: &dyn FixityChecker,
    package_root: &Path,
    mapping: &MapRecord,
    report: &mut Report,
) -> Result<bool> {
    let fixity_ok = fixity.check(package_root, report).await?;
    let parity_ok = check_mapping_parity(package_root, mapping, report)?;
    Ok(fixity_ok && parity_ok)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mapping;
    use adp_common::checksum::compute_checksum;

    fn write_package(dir: &Path) {
        std::fs::create_dir_all(dir.join("data/Metadata")).unwrap();
        std::fs::create_dir_all(dir.join("data/Content")).unwrap();
        std::fs::write(dir.join("data/Metadata/metadata.cmdi"), "<CMD/>").unwrap();
        std::fs::write(dir.join("data/Content/a.txt"), "alpha").unwrap();

        let manifest = format!(
            "{}  data/Metadata/metadata.cmdi\n{}  data/Content/a.txt\n",
            compute_checksum(&mut &b"<CMD/>"[..], ChecksumAlgorithm::Sha256).unwrap(),
            compute_checksum(&mut &b"alpha"[..], ChecksumAlgorithm::Sha256).unwrap(),
        );
        std::fs::write(dir.join("manifest-sha256.txt"), manifest).unwrap();
    }

    #[tokio::test]
    async fn test_valid_package_passes_both_gates() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        let mapping = mapping::resolve(dir.path(), true, false).unwrap();

        let mut report = Report::new();
        let ok = validate_package(&ManifestFixityChecker, dir.path(), &mapping, &mut report)
            .await
            .unwrap();
        assert!(ok);
        assert!(!report.has_critical());
    }

    #[tokio::test]
    async fn test_corrupted_file_fails_fixity() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        std::fs::write(dir.path().join("data/Content/a.txt"), "tampered").unwrap();

        let mut report = Report::new();
        let ok = ManifestFixityChecker
            .check(dir.path(), &mut report)
            .await
            .unwrap();
        assert!(!ok);
        assert!(report
            .items()
            .iter()
            .any(|i| i.severity == Severity::Critical && i.message.contains("a.txt")));
    }

    #[tokio::test]
    async fn test_missing_manifest_fails_fixity() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();

        let mut report = Report::new();
        let ok = ManifestFixityChecker
            .check(dir.path(), &mut report)
            .await
            .unwrap();
        assert!(!ok);
        assert!(report.has_critical());
    }

    #[test]
    fn test_parity_reports_each_discrepancy_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        // An extra payload file the mapping does not know about
        std::fs::write(dir.path().join("data/Content/stray.txt"), "stray").unwrap();

        let mut mapping = mapping::resolve(dir.path(), true, false).unwrap();
        // Keep the mapping one file short and point it at a missing file too
        mapping.files.entries.retain(|f| f.name != "data/Content/stray.txt");
        mapping.files.entries.push(mapping::MapFile {
            public: true,
            name: "data/Content/ghost.txt".to_string(),
        });

        let mut report = Report::new();
        let ok = check_mapping_parity(dir.path(), &mapping, &mut report).unwrap();
        assert!(!ok);
        let messages: Vec<_> = report.items().iter().map(|i| i.message.as_str()).collect();
        assert!(messages
            .iter()
            .any(|m| m.contains("ghost.txt") && m.contains("not in the package")));
        assert!(messages
            .iter()
            .any(|m| m.contains("stray.txt") && m.contains("not referenced")));
    }
}
