//! End-to-end engine tests against in-memory repository and registrar fakes

#![allow(clippy::unwrap_used, clippy::expect_used)]

use adp_common::checksum::{compute_checksum, ChecksumAlgorithm};
use adp_common::Report;
use adp_ingest::consistency::ConsistencyValidator;
use adp_ingest::engine::{IngestEngine, IngestOptions};
use adp_ingest::error::{IngestError, Result};
use adp_ingest::package::ManifestFixityChecker;
use adp_ingest::registrar::{MintedIdentifier, RegistrarApi, RegistrarMetadata};
use adp_ingest::repository::{
    is_placeholder, DraftRecord, FileEntry, FileListing, IdentifierScheme, RecordInfo,
    RepositoryApi,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
struct StoredRecord {
    record: DraftRecord,
    files: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct RepoState {
    next_id: usize,
    drafts: HashMap<String, StoredRecord>,
    published: HashMap<String, StoredRecord>,
    /// new-version draft id -> published id it supersedes
    lineage: HashMap<String, String>,
    /// every key ever uploaded, in order
    uploads: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct FakeRepository {
    state: Arc<Mutex<RepoState>>,
    /// Titles whose drafts refuse to publish
    fail_publish_titles: Arc<Mutex<Vec<String>>>,
}

impl FakeRepository {
    fn upload_count(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    fn uploads_since(&self, mark: usize) -> Vec<String> {
        self.state.lock().unwrap().uploads[mark..].to_vec()
    }

    fn draft_count(&self) -> usize {
        self.state.lock().unwrap().drafts.len()
    }

    fn published_records(&self) -> Vec<DraftRecord> {
        let state = self.state.lock().unwrap();
        let mut records: Vec<_> = state.published.values().map(|s| s.record.clone()).collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    fn published_by_title(&self, title: &str) -> Option<StoredRecord> {
        let state = self.state.lock().unwrap();
        state
            .published
            .values()
            .find(|s| s.record.metadata.title == title)
            .cloned()
    }

    fn listing(files: &BTreeMap<String, Vec<u8>>) -> FileListing {
        FileListing {
            entries: files
                .iter()
                .map(|(key, content)| FileEntry {
                    key: key.clone(),
                    checksum: format!(
                        "md5:{}",
                        compute_checksum(&mut &content[..], ChecksumAlgorithm::Md5).unwrap()
                    ),
                })
                .collect(),
        }
    }

    fn info(id: &str, is_published: bool, stored: &StoredRecord) -> RecordInfo {
        RecordInfo {
            id: id.to_string(),
            is_published,
            metadata: stored.record.metadata.clone(),
            links: stored.record.links.clone(),
        }
    }
}

fn missing(id: &str) -> IngestError {
    IngestError::remote(format!("no such record: {id}"))
}

#[async_trait]
impl RepositoryApi for FakeRepository {
    async fn create_draft(&self, draft: &DraftRecord) -> Result<RecordInfo> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("rec-{}", state.next_id);
        let mut record = draft.clone();
        record.id = Some(id.clone());
        record.links.record_html = Some(format!("https://repo.test/records/{id}"));
        let stored = StoredRecord {
            record,
            files: BTreeMap::new(),
        };
        let info = Self::info(&id, false, &stored);
        state.drafts.insert(id, stored);
        Ok(info)
    }

    async fn get_draft(&self, id: &str) -> Result<DraftRecord> {
        let state = self.state.lock().unwrap();
        state
            .drafts
            .get(id)
            .map(|s| s.record.clone())
            .ok_or_else(|| missing(id))
    }

    async fn update_draft(&self, id: &str, draft: &DraftRecord) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let stored = state.drafts.get_mut(id).ok_or_else(|| missing(id))?;
        stored.record = draft.clone();
        stored.record.id = Some(id.to_string());
        Ok(())
    }

    async fn delete_draft(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.drafts.remove(id).ok_or_else(|| missing(id))?;
        Ok(())
    }

    async fn publish_draft(&self, id: &str) -> Result<RecordInfo> {
        let mut state = self.state.lock().unwrap();
        let title = state
            .drafts
            .get(id)
            .map(|s| s.record.metadata.title.clone())
            .ok_or_else(|| missing(id))?;
        if self.fail_publish_titles.lock().unwrap().contains(&title) {
            return Err(IngestError::remote(format!("publish rejected for {id}")));
        }
        let stored = state.drafts.remove(id).ok_or_else(|| missing(id))?;
        if let Some(superseded) = state.lineage.remove(id) {
            state.published.remove(&superseded);
        }
        let info = Self::info(id, true, &stored);
        state.published.insert(id.to_string(), stored);
        Ok(info)
    }

    async fn new_version(&self, id: &str) -> Result<DraftRecord> {
        let mut state = self.state.lock().unwrap();
        let published = state.published.get(id).ok_or_else(|| missing(id))?.clone();
        state.next_id += 1;
        let new_id = format!("rec-{}", state.next_id);
        let mut record = published.record;
        record.id = Some(new_id.clone());
        record.links.record_html = Some(format!("https://repo.test/records/{new_id}"));
        let stored = StoredRecord {
            record: record.clone(),
            files: BTreeMap::new(),
        };
        state.lineage.insert(new_id.clone(), id.to_string());
        state.drafts.insert(new_id, stored);
        Ok(record)
    }

    async fn draft_from_published(&self, id: &str) -> Result<DraftRecord> {
        let mut state = self.state.lock().unwrap();
        let stored = state.published.get(id).ok_or_else(|| missing(id))?.clone();
        let record = stored.record.clone();
        state.drafts.insert(id.to_string(), stored);
        Ok(record)
    }

    async fn import_files(&self, draft_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let source = state
            .lineage
            .get(draft_id)
            .cloned()
            .ok_or_else(|| missing(draft_id))?;
        let files = state
            .published
            .get(&source)
            .ok_or_else(|| missing(&source))?
            .files
            .clone();
        state
            .drafts
            .get_mut(draft_id)
            .ok_or_else(|| missing(draft_id))?
            .files = files;
        Ok(())
    }

    async fn list_drafts(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().drafts.keys().cloned().collect())
    }

    async fn list_record_files(&self, id: &str) -> Result<FileListing> {
        let state = self.state.lock().unwrap();
        let stored = state.published.get(id).ok_or_else(|| missing(id))?;
        Ok(Self::listing(&stored.files))
    }

    async fn list_draft_files(&self, id: &str) -> Result<FileListing> {
        let state = self.state.lock().unwrap();
        let stored = state.drafts.get(id).ok_or_else(|| missing(id))?;
        Ok(Self::listing(&stored.files))
    }

    async fn upload_draft_file(&self, id: &str, key: &str, content: Vec<u8>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.uploads.push(key.to_string());
        state
            .drafts
            .get_mut(id)
            .ok_or_else(|| missing(id))?
            .files
            .insert(key.to_string(), content);
        Ok(())
    }

    async fn delete_draft_file(&self, id: &str, key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .drafts
            .get_mut(id)
            .ok_or_else(|| missing(id))?
            .files
            .remove(key);
        Ok(())
    }

    async fn get_draft_file(&self, id: &str, key: &str) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .drafts
            .get(id)
            .and_then(|s| s.files.get(key))
            .cloned()
            .ok_or_else(|| missing(id))
    }

    async fn get_record_file(&self, id: &str, key: &str) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .published
            .get(id)
            .and_then(|s| s.files.get(key))
            .cloned()
            .ok_or_else(|| missing(id))
    }

    async fn find_record_by_title(&self, title: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .published
            .iter()
            .chain(state.drafts.iter())
            .find(|(_, s)| s.record.metadata.title == title)
            .map(|(id, _)| id.clone()))
    }

    async fn get_record(&self, id: &str) -> Result<RecordInfo> {
        let state = self.state.lock().unwrap();
        let stored = state.published.get(id).ok_or_else(|| missing(id))?;
        Ok(Self::info(id, true, stored))
    }

    async fn is_draft(&self, id: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(!state.published.contains_key(id))
    }

    fn record_url(&self, id: &str) -> String {
        format!("https://repo.test/records/{id}")
    }
}

#[derive(Debug, Default)]
struct RegistrarState {
    next: usize,
    drafts: Vec<String>,
    findable: Vec<String>,
}

#[derive(Debug, Clone, Default)]
struct FakeRegistrar {
    state: Arc<Mutex<RegistrarState>>,
    fail_metadata: Arc<AtomicBool>,
}

impl FakeRegistrar {
    fn draft_count(&self) -> usize {
        self.state.lock().unwrap().drafts.len()
    }

    fn findable_count(&self) -> usize {
        self.state.lock().unwrap().findable.len()
    }
}

#[async_trait]
impl RegistrarApi for FakeRegistrar {
    async fn mint_draft(&self, prefix: &str) -> Result<MintedIdentifier> {
        let mut state = self.state.lock().unwrap();
        state.next += 1;
        let suffix = format!("fake-{}", state.next);
        let id = format!("{prefix}/{suffix}");
        state.drafts.push(id.clone());
        Ok(MintedIdentifier { id, suffix })
    }

    async fn update_metadata(&self, _id: &str, _metadata: &RegistrarMetadata) -> Result<()> {
        if self.fail_metadata.load(Ordering::SeqCst) {
            return Err(IngestError::remote("registrar rejected the metadata"));
        }
        Ok(())
    }

    async fn publish_all_drafts(&self, prefix: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let (matching, rest): (Vec<_>, Vec<_>) = state
            .drafts
            .drain(..)
            .partition(|id| id.starts_with(prefix));
        state.drafts = rest;
        state.findable.extend(matching);
        Ok(())
    }

    async fn delete_all_drafts(&self, prefix: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.drafts.retain(|id| !id.starts_with(prefix));
        Ok(())
    }
}

const PREFIX: &str = "10.999";

fn cmdi(title: &str) -> String {
    format!(
        r#"<CMD xmlns="http://www.clarin.eu/cmd/1">
  <Header>
    <MdSelfLink>hdl:11022/demo-1</MdSelfLink>
    <MdCollectionDisplayName>{title}</MdCollectionDisplayName>
  </Header>
  <Resources>
    <ResourceProxyList/>
  </Resources>
  <Components/>
</CMD>"#
    )
}

fn write_file(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Regenerate the sha256 manifest over everything under data/
fn write_manifest(root: &Path) {
    let mut lines = Vec::new();
    for entry in WalkDir::new(root.join("data")).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(entry.path()).unwrap();
        lines.push(format!(
            "{}  {name}",
            compute_checksum(&mut &content[..], ChecksumAlgorithm::Sha256).unwrap()
        ));
    }
    std::fs::write(root.join("manifest-sha256.txt"), lines.join("\n")).unwrap();
}

fn base_package(root: &Path) {
    write_file(root, "data/Metadata/metadata.cmdi", cmdi("Demo").as_bytes());
    write_file(root, "data/Content/a.wav", b"riff-audio");
    write_manifest(root);
}

fn engine(repository: &FakeRepository, registrar: Option<&FakeRegistrar>) -> IngestEngine {
    let mut builder = IngestEngine::builder(repository.clone()).fixity(ManifestFixityChecker);
    if let Some(registrar) = registrar {
        builder = builder.registrar(registrar.clone());
    }
    builder.build()
}

fn options(update: bool) -> IngestOptions {
    IngestOptions {
        files_public_by_default: true,
        update_existing: update,
        identifier_prefix: Some(PREFIX.to_string()),
        ..IngestOptions::default()
    }
}

#[tokio::test]
async fn test_first_deposit_publishes_root_and_preservation_record() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    let engine = engine(&repository, None);

    let mut report = Report::new();
    let root = engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap();

    assert_eq!(repository.draft_count(), 0, "everything was published");
    let demo = repository.published_by_title("Demo").unwrap();
    assert_eq!(demo.record.id.as_deref(), Some(root.id()));
    assert_eq!(demo.files.len(), 2);

    let preservation = repository
        .published_by_title("Demo: Preservation information")
        .unwrap();
    assert!(preservation.files.is_empty());

    // Describes/IsDescribedBy cross-link between root and preservation
    let root_edges = &demo.record.metadata.related_identifiers;
    assert!(root_edges
        .iter()
        .any(|e| e.identifier.ends_with(preservation.record.id.as_deref().unwrap())));
    assert!(preservation
        .record
        .metadata
        .related_identifiers
        .iter()
        .any(|e| e.identifier.ends_with(root.id())));
}

#[tokio::test]
async fn test_second_deposit_without_update_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    let engine = engine(&repository, None);

    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap();

    let err = engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap_err();
    match err {
        IngestError::Conflict(message) => assert!(message.contains("Demo")),
        other => panic!("expected a conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unchanged_update_run_uploads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    let engine = engine(&repository, None);

    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap();

    let mark = repository.upload_count();
    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(true), &mut report)
        .await
        .unwrap();

    assert_eq!(repository.uploads_since(mark), Vec::<String>::new());
    assert!(report
        .items()
        .iter()
        .any(|i| i.message.contains("already up to date")));
}

#[tokio::test]
async fn test_change_detection_uploads_exactly_the_changed_files() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "data/Metadata/metadata.cmdi", cmdi("Demo").as_bytes());
    write_file(dir.path(), "data/Content/A.txt", b"alpha");
    write_file(dir.path(), "data/Content/B.txt", b"beta");
    write_manifest(dir.path());

    let repository = FakeRepository::default();
    let engine = engine(&repository, None);
    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap();

    // B changes, C is new, A stays identical
    write_file(dir.path(), "data/Content/B.txt", b"beta-v2");
    write_file(dir.path(), "data/Content/C.txt", b"gamma");
    write_manifest(dir.path());

    let mark = repository.upload_count();
    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(true), &mut report)
        .await
        .unwrap();

    let mut uploaded = repository.uploads_since(mark);
    uploaded.sort();
    assert_eq!(uploaded, vec!["data>Content>B.txt", "data>Content>C.txt"]);

    let demo = repository.published_by_title("Demo").unwrap();
    let mut keys: Vec<_> = demo.files.keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "data>Content>A.txt",
            "data>Content>B.txt",
            "data>Content>C.txt",
            "data>Metadata>metadata.cmdi",
        ]
    );
    assert_eq!(demo.files["data>Content>B.txt"], b"beta-v2");

    // Dropping B from the package deletes it from the next version
    std::fs::remove_file(dir.path().join("data/Content/B.txt")).unwrap();
    write_manifest(dir.path());
    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(true), &mut report)
        .await
        .unwrap();
    let demo = repository.published_by_title("Demo").unwrap();
    assert!(!demo.files.contains_key("data>Content>B.txt"));
    assert!(demo.files.contains_key("data>Content>C.txt"));
}

#[tokio::test]
async fn test_parity_violations_name_the_files() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    // A payload file no mapping entry covers
    let map = r#"<rootRecord>
  <metadata>data/Metadata/metadata.cmdi</metadata>
  <files>
    <file public="true">data/Content/a.wav</file>
    <file public="true">data/Content/ghost.txt</file>
  </files>
</rootRecord>"#;
    std::fs::write(dir.path().join("recordmap.xml"), map).unwrap();
    write_file(dir.path(), "data/Content/stray.txt", b"stray");
    write_manifest(dir.path());

    let repository = FakeRepository::default();
    let engine = engine(&repository, None);
    let mut report = Report::new();
    let err = engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Validation(_)));

    let messages: Vec<_> = report.items().iter().map(|i| i.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("ghost.txt")));
    assert!(messages.iter().any(|m| m.contains("stray.txt")));
    assert_eq!(repository.draft_count(), 0, "nothing was created");
}

#[tokio::test]
async fn test_tree_edges_are_symmetric() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "data/Metadata/metadata.cmdi", cmdi("Demo").as_bytes());
    write_file(dir.path(), "data/Content/root.txt", b"root");
    write_file(dir.path(), "data/Content/audio/a.wav", b"riff");
    write_file(dir.path(), "data/Content/audio/takes/t1.wav", b"riff2");
    write_file(dir.path(), "data/Content/text/b.txt", b"text");
    let map = r#"<rootRecord>
  <metadata>data/Metadata/metadata.cmdi</metadata>
  <files><file public="true">data/Content/root.txt</file></files>
  <records>
    <record title="Audio">
      <files><file public="true">data/Content/audio/a.wav</file></files>
      <records>
        <record title="Takes">
          <files><file public="true">data/Content/audio/takes/t1.wav</file></files>
        </record>
      </records>
    </record>
    <record title="Text">
      <files><file public="true">data/Content/text/b.txt</file></files>
    </record>
  </records>
</rootRecord>"#;
    std::fs::write(dir.path().join("recordmap.xml"), map).unwrap();
    write_manifest(dir.path());

    let repository = FakeRepository::default();
    let engine = engine(&repository, None);
    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap();

    // Three parent/child pairs give six part edges; the preservation
    // cross-link adds two more
    let total_edges: usize = repository
        .published_records()
        .iter()
        .map(|r| r.metadata.related_identifiers.len())
        .sum();
    assert_eq!(total_edges, 3 * 2 + 2);

    let audio = repository.published_by_title("Demo: Audio").unwrap();
    let takes = repository.published_by_title("Demo: Audio: Takes").unwrap();
    assert!(audio
        .record
        .metadata
        .related_identifiers
        .iter()
        .any(|e| e.identifier.ends_with(takes.record.id.as_deref().unwrap())));
}

#[tokio::test]
async fn test_rollback_leaves_no_drafts_or_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    let registrar = FakeRegistrar::default();
    registrar.fail_metadata.store(true, Ordering::SeqCst);
    let engine = engine(&repository, Some(&registrar));

    let mut report = Report::new();
    let err = engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::RemoteOperation(_)));

    assert_eq!(repository.draft_count(), 0);
    assert_eq!(registrar.draft_count(), 0);
    assert!(repository.published_records().is_empty());
}

#[tokio::test]
async fn test_partial_publication_still_publishes_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    repository
        .fail_publish_titles
        .lock()
        .unwrap()
        .push("Demo: Preservation information".to_string());
    let registrar = FakeRegistrar::default();
    let engine = engine(&repository, Some(&registrar));

    let mut report = Report::new();
    let err = engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap_err();
    match err {
        IngestError::PartialPublication(failed) => assert_eq!(failed.len(), 1),
        other => panic!("expected a partial publication, got {other:?}"),
    }

    // The root record made it out and its minted identifier went findable
    assert!(repository.published_by_title("Demo").is_some());
    assert_eq!(registrar.findable_count(), 1);
    assert_eq!(registrar.draft_count(), 0);
}

#[tokio::test]
async fn test_consistency_summarizes_a_failing_draft() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    let engine = engine(&repository, None);

    let mut report = Report::new();
    let mut opts = options(false);
    opts.publish_records = false;
    let root = engine.deposit(dir.path(), &opts, &mut report).await.unwrap();

    // The package changes underneath the uploaded draft
    write_file(dir.path(), "data/Content/a.wav", b"tampered");

    let validator = ConsistencyValidator::new(&repository, dir.path());
    let mut report = Report::new();
    let passed = validator.validate(&root, &mut report).await.unwrap();
    assert!(!passed);

    let messages: Vec<_> = report.items().iter().map(|i| i.message.as_str()).collect();
    assert!(messages.iter().any(|m| m.contains("a.wav")));
    assert!(messages
        .iter()
        .any(|m| m.contains("1 of 2 files failed verification")));
}

#[tokio::test]
async fn test_successful_run_leaves_no_placeholder_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    base_package(dir.path());
    let repository = FakeRepository::default();
    let registrar = FakeRegistrar::default();
    let engine = engine(&repository, Some(&registrar));

    let mut report = Report::new();
    engine
        .deposit(dir.path(), &options(false), &mut report)
        .await
        .unwrap();

    for record in repository.published_records() {
        for identifier in &record.metadata.alternate_identifiers {
            assert!(
                !is_placeholder(&identifier.value),
                "{} still carries a placeholder",
                record.metadata.title
            );
        }
    }
    let demo = repository.published_by_title("Demo").unwrap();
    let doi = demo
        .record
        .metadata
        .alternate_identifiers
        .iter()
        .find(|i| i.scheme == IdentifierScheme::Doi)
        .unwrap();
    assert!(doi.value.starts_with(PREFIX));
    assert_eq!(registrar.findable_count(), 1);
    assert_eq!(registrar.draft_count(), 0);

    // The rewritten metadata document references the minted identifier
    let content = String::from_utf8(demo.files["data>Metadata>metadata.cmdi"].clone()).unwrap();
    assert!(content.contains(&format!("https://doi.org/{}", doi.value)));
    assert!(content.contains("LandingPage"));
}
