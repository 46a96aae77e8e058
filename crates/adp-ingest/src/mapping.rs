//! File-to-record mapping resolution
//!
//! A package either carries an explicit mapping document (`recordmap.xml`)
//! describing a tree of records, or a single-record mapping is synthesized
//! from a recursive scan of its `data/` directory. The resolved tree is a
//! plan for the uploader; it never touches the network.
//!
//! Mapping document shape:
//!
//! ```xml
//! <rootRecord>
//!   <metadata>data/Metadata/metadata.cmdi</metadata>
//!   <files>
//!     <file public="true">data/Content/audio/a.wav</file>
//!   </files>
//!   <records>
//!     <record title="Audio recordings">
//!       <files>...</files>
//!       <records>...</records>
//!     </record>
//!   </records>
//! </rootRecord>
//! ```

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

/// Name of the explicit mapping document at the package root
pub const RECORD_MAP_FILE: &str = "recordmap.xml";

/// Conventional location of the descriptive metadata document
pub const METADATA_PATH: &str = "data/Metadata/metadata.cmdi";

/// Title suffix for records produced by the private-file split
pub const PRIVATE_RECORD_MARKER: &str = " - Private files";

/// Title used when a parent without an explicit title is split
const PRIVATE_RECORD_BARE_TITLE: &str = "Private files";

/// Whether a record title marks a private-split record
///
/// Private-split records deliberately omit the shared metadata document so
/// the same descriptive document is not published twice.
pub fn is_private_split_title(title: &str) -> bool {
    title == PRIVATE_RECORD_BARE_TITLE || title.ends_with(PRIVATE_RECORD_MARKER)
}

/// One file entry of a record: package-relative path plus visibility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFile {
    /// Visibility; files default to private unless marked public
    #[serde(rename = "@public", default)]
    pub public: bool,

    /// Path relative to the package root, `/`-separated
    #[serde(rename = "$text")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(rename = "file", default)]
    pub entries: Vec<MapFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordList {
    #[serde(rename = "record", default)]
    pub entries: Vec<MapRecord>,
}

/// One node of the resolved record tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    /// Title override, appended to the parent title at upload time
    #[serde(rename = "@title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Package-relative path of this record's metadata document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    #[serde(default)]
    pub files: FileList,

    #[serde(default)]
    pub records: RecordList,
}

impl MapRecord {
    pub fn files(&self) -> &[MapFile] {
        &self.files.entries
    }

    pub fn children(&self) -> &[MapRecord] {
        &self.records.entries
    }

    /// All package-relative file paths referenced by this subtree,
    /// including metadata documents
    pub fn referenced_files(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(metadata) = &self.metadata {
            out.push(metadata.as_str());
        }
        for file in self.files() {
            out.push(file.name.as_str());
        }
        for child in self.children() {
            child.collect_files(out);
        }
    }
}

/// Resolve the mapping for a package
///
/// Parses `recordmap.xml` when present, otherwise synthesizes a single-node
/// mapping from the `data/` scan with `files_public` as the default
/// visibility. With `separate_private`, private files are moved into
/// dedicated sibling records.
pub fn resolve(package_root: &Path, files_public: bool, separate_private: bool) -> Result<MapRecord> {
    let map_path = package_root.join(RECORD_MAP_FILE);
    let mapping = if map_path.exists() {
        let content = std::fs::read_to_string(&map_path)?;
        quick_xml::de::from_str(&content).map_err(|e| {
            IngestError::mapping_parse(map_path.display().to_string(), e.to_string())
        })?
    } else {
        synthesize(package_root, files_public)?
    };

    if separate_private {
        Ok(separate_private_files(&mapping))
    } else {
        Ok(mapping)
    }
}

/// Synthesize a single-record mapping from the package's data directory
fn synthesize(package_root: &Path, files_public: bool) -> Result<MapRecord> {
    let data_dir = package_root.join("data");
    let mut entries = Vec::new();
    for entry in WalkDir::new(&data_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            IngestError::mapping_parse(
                data_dir.display().to_string(),
                format!("cannot scan data directory: {e}"),
            )
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
        // The metadata document is referenced separately, not as a file entry
        if name == METADATA_PATH {
            continue;
        }
        entries.push(MapFile {
            public: files_public,
            name,
        });
    }

    Ok(MapRecord {
        title: None,
        metadata: Some(METADATA_PATH.to_string()),
        files: FileList { entries },
        records: RecordList::default(),
    })
}

/// Move private files into dedicated child records, recursively
///
/// A node that has any private files keeps its public files and gains a
/// child record holding the private ones, titled with the fixed marker.
/// The metadata path is copied to the private record so its descriptive
/// context is preserved, but the uploader will not re-publish the document
/// there.
pub fn separate_private_files(record: &MapRecord) -> MapRecord {
    let (private, public): (Vec<MapFile>, Vec<MapFile>) =
        record.files().iter().cloned().partition(|f| !f.public);

    let mut result = MapRecord {
        title: record.title.clone(),
        metadata: record.metadata.clone(),
        files: FileList { entries: public },
        records: RecordList::default(),
    };

    if !private.is_empty() {
        let title = match &record.title {
            Some(t) => format!("{t}{PRIVATE_RECORD_MARKER}"),
            None => PRIVATE_RECORD_BARE_TITLE.to_string(),
        };
        result.records.entries.push(MapRecord {
            title: Some(title),
            metadata: record.metadata.clone(),
            files: FileList { entries: private },
            records: RecordList::default(),
        });
    } else {
        result.files = FileList {
            entries: record.files().to_vec(),
        };
    }

    result
        .records
        .entries
        .extend(record.children().iter().map(separate_private_files));
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <rootRecord>
          <metadata>data/Metadata/metadata.cmdi</metadata>
          <files>
            <file public="true">data/Content/readme.txt</file>
            <file>data/Content/internal.txt</file>
          </files>
          <records>
            <record title="Audio">
              <files>
                <file public="true">data/Content/audio/a.wav</file>
              </files>
            </record>
          </records>
        </rootRecord>
    "#;

    #[test]
    fn test_parse_mapping_document() {
        let mapping: MapRecord = quick_xml::de::from_str(SAMPLE).unwrap();
        assert_eq!(mapping.metadata.as_deref(), Some("data/Metadata/metadata.cmdi"));
        assert_eq!(mapping.files().len(), 2);
        assert!(mapping.files()[0].public);
        assert!(!mapping.files()[1].public);
        assert_eq!(mapping.children().len(), 1);
        assert_eq!(mapping.children()[0].title.as_deref(), Some("Audio"));
    }

    #[test]
    fn test_malformed_mapping_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(RECORD_MAP_FILE), "<rootRecord><files>").unwrap();
        let err = resolve(dir.path(), true, false).unwrap_err();
        assert!(matches!(err, IngestError::MappingParse { .. }));
    }

    #[test]
    fn test_synthesized_mapping_covers_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data/Metadata")).unwrap();
        std::fs::create_dir_all(dir.path().join("data/Content/audio")).unwrap();
        std::fs::write(dir.path().join("data/Metadata/metadata.cmdi"), "<CMD/>").unwrap();
        std::fs::write(dir.path().join("data/Content/audio/a.wav"), "riff").unwrap();
        std::fs::write(dir.path().join("data/Content/notes.txt"), "notes").unwrap();

        let mapping = resolve(dir.path(), true, false).unwrap();
        assert_eq!(mapping.metadata.as_deref(), Some(METADATA_PATH));
        let names: Vec<_> = mapping.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["data/Content/audio/a.wav", "data/Content/notes.txt"]);
        assert!(mapping.files().iter().all(|f| f.public));
        assert!(mapping.children().is_empty());
    }

    #[test]
    fn test_referenced_files_recurses() {
        let mapping: MapRecord = quick_xml::de::from_str(SAMPLE).unwrap();
        let mut referenced = mapping.referenced_files();
        referenced.sort_unstable();
        assert_eq!(
            referenced,
            vec![
                "data/Content/audio/a.wav",
                "data/Content/internal.txt",
                "data/Content/readme.txt",
                "data/Metadata/metadata.cmdi",
            ]
        );
    }

    #[test]
    fn test_private_split_moves_private_files() {
        let mapping: MapRecord = quick_xml::de::from_str(SAMPLE).unwrap();
        let split = separate_private_files(&mapping);

        let names: Vec<_> = split.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["data/Content/readme.txt"]);

        // Private child first, then the original child records
        assert_eq!(split.children().len(), 2);
        let private = &split.children()[0];
        assert_eq!(private.title.as_deref(), Some(PRIVATE_RECORD_BARE_TITLE));
        assert!(is_private_split_title(private.title.as_deref().unwrap()));
        assert_eq!(private.metadata, mapping.metadata);
        assert_eq!(private.files()[0].name, "data/Content/internal.txt");

        // The fully-public child is unchanged apart from the recursion
        let audio = &split.children()[1];
        assert_eq!(audio.title.as_deref(), Some("Audio"));
        assert_eq!(audio.files().len(), 1);
    }

    #[test]
    fn test_private_split_titled_parent_uses_marker_suffix() {
        let mut mapping: MapRecord = quick_xml::de::from_str(SAMPLE).unwrap();
        mapping.title = Some("Corpus".to_string());
        let split = separate_private_files(&mapping);
        assert_eq!(
            split.children()[0].title.as_deref(),
            Some("Corpus - Private files")
        );
    }
}
