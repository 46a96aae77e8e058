//! Error types for the ingest engine
//!
//! The variants follow the failure taxonomy of the pipeline: everything that
//! happens before any remote draft exists is a plain validation failure and
//! needs no rollback; remote failures between upload and identifier
//! assignment trigger rollback; publication failures are gathered because
//! published records cannot be taken back.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Comprehensive error type for the ingest pipeline
#[derive(Error, Debug)]
pub enum IngestError {
    /// Package or mapping inconsistency detected before upload
    #[error("Package validation failed: {0}. See the report for the individual findings.")]
    Validation(String),

    /// The explicit mapping document could not be parsed
    #[error("Invalid mapping document '{path}': {message}")]
    MappingParse { path: String, message: String },

    /// A record with the same title already exists and update mode was not requested
    #[error("A record titled '{0}' already exists. Re-run with update mode to create a new version.")]
    Conflict(String),

    /// A repository or registrar call failed during upload/validate/mint
    #[error("Remote operation failed: {0}")]
    RemoteOperation(String),

    /// Post-upload checksum verification failed
    #[error("Checksum verification failed for record {0}. The deposit cannot be published.")]
    ChecksumMismatch(String),

    /// A metadata self-link was present but matched no recognized identifier scheme
    #[error("Unable to extract a persistent identifier from self-link '{0}'")]
    IdentifierExtraction(String),

    /// One or more records could not be published; the rest already are
    #[error("Failed to publish records: {}", .0.join(", "))]
    PartialPublication(Vec<String>),

    /// The global ingest lock could not be acquired within the bound
    #[error("Could not acquire the ingest lock within {0:?}; another deposit is running")]
    LockTimeout(Duration),

    /// Descriptive metadata document could not be read or rewritten
    #[error("Metadata document error: {0}")]
    Metadata(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and paths.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your connection and service URLs.")]
    Http(#[from] reqwest::Error),

    /// JSON payload could not be parsed
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Shared utility error (checksums, IO helpers)
    #[error(transparent)]
    Common(#[from] adp_common::AdpError),
}

impl IngestError {
    /// Create a remote-operation error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::RemoteOperation(msg.into())
    }

    /// Create a metadata-document error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a mapping-parse error
    pub fn mapping_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MappingParse {
            path: path.into(),
            message: message.into(),
        }
    }
}
