//! Error types for ADP

use thiserror::Error;

/// Result type alias for ADP operations
pub type Result<T> = std::result::Result<T, AdpError>;

/// Main error type for ADP
#[derive(Error, Debug)]
pub enum AdpError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid checksum string '{0}': expected '<algorithm>:<hex>' with algorithm md5 or sha256")]
    InvalidChecksum(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
