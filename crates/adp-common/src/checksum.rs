//! Checksum utilities for file verification
//!
//! Remote file listings carry checksums as `<algorithm>:<hex>` strings
//! (e.g. `md5:9e107d9d...`). Local files are hashed with the same
//! algorithm for idempotent-update detection and post-upload validation.

use crate::error::{AdpError, Result};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Checksum algorithm type
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Md5 => write!(f, "md5"),
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = AdpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(AdpError::InvalidChecksum(other.to_string())),
        }
    }
}

/// A parsed `<algorithm>:<hex>` checksum string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumString {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

impl ChecksumString {
    /// Compute the checksum of a file with the given algorithm
    pub fn of_file(path: impl AsRef<Path>, algorithm: ChecksumAlgorithm) -> Result<Self> {
        let mut file = std::fs::File::open(path)?;
        let digest = compute_checksum(&mut file, algorithm)?;
        Ok(Self { algorithm, digest })
    }

    /// Verify this checksum against a local file
    ///
    /// The local file is hashed with this checksum's algorithm, so the
    /// comparison is always like-for-like.
    pub fn verify_file(&self, path: impl AsRef<Path>) -> Result<bool> {
        let actual = Self::of_file(path, self.algorithm)?;
        Ok(actual.digest.eq_ignore_ascii_case(&self.digest))
    }
}

impl std::fmt::Display for ChecksumString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

impl FromStr for ChecksumString {
    type Err = AdpError;

    fn from_str(s: &str) -> Result<Self> {
        let (algorithm, digest) = s
            .split_once(':')
            .ok_or_else(|| AdpError::InvalidChecksum(s.to_string()))?;
        if digest.is_empty() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AdpError::InvalidChecksum(s.to_string()));
        }
        Ok(Self {
            algorithm: algorithm.parse()?,
            digest: digest.to_lowercase(),
        })
    }
}

/// Compute checksum for any readable source
pub fn compute_checksum<R: Read>(reader: &mut R, algorithm: ChecksumAlgorithm) -> Result<String> {
    match algorithm {
        ChecksumAlgorithm::Md5 => {
            let mut context = md5::Context::new();
            let mut buffer = [0u8; 8192];

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }

            Ok(format!("{:x}", context.compute()))
        },
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            let mut buffer = [0u8; 8192];

            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                hasher.update(&buffer[..bytes_read]);
            }

            Ok(hex::encode(hasher.finalize()))
        },
    }
}

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: impl AsRef<Path>,
    algorithm: ChecksumAlgorithm,
) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    compute_checksum(&mut file, algorithm)
}

/// Verify a file against an expected digest, returning a structured error on mismatch
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &ChecksumString,
) -> Result<()> {
    let path = path.as_ref();
    let actual = compute_file_checksum(path, expected.algorithm)?;
    if actual.eq_ignore_ascii_case(&expected.digest) {
        Ok(())
    } else {
        Err(AdpError::ChecksumMismatch {
            file: path.display().to_string(),
            expected: expected.to_string(),
            actual: format!("{}:{}", expected.algorithm, actual),
        })
    }
}
