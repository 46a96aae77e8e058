//! ADP Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the ADP project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all ADP workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: File integrity verification utilities
//! - **Report**: Bucketed, severity-tagged diagnostic report shared by all stages
//!
//! # Example
//!
//! ```no_run
//! use adp_common::{Result, AdpError};
//! use adp_common::checksum::ChecksumString;
//!
//! fn verify(path: &str, remote: &str) -> Result<bool> {
//!     let expected: ChecksumString = remote.parse()?;
//!     expected.verify_file(path)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod report;

// Re-export commonly used types
pub use error::{AdpError, Result};
pub use report::{Report, ReportItem, Severity};
