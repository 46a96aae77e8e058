//! ADP Ingest Library
//!
//! Deposits a hierarchical submission package into a draft-based digital
//! repository, verifies the uploaded tree against checksums, mints persistent
//! identifiers, and publishes the result. Any failure before publication
//! rolls the whole run back.
//!
//! # Pipeline
//!
//! 1. Resolve the file-to-record mapping (`mapping`)
//! 2. Validate package fixity and mapping/disk parity (`package`)
//! 3. Upload the record tree as drafts with idempotent updates (`uploader`)
//! 4. Re-verify every uploaded file checksum (`consistency`)
//! 5. Mint identifiers and rewrite metadata documents (`identifiers`, `cmdi`)
//! 6. Publish records and identifiers (`publication`)
//!
//! The whole sequence runs under a single bounded-wait ingest lock
//! (`transaction`); failures between upload and identifier assignment delete
//! every draft record and draft identifier created by the run.
//!
//! # Example
//!
//! ```no_run
//! use adp_ingest::engine::{IngestEngine, IngestOptions};
//! use adp_ingest::package::ManifestFixityChecker;
//! use adp_ingest::repository::client::RepositoryClient;
//! use adp_common::Report;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let repository = RepositoryClient::new("https://repo.example.org".into(), None)?;
//!     let engine = IngestEngine::builder(repository)
//!         .fixity(ManifestFixityChecker::default())
//!         .build();
//!     let mut report = Report::new();
//!     let root = engine
//!         .deposit("./sip".as_ref(), &IngestOptions::default(), &mut report)
//!         .await?;
//!     println!("deposited {root}");
//!     Ok(())
//! }
//! ```

pub mod cmdi;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod identifiers;
pub mod mapping;
pub mod package;
pub mod publication;
pub mod registrar;
pub mod repository;
pub mod transaction;
pub mod uploader;

pub use engine::{IngestEngine, IngestOptions};
pub use error::{IngestError, Result};
pub use repository::RecordId;
