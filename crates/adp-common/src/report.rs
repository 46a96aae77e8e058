//! Diagnostic report shared by all pipeline stages
//!
//! Every public engine operation appends its findings here in addition to
//! returning a value. Items are tagged with a severity and a bucket (the
//! stage or subsystem that produced them) so an operator can see exactly
//! which stage failed and why, even when the run as a whole succeeded.

use serde::{Deserialize, Serialize};

/// Severity of a single report item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A fatal finding; the run cannot be considered successful
    Critical,
    /// A suspicious finding that did not stop the run
    Warning,
    /// Informational note about what the run did
    Note,
    /// Positive confirmation that a check passed
    Correct,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Correct => write!(f, "correct"),
        }
    }
}

/// One diagnostic finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    /// Which subsystem produced this finding (e.g. "uploader", "package")
    pub bucket: String,
    pub severity: Severity,
    pub message: String,
}

/// Bucketed, severity-tagged collection of findings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    items: Vec<ReportItem>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bucket: impl Into<String>, severity: Severity, message: impl Into<String>) {
        self.items.push(ReportItem {
            bucket: bucket.into(),
            severity,
            message: message.into(),
        });
    }

    pub fn add_critical(&mut self, bucket: impl Into<String>, message: impl Into<String>) {
        self.add(bucket, Severity::Critical, message);
    }

    pub fn add_warning(&mut self, bucket: impl Into<String>, message: impl Into<String>) {
        self.add(bucket, Severity::Warning, message);
    }

    pub fn add_note(&mut self, bucket: impl Into<String>, message: impl Into<String>) {
        self.add(bucket, Severity::Note, message);
    }

    pub fn add_correct(&mut self, bucket: impl Into<String>, message: impl Into<String>) {
        self.add(bucket, Severity::Correct, message);
    }

    /// Record an error as a critical finding without consuming it
    pub fn add_error(
        &mut self,
        bucket: impl Into<String>,
        error: &dyn std::error::Error,
        context: impl Into<String>,
    ) {
        self.add(
            bucket,
            Severity::Critical,
            format!("{}: {}", context.into(), error),
        );
    }

    /// Append all items from another report
    pub fn merge(&mut self, other: Report) {
        self.items.extend(other.items);
    }

    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any critical finding has been recorded
    pub fn has_critical(&self) -> bool {
        self.count(Severity::Critical) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|i| i.severity == severity).count()
    }

    /// Render a plain-text summary for CLI output
    pub fn summary(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} findings ({} critical, {} warnings, {} notes, {} correct)",
            self.items.len(),
            self.count(Severity::Critical),
            self.count(Severity::Warning),
            self.count(Severity::Note),
            self.count(Severity::Correct),
        );
        for item in self.items.iter().filter(|i| i.severity == Severity::Critical) {
            let _ = writeln!(out, "  [{}] {}", item.bucket, item.message);
        }
        out
    }
}
