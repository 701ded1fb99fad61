//! Import issues and the batch-wide accumulator.
//!
//! Three issue shapes exist: document-level (no row), row-level (row but no
//! column), and field-level (row plus the column's display label). A field
//! issue without a row number is unrepresentable; the permissive
//! [`ImportIssue::attributed`] constructor rejects that combination for
//! callers assembling issues from optional parts.

use std::fmt;

use anyhow::{Result, bail};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportIssue {
    /// The whole document is unusable (e.g. malformed dialect).
    Document { message: String },
    /// One row failed for a reason not attributable to a single column.
    Row { row: usize, message: String },
    /// One row failed on one named column.
    Field {
        row: usize,
        label: String,
        message: String,
    },
}

impl ImportIssue {
    pub fn document(message: impl Into<String>) -> Self {
        ImportIssue::Document {
            message: message.into(),
        }
    }

    pub fn row(row: usize, message: impl Into<String>) -> Self {
        ImportIssue::Row {
            row,
            message: message.into(),
        }
    }

    pub fn field(row: usize, label: impl Into<String>, message: impl Into<String>) -> Self {
        ImportIssue::Field {
            row,
            label: label.into(),
            message: message.into(),
        }
    }

    /// Builds an issue from optional row/column attribution. A column with
    /// no row number is a caller bug, not user data, and fails hard.
    pub fn attributed(
        row: Option<usize>,
        label: Option<String>,
        message: impl Into<String>,
    ) -> Result<Self> {
        match (row, label) {
            (Some(row), Some(label)) => Ok(ImportIssue::field(row, label, message)),
            (Some(row), None) => Ok(ImportIssue::row(row, message)),
            (None, None) => Ok(ImportIssue::document(message)),
            (None, Some(label)) => {
                bail!("cannot attribute an issue to column '{label}' without a row number")
            }
        }
    }

    pub fn row_number(&self) -> Option<usize> {
        match self {
            ImportIssue::Document { .. } => None,
            ImportIssue::Row { row, .. } | ImportIssue::Field { row, .. } => Some(*row),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ImportIssue::Document { message }
            | ImportIssue::Row { message, .. }
            | ImportIssue::Field { message, .. } => message,
        }
    }
}

impl fmt::Display for ImportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportIssue::Document { message } => write!(f, "document: {message}"),
            ImportIssue::Row { row, message } => write!(f, "row {row}: {message}"),
            ImportIssue::Field {
                row,
                label,
                message,
            } => write!(f, "row {row}: column {label} - {message}"),
        }
    }
}

/// Collects issues across one import operation in encounter order.
///
/// The only signal the transaction controller consults is [`has_issues`];
/// everything else exists for operator reporting.
///
/// [`has_issues`]: IssueLog::has_issues
#[derive(Debug, Default)]
pub struct IssueLog {
    issues: Vec<ImportIssue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, issue: ImportIssue) {
        self.issues.push(issue);
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportIssue> {
        self.issues.iter()
    }

    pub fn into_issues(self) -> Vec<ImportIssue> {
        self.issues
    }
}
