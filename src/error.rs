//! The fatal error taxonomy for an import operation.
//!
//! Row-content problems are never errors in the `Result` sense: they are
//! collected as [`crate::issues::ImportIssue`] values and reported together.
//! Only two failure classes terminate processing:
//!
//! - [`ImportError::Structural`] — the document cannot be parsed as the
//!   configured dialect at all; surfaced to the operator as one
//!   document-level issue.
//! - [`ImportError::Configuration`] — a setup defect (bad mapping entry,
//!   invalid schema constraint), raised before any row is processed and
//!   never reported through the per-row channel.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The input is not parseable as the configured dialect.
    #[error("Bad CSV format: {0}")]
    Structural(String),

    /// The import was set up incorrectly; no row has been processed.
    #[error("Invalid import configuration: {0}")]
    Configuration(String),
}

impl ImportError {
    pub fn is_structural(&self) -> bool {
        matches!(self, ImportError::Structural(_))
    }
}
