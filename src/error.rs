//! Error types for the gradesheet library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * [`GradesheetError`]: **Fatal**: the analysis cannot start or its result
//!   cannot be delivered (page file missing, undecodable input, invalid
//!   pattern configuration, output not writable). Returned as
//!   `Err(GradesheetError)` from the top-level `analyze*` functions.
//!
//! * [`Diagnostic`]: **Non-fatal**: something about the document was odd
//!   (a page without text, no department header, an unrecognised grade) but
//!   extraction carried on. Collected in
//!   [`crate::output::AnalysisReport::diagnostics`].
//!
//! The three extraction passes themselves never fail; every degenerate input
//! resolves to an empty or default value plus, at most, a diagnostic.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the gradesheet library.
#[derive(Debug, Error)]
pub enum GradesheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Page file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was read but its pages could not be decoded.
    #[error("Invalid page file '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or profile loading failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal finding about the analysed document.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A page had no extractable text and was skipped.
    #[error("Page {page}: no text, skipped")]
    MissingPageText { page: usize },

    /// No line anywhere in the document looked like a department header.
    #[error("No department header found in document")]
    NoHeaderFound,

    /// The requested department's header never appeared.
    #[error("Department '{department}' not found in document")]
    TargetNotFound { department: String },

    /// A grade token had no entry in the grade tables.
    #[error("{department}: {reg_no} {subject}: unknown grade '{grade}'")]
    UnknownGradeToken {
        department: String,
        reg_no: String,
        subject: String,
        grade: String,
    },
}
