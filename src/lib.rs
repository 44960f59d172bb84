//! # gradesheet
//!
//! Extract department, student and grade records from the page text of
//! university result sheets.
//!
//! ## Why this crate?
//!
//! Result sheets are printed for humans: one long run of pages where a
//! department header line introduces a section, a register number at the
//! start of a line introduces a student, and that student's
//! `SUBJECT (GRADE)` tokens wrap across lines and pages, interleaved with
//! running headers and legends. Nothing in the text marks where a student
//! or a department ends. This crate recovers that structure from the
//! textual markers alone, failing open: a document that does not follow the
//! conventions produces partial or empty output, never an error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! page text (one string per page, or absent)
//!  │
//!  ├─ 1. Scan      ordered, de-duplicated department names
//!  ├─ 2. Section   per department: state machine → per-student text blocks
//!  ├─ 3. Records   per block: SUBJECT (GRADE) tokens → points + status,
//!  │               plus the department's sorted subject catalog
//!  └─ 4. Report    departments, diagnostics, stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use gradesheet::{analyze_pages, ExtractionConfig, PageSource};
//!
//! let pages = PageSource::from_text(
//!     "COMPUTER SCIENCE ENGINEERING [Full Time]\n\
//!      TKM22CS001 CST201 (A) CST203 (B+)\n\
//!      TKM22CS002 CST201 (F)\n",
//! );
//! let report = analyze_pages(&pages, &ExtractionConfig::default());
//!
//! let cse = &report.departments[0];
//! assert_eq!(cse.department.as_str(), "COMPUTER SCIENCE ENGINEERING");
//! assert_eq!(cse.subjects, vec!["CST201", "CST203"]);
//! assert_eq!(cse.students[0].subjects["CST203"].grade_point, 7.0);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gradesheet` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze, analyze_department, analyze_pages, analyze_sync, analyze_to_file, inspect,
    inspect_pages,
};
pub use config::{
    ConfigProfile, DepartmentSelection, ExtractionConfig, ExtractionConfigBuilder, GradeTable,
};
pub use error::{Diagnostic, GradesheetError};
pub use output::{
    AnalysisReport, AnalysisStats, DepartmentName, DepartmentResult, GradeMatrix, GradeStatus,
    InspectReport, MatrixRow, RecordSet, StudentBlock, StudentRecord, SubjectResult,
};
pub use pipeline::input::PageSource;
pub use pipeline::records::build_records;
pub use pipeline::scan::scan_departments;
pub use pipeline::section::extract_section;
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::analyze_stream;
