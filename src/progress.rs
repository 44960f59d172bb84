//! Progress-callback trait for per-department analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the analysis works through each department of a document.
//!
//! # Example
//!
//! ```rust
//! use gradesheet::{AnalysisProgressCallback, ExtractionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct StudentCounter {
//!     students: Arc<AtomicUsize>,
//! }
//!
//! impl AnalysisProgressCallback for StudentCounter {
//!     fn on_department_complete(&self, department: &str, _total: usize, students: usize) {
//!         self.students.fetch_add(students, Ordering::SeqCst);
//!         eprintln!("{department}: {students} students");
//!     }
//! }
//!
//! let counter = Arc::new(StudentCounter {
//!     students: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis as it processes each department.
///
/// Implementations must be `Send + Sync`: departments of one document may be
/// processed on different worker threads. All methods default to no-ops.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once after the department scan, before any extraction.
    fn on_analysis_start(&self, total_departments: usize) {
        let _ = total_departments;
    }

    /// Called when a worker picks up a department.
    fn on_department_start(&self, department: &str, total_departments: usize) {
        let _ = (department, total_departments);
    }

    /// Called when a department's records are built.
    ///
    /// # Arguments
    /// * `students`: number of student records produced (0 when the
    ///   department's header never appeared)
    fn on_department_complete(&self, department: &str, total_departments: usize, students: usize) {
        let _ = (department, total_departments, students);
    }

    /// Called once after every department has been processed.
    fn on_analysis_complete(&self, total_departments: usize, total_students: usize) {
        let _ = (total_departments, total_students);
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
