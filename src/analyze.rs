//! Whole-document analysis entry points.
//!
//! The three passes in [`crate::pipeline`] work on one department at a time.
//! This module strings them together for a whole document: scan once, pick
//! the target departments from [`ExtractionConfig::departments`], then run
//! section extraction and record building for each target and collect the
//! results with their diagnostics.
//!
//! [`analyze_pages`] does this sequentially on in-memory pages. [`analyze`]
//! loads a page file and runs departments concurrently, one worker per
//! department; a department is never split across workers because the
//! section state machine depends on line order.

use crate::config::ExtractionConfig;
use crate::error::{Diagnostic, GradesheetError};
use crate::output::{
    AnalysisReport, AnalysisStats, DepartmentName, DepartmentResult, GradeStatus, InspectReport,
};
use crate::pipeline::input::{self, PageSource};
use crate::pipeline::{records, scan, section};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Analyse a page file.
///
/// # Arguments
/// * `input` : path to a form-feed separated text file or a JSON page array
/// * `config`: extraction configuration
///
/// # Errors
/// Only for fatal input problems (file not found, unreadable, undecodable).
/// A document without departments or students is an `Ok` report with
/// diagnostics.
pub async fn analyze(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<AnalysisReport, GradesheetError> {
    let started = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting analysis: {}", input_str);

    let pages = input::resolve_input(input_str).await?;
    let (scanned, targets) = plan(&pages, config);

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(targets.len());
    }

    let pages = Arc::new(pages);
    let shared = Arc::new(config.clone());
    let total = targets.len();

    let mut indexed: Vec<(usize, DepartmentResult)> =
        stream::iter(targets.into_iter().enumerate().map(|(idx, dept)| {
            let pages = Arc::clone(&pages);
            let config = Arc::clone(&shared);
            async move {
                tokio::task::spawn_blocking(move || {
                    (idx, run_department(&pages, dept, &config, total))
                })
                .await
                .map_err(|e| GradesheetError::Internal(format!("Department task panicked: {e}")))
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_, _>>()?;

    // Completion order is arbitrary; report in scan order.
    indexed.sort_by_key(|(idx, _)| *idx);
    let results = indexed.into_iter().map(|(_, r)| r).collect();

    Ok(assemble_report(&pages, &scanned, results, started, config))
}

/// Analyse in-memory pages on the current thread.
pub fn analyze_pages(pages: &PageSource, config: &ExtractionConfig) -> AnalysisReport {
    let started = Instant::now();
    let (scanned, targets) = plan(pages, config);

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(targets.len());
    }

    let total = targets.len();
    let results = targets
        .into_iter()
        .map(|dept| run_department(pages, dept, config, total))
        .collect();

    assemble_report(pages, &scanned, results, started, config)
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<AnalysisReport, GradesheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GradesheetError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze(input_str, config))
}

/// Analyse a page file and write the report as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn analyze_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<AnalysisStats, GradesheetError> {
    let report = analyze(input_str, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| GradesheetError::Internal(format!("Failed to serialise report: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GradesheetError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json)
        .await
        .map_err(|e| GradesheetError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| GradesheetError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(report.stats)
}

/// List the departments and missing pages of a page file without
/// extracting any students.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<InspectReport, GradesheetError> {
    let pages = input::resolve_input(input_str.as_ref()).await?;
    Ok(inspect_pages(&pages, config))
}

/// In-memory counterpart of [`inspect`].
pub fn inspect_pages(pages: &PageSource, config: &ExtractionConfig) -> InspectReport {
    InspectReport {
        total_pages: pages.len(),
        missing_pages: pages.missing_pages(),
        departments: scan::scan_departments(pages, config),
    }
}

/// Extract and build records for one department.
pub fn analyze_department(
    pages: &PageSource,
    department: &str,
    config: &ExtractionConfig,
) -> DepartmentResult {
    let section = section::scan_section(pages, department, config);
    let set = records::build_records(&section.blocks, config);

    DepartmentResult {
        department: DepartmentName::new(department),
        found: section.found,
        subjects: set.subjects,
        students: set.students,
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Scan the document and resolve the department selection.
pub(crate) fn plan(
    pages: &PageSource,
    config: &ExtractionConfig,
) -> (Vec<DepartmentName>, Vec<DepartmentName>) {
    let scanned = scan::scan_departments(pages, config);
    let targets = config.departments.targets(&scanned);
    debug!("Selected {} of {} departments", targets.len(), scanned.len());
    (scanned, targets)
}

/// [`analyze_department`] wrapped in progress events.
pub(crate) fn run_department(
    pages: &PageSource,
    department: DepartmentName,
    config: &ExtractionConfig,
    total: usize,
) -> DepartmentResult {
    if let Some(ref cb) = config.progress_callback {
        cb.on_department_start(department.as_str(), total);
    }

    let result = analyze_department(pages, department.as_str(), config);

    if let Some(ref cb) = config.progress_callback {
        cb.on_department_complete(department.as_str(), total, result.students.len());
    }
    result
}

/// Non-fatal findings for one department's result.
pub(crate) fn department_diagnostics(result: &DepartmentResult) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if !result.found {
        warn!("Department '{}' not found in document", result.department);
        diagnostics.push(Diagnostic::TargetNotFound {
            department: result.department.to_string(),
        });
    }

    for student in &result.students {
        for (subject, r) in &student.subjects {
            if r.status == GradeStatus::Unknown {
                warn!(
                    "Unknown grade '{}' for {} {} in {}",
                    r.grade, student.reg_no, subject, result.department
                );
                diagnostics.push(Diagnostic::UnknownGradeToken {
                    department: result.department.to_string(),
                    reg_no: student.reg_no.clone(),
                    subject: subject.clone(),
                    grade: r.grade.clone(),
                });
            }
        }
    }

    diagnostics
}

/// Document-level findings: missing pages and an empty department scan.
pub(crate) fn document_diagnostics(
    pages: &PageSource,
    scanned: &[DepartmentName],
) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = pages
        .missing_pages()
        .into_iter()
        .map(|page| {
            warn!("Empty text on page {}", page);
            Diagnostic::MissingPageText { page }
        })
        .collect();

    if scanned.is_empty() {
        warn!("No department header found in document");
        diagnostics.push(Diagnostic::NoHeaderFound);
    }
    diagnostics
}

fn assemble_report(
    pages: &PageSource,
    scanned: &[DepartmentName],
    departments: Vec<DepartmentResult>,
    started: Instant,
    config: &ExtractionConfig,
) -> AnalysisReport {
    let mut diagnostics = document_diagnostics(pages, scanned);
    for dept in &departments {
        diagnostics.extend(department_diagnostics(dept));
    }

    let students: usize = departments.iter().map(|d| d.students.len()).sum();
    let stats = AnalysisStats {
        total_pages: pages.len(),
        missing_pages: pages.missing_pages().len(),
        departments: departments.len(),
        students,
        subjects: departments.iter().map(|d| d.subjects.len()).sum(),
        duration_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "Analysis complete: {} departments, {} students, {}ms",
        stats.departments, stats.students, stats.duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_complete(departments.len(), students);
    }

    AnalysisReport {
        departments,
        diagnostics,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DepartmentSelection;

    const DOC: &str = "APJ ABDUL KALAM TECHNOLOGICAL UNIVERSITY\n\
        CIVIL ENGINEERING [Full Time]\n\
        TKM22CE001 CET201 (A) CET203 (B)\n\
        TKM22CE002 CET201 (Absent)\n\
        MECHANICAL ENGINEERING [Full Time]\n\
        TKM22ME001 MET201 (S)";

    fn pages() -> PageSource {
        vec![Some(DOC), None].into_iter().collect()
    }

    #[test]
    fn analyses_every_department_in_scan_order() {
        let report = analyze_pages(&pages(), &ExtractionConfig::default());
        let names: Vec<&str> = report
            .departments
            .iter()
            .map(|d| d.department.as_str())
            .collect();
        assert_eq!(names, vec!["CIVIL ENGINEERING", "MECHANICAL ENGINEERING"]);
        assert_eq!(report.stats.students, 3);
        assert_eq!(report.stats.subjects, 3);
        assert_eq!(report.stats.total_pages, 2);
        assert_eq!(report.stats.missing_pages, 1);
    }

    #[test]
    fn collects_diagnostics() {
        let report = analyze_pages(&pages(), &ExtractionConfig::default());
        assert_eq!(
            report.diagnostics,
            vec![
                Diagnostic::MissingPageText { page: 2 },
                Diagnostic::UnknownGradeToken {
                    department: "CIVIL ENGINEERING".into(),
                    reg_no: "TKM22CE002".into(),
                    subject: "CET201".into(),
                    grade: "Absent".into(),
                },
            ]
        );
    }

    #[test]
    fn selected_but_absent_department_is_reported() {
        let config = ExtractionConfig::builder()
            .departments(DepartmentSelection::Only(vec![
                "mechanical engineering".into(),
                "Chemical Engineering".into(),
            ]))
            .build()
            .unwrap();
        let report = analyze_pages(&pages(), &config);

        assert_eq!(report.departments.len(), 2);
        let chem = report.department("CHEMICAL ENGINEERING").unwrap();
        assert!(!chem.found);
        assert!(chem.students.is_empty());
        assert!(report.diagnostics.contains(&Diagnostic::TargetNotFound {
            department: "CHEMICAL ENGINEERING".into()
        }));
    }

    #[test]
    fn headerless_document() {
        let pages: PageSource = vec![Some("just some text")].into_iter().collect();
        let report = analyze_pages(&pages, &ExtractionConfig::default());
        assert!(report.departments.is_empty());
        assert_eq!(report.diagnostics, vec![Diagnostic::NoHeaderFound]);
    }

    #[test]
    fn missing_page_is_logged_once_per_document() {
        use std::io;
        use std::sync::Mutex;

        #[derive(Clone)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured(Arc::new(Mutex::new(Vec::new())));
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        // Two departments: the pages are read once by the scan and once per
        // department.
        tracing::subscriber::with_default(subscriber, || {
            analyze_pages(&pages(), &ExtractionConfig::default())
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("Empty text on page 2").count(), 1, "logs:\n{logs}");
    }

    #[test]
    fn inspect_lists_without_extracting() {
        let report = inspect_pages(&pages(), &ExtractionConfig::default());
        assert_eq!(report.total_pages, 2);
        assert_eq!(report.missing_pages, vec![2]);
        assert_eq!(report.departments.len(), 2);
    }
}
