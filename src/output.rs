//! Output types produced by the extraction passes and the analysis entry
//! points.
//!
//! Everything here is plain data with `serde` support so results can be
//! handed straight to a persistence or aggregation collaborator as JSON.

use crate::error::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ── Departments ──────────────────────────────────────────────────────────

/// Canonical department name, e.g. `COMPUTER SCIENCE ENGINEERING`.
///
/// Produced by the department scanner: trimmed, upper-cased and suffixed with
/// the configured qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentName(String);

impl DepartmentName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Collection name for per-department storage: lower-case, spaces become
    /// underscores, anything outside `[a-z0-9_]` is dropped.
    pub fn storage_key(&self) -> String {
        self.0
            .to_lowercase()
            .replace(' ', "_")
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
            .collect()
    }
}

impl fmt::Display for DepartmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DepartmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for DepartmentName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for DepartmentName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ── Section extraction ───────────────────────────────────────────────────

/// One student's raw text as cut out of a department section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentBlock {
    /// Register number that opened the block.
    pub reg_no: String,
    /// Fragments joined by single spaces, whitespace collapsed.
    pub text: String,
}

impl StudentBlock {
    pub fn new(reg_no: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reg_no: reg_no.into(),
            text: text.into(),
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────────

/// Pass / fail classification of a grade, looked up in the grade tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeStatus {
    Passed,
    Failed,
    Withheld,
    /// Grade token not present in the status table.
    #[default]
    Unknown,
}

impl fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GradeStatus::Passed => "PASSED",
            GradeStatus::Failed => "FAILED",
            GradeStatus::Withheld => "WITHHELD",
            GradeStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Result of one subject for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectResult {
    pub grade: String,
    pub grade_point: f64,
    pub status: GradeStatus,
}

/// A student with their subject results.
///
/// `subjects` may be empty: the student's block held no parsable grade
/// tokens, but the student is still reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub reg_no: String,
    pub subjects: BTreeMap<String, SubjectResult>,
}

/// Record-builder output for one department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Sorted union of subject codes seen across all students.
    pub subjects: Vec<String>,
    /// Students in section order.
    pub students: Vec<StudentRecord>,
}

// ── Per-department and per-document results ──────────────────────────────

/// Everything extracted for one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentResult {
    pub department: DepartmentName,
    /// Whether the department's header was seen at all.
    pub found: bool,
    pub subjects: Vec<String>,
    pub students: Vec<StudentRecord>,
}

impl DepartmentResult {
    /// Lay the records out as a student × subject grade matrix whose columns
    /// are the subject catalog.
    pub fn matrix(&self) -> GradeMatrix {
        let rows = self
            .students
            .iter()
            .map(|student| MatrixRow {
                reg_no: student.reg_no.clone(),
                cells: self
                    .subjects
                    .iter()
                    .map(|code| student.subjects.get(code).map(|r| r.grade.clone()))
                    .collect(),
            })
            .collect();

        GradeMatrix {
            columns: self.subjects.clone(),
            rows,
        }
    }
}

/// Student × subject grade table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub reg_no: String,
    /// One cell per column; `None` when the student has no grade for it.
    pub cells: Vec<Option<String>>,
}

impl GradeMatrix {
    /// Tab-separated rendering with a header row. Empty cells stay empty.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("REG_NO");
        for col in &self.columns {
            out.push('\t');
            out.push_str(col);
        }
        out.push('\n');

        for row in &self.rows {
            out.push_str(&row.reg_no);
            for cell in &row.cells {
                out.push('\t');
                out.push_str(cell.as_deref().unwrap_or(""));
            }
            out.push('\n');
        }
        out
    }
}

/// Statistics for a whole-document analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total_pages: usize,
    pub missing_pages: usize,
    pub departments: usize,
    pub students: usize,
    pub subjects: usize,
    pub duration_ms: u64,
}

/// Result of analysing one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Departments in scan order, or in selection order when specific
    /// departments were requested.
    pub departments: Vec<DepartmentResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: AnalysisStats,
}

impl AnalysisReport {
    pub fn department(&self, name: &str) -> Option<&DepartmentResult> {
        self.departments.iter().find(|d| d.department == name)
    }
}

/// Document overview without extraction, see [`crate::analyze::inspect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectReport {
    pub total_pages: usize,
    /// 1-indexed numbers of pages without text.
    pub missing_pages: Vec<usize>,
    pub departments: Vec<DepartmentName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(grade: &str, point: f64, status: GradeStatus) -> SubjectResult {
        SubjectResult {
            grade: grade.into(),
            grade_point: point,
            status,
        }
    }

    #[test]
    fn storage_key_is_snake_case() {
        let d = DepartmentName::new("ELECTRONICS & COMMUNICATION ENGINEERING");
        assert_eq!(d.storage_key(), "electronics__communication_engineering");
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&GradeStatus::Withheld).unwrap();
        assert_eq!(json, "\"WITHHELD\"");
    }

    #[test]
    fn matrix_fills_missing_cells_with_none() {
        let mut a = BTreeMap::new();
        a.insert("MAT101".to_string(), result("A", 8.0, GradeStatus::Passed));
        a.insert("PHY102".to_string(), result("F", 0.0, GradeStatus::Failed));
        let mut b = BTreeMap::new();
        b.insert("PHY102".to_string(), result("S", 10.0, GradeStatus::Passed));

        let dept = DepartmentResult {
            department: DepartmentName::new("CIVIL ENGINEERING"),
            found: true,
            subjects: vec!["MAT101".into(), "PHY102".into()],
            students: vec![
                StudentRecord {
                    reg_no: "TKM22CE001".into(),
                    subjects: a,
                },
                StudentRecord {
                    reg_no: "TKM22CE002".into(),
                    subjects: b,
                },
            ],
        };

        let m = dept.matrix();
        assert_eq!(m.columns, vec!["MAT101", "PHY102"]);
        assert_eq!(m.rows[0].cells, vec![Some("A".into()), Some("F".into())]);
        assert_eq!(m.rows[1].cells, vec![None, Some("S".into())]);
        assert_eq!(
            m.to_tsv(),
            "REG_NO\tMAT101\tPHY102\nTKM22CE001\tA\tF\nTKM22CE002\t\tS\n"
        );
    }

    #[test]
    fn student_without_subjects_still_gets_a_row() {
        let dept = DepartmentResult {
            department: DepartmentName::new("CIVIL ENGINEERING"),
            found: true,
            subjects: vec![],
            students: vec![StudentRecord {
                reg_no: "TKM22CE003".into(),
                subjects: BTreeMap::new(),
            }],
        };
        assert_eq!(dept.matrix().to_tsv(), "REG_NO\nTKM22CE003\n");
    }
}
