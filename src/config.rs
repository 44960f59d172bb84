//! Configuration types for result-sheet extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The patterns and tables that encode an
//! institution's document conventions (department header shape, register
//! number shape, grade tokens, grade tables, noise phrases) live here rather
//! than in the passes, so a different institution is a different config, not
//! a different parser.
//!
//! A [`ConfigProfile`] is the serialisable, all-optional form of the same
//! knobs. Load one from JSON and [`ConfigProfile::apply`] it to a builder.

use crate::error::GradesheetError;
use crate::output::{DepartmentName, GradeStatus};
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// ── Stock patterns ───────────────────────────────────────────────────────

/// Department header: name phrase followed by the qualifier and the
/// programme marker. Case-insensitive.
pub const DEFAULT_HEADER_PATTERN: &str = r"(?i)(?P<name>.+?)\s*ENGINEERING\s*\[Full Time\]";

/// Appended to the captured name to form the canonical department name.
pub const DEFAULT_DEPARTMENT_QUALIFIER: &str = "ENGINEERING";

/// Register number: optional college prefix, year, branch, serial.
pub const DEFAULT_REGISTER_PATTERN: &str = r"^[A-Z]*\d{2}[A-Z]{2}\d{3}";

/// Subject code immediately followed by a parenthesised grade.
pub const DEFAULT_GRADE_PATTERN: &str =
    r"\b(?P<subject>[A-Z]{3,4}\d{3})\s*\((?P<grade>[^)]+)\)";

/// Running headers, legends and page furniture that interleave student rows.
pub const DEFAULT_NOISE_PHRASES: &[&str] = &[
    "APJ ABDUL KALAM",
    "Thiruvananthapuram",
    "Exam Centre",
    "Course Code",
    "To Be Published",
    "Register No",
    "The following table",
    "Page",
];

const DEFAULT_GRADES: &[(&str, f64, GradeStatus)] = &[
    ("S", 10.0, GradeStatus::Passed),
    ("A+", 9.0, GradeStatus::Passed),
    ("A", 8.0, GradeStatus::Passed),
    ("B+", 7.0, GradeStatus::Passed),
    ("B", 6.0, GradeStatus::Passed),
    ("C+", 5.0, GradeStatus::Passed),
    ("C", 4.0, GradeStatus::Passed),
    ("D", 3.0, GradeStatus::Passed),
    ("P", 2.0, GradeStatus::Passed),
    ("F", 0.0, GradeStatus::Failed),
    ("FE", 0.0, GradeStatus::Failed),
    ("I", 0.0, GradeStatus::Failed),
    ("WH", 0.0, GradeStatus::Withheld),
];

static DEFAULT_HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_HEADER_PATTERN).unwrap());
static DEFAULT_REGISTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_REGISTER_PATTERN).unwrap());
static DEFAULT_GRADE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(DEFAULT_GRADE_PATTERN).unwrap());

// ── Grade tables ─────────────────────────────────────────────────────────

/// The two grade lookup tables: grade → point and grade → status.
///
/// Kept as separate maps so an institution can, for example, award points
/// for a grade without classifying it, or the reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeTable {
    pub points: BTreeMap<String, f64>,
    pub statuses: BTreeMap<String, GradeStatus>,
}

impl Default for GradeTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (grade, point, status) in DEFAULT_GRADES {
            table = table.with_grade(*grade, *point, *status);
        }
        table
    }
}

impl GradeTable {
    /// A table that knows no grades at all.
    pub fn empty() -> Self {
        Self {
            points: BTreeMap::new(),
            statuses: BTreeMap::new(),
        }
    }

    /// Add or replace a grade in both tables.
    pub fn with_grade(mut self, grade: impl Into<String>, point: f64, status: GradeStatus) -> Self {
        let grade = grade.into();
        self.points.insert(grade.clone(), point);
        self.statuses.insert(grade, status);
        self
    }

    /// Grade point for `grade`; unknown grades score 0.
    pub fn point(&self, grade: &str) -> f64 {
        self.points.get(grade).copied().unwrap_or(0.0)
    }

    /// Status for `grade`; unknown grades are [`GradeStatus::Unknown`].
    pub fn status(&self, grade: &str) -> GradeStatus {
        self.statuses.get(grade).copied().unwrap_or(GradeStatus::Unknown)
    }
}

// ── Department selection ─────────────────────────────────────────────────

/// Which departments a whole-document analysis extracts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepartmentSelection {
    /// Every department the scanner finds (default).
    #[default]
    All,
    /// Only the named departments, in the given order.
    ///
    /// Names are trimmed and upper-cased before matching; a name the scanner
    /// did not find still runs and reports `TargetNotFound`.
    Only(Vec<String>),
}

impl DepartmentSelection {
    /// Resolve the selection against the scanner's output.
    pub fn targets(&self, scanned: &[DepartmentName]) -> Vec<DepartmentName> {
        match self {
            DepartmentSelection::All => scanned.to_vec(),
            DepartmentSelection::Only(names) => {
                let mut targets: Vec<DepartmentName> = Vec::with_capacity(names.len());
                for name in names {
                    let canonical = DepartmentName::new(name.trim().to_uppercase());
                    if !targets.contains(&canonical) {
                        targets.push(canonical);
                    }
                }
                targets
            }
        }
    }
}

// ── ExtractionConfig ─────────────────────────────────────────────────────

/// Configuration for extracting records from a result document.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`], which carries the stock institution
/// profile.
///
/// # Example
/// ```rust
/// use gradesheet::{ExtractionConfig, GradeStatus};
///
/// let config = ExtractionConfig::builder()
///     .register_pattern(r"^[A-Z]{3}\d{2}[A-Z]{2}\d{3}")
///     .add_noise_phrase("Controller of Examinations")
///     .grade("AB", 0.0, GradeStatus::Withheld)
///     .build()
///     .unwrap();
/// assert_eq!(config.grades.status("AB"), GradeStatus::Withheld);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Department header pattern. Must have a `name` capture group holding
    /// the department phrase that precedes the qualifier.
    pub header_pattern: Regex,

    /// Appended (after a space) to the captured name to form the canonical
    /// department name. Default: `ENGINEERING`.
    pub department_qualifier: String,

    /// Register-number pattern. Only a match starting at the first
    /// character of a line counts.
    pub register_pattern: Regex,

    /// Grade-token pattern with `subject` and `grade` capture groups.
    pub grade_pattern: Regex,

    /// Grade → point and grade → status tables.
    pub grades: GradeTable,

    /// Lines containing any of these (case-insensitive substring) are
    /// dropped from student blocks.
    pub noise_phrases: Vec<String>,

    /// Departments processed concurrently by [`crate::analyze::analyze`].
    /// Default: 4. A single department is always processed by one worker.
    pub concurrency: usize,

    /// Departments to extract. Default: all.
    pub departments: DepartmentSelection,

    /// Optional per-department progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            header_pattern: DEFAULT_HEADER_RE.clone(),
            department_qualifier: DEFAULT_DEPARTMENT_QUALIFIER.to_string(),
            register_pattern: DEFAULT_REGISTER_RE.clone(),
            grade_pattern: DEFAULT_GRADE_RE.clone(),
            grades: GradeTable::default(),
            noise_phrases: DEFAULT_NOISE_PHRASES.iter().map(|s| s.to_string()).collect(),
            concurrency: 4,
            departments: DepartmentSelection::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("header_pattern", &self.header_pattern.as_str())
            .field("department_qualifier", &self.department_qualifier)
            .field("register_pattern", &self.register_pattern.as_str())
            .field("grade_pattern", &self.grade_pattern.as_str())
            .field("grades", &self.grades)
            .field("noise_phrases", &self.noise_phrases)
            .field("concurrency", &self.concurrency)
            .field("departments", &self.departments)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
            header_pattern: None,
            register_pattern: None,
            grade_pattern: None,
        }
    }

    /// Whether `line` contains one of the noise phrases, ignoring case.
    pub fn is_noise(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.noise_phrases
            .iter()
            .any(|phrase| line.contains(&phrase.to_lowercase()))
    }
}

/// Builder for [`ExtractionConfig`].
///
/// Pattern strings are compiled in [`build`](Self::build), which reports the
/// first invalid one.
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
    header_pattern: Option<String>,
    register_pattern: Option<String>,
    grade_pattern: Option<String>,
}

impl ExtractionConfigBuilder {
    pub fn header_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.header_pattern = Some(pattern.into());
        self
    }

    pub fn department_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.config.department_qualifier = qualifier.into().trim().to_uppercase();
        self
    }

    pub fn register_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.register_pattern = Some(pattern.into());
        self
    }

    pub fn grade_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.grade_pattern = Some(pattern.into());
        self
    }

    pub fn grades(mut self, table: GradeTable) -> Self {
        self.config.grades = table;
        self
    }

    /// Add or replace one grade in both tables.
    pub fn grade(mut self, grade: impl Into<String>, point: f64, status: GradeStatus) -> Self {
        self.config.grades = self.config.grades.with_grade(grade, point, status);
        self
    }

    pub fn noise_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.noise_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn add_noise_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.config.noise_phrases.push(phrase.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn departments(mut self, selection: DepartmentSelection) -> Self {
        self.config.departments = selection;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, compiling and validating patterns.
    pub fn build(mut self) -> Result<ExtractionConfig, GradesheetError> {
        if let Some(p) = self.header_pattern.take() {
            self.config.header_pattern = compile("header", &p, &["name"])?;
        }
        if let Some(p) = self.register_pattern.take() {
            self.config.register_pattern = compile("register", &p, &[])?;
        }
        if let Some(p) = self.grade_pattern.take() {
            self.config.grade_pattern = compile("grade", &p, &["subject", "grade"])?;
        }
        if self.config.noise_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(GradesheetError::InvalidConfig(
                "Noise phrases must not be blank (a blank phrase matches every line)".into(),
            ));
        }
        Ok(self.config)
    }
}

fn compile(label: &str, pattern: &str, groups: &[&str]) -> Result<Regex, GradesheetError> {
    let re = Regex::new(pattern).map_err(|e| {
        GradesheetError::InvalidConfig(format!("{label} pattern does not compile: {e}"))
    })?;
    for group in groups {
        if !re.capture_names().flatten().any(|n| n == *group) {
            return Err(GradesheetError::InvalidConfig(format!(
                "{label} pattern must have a named group `(?P<{group}>…)`"
            )));
        }
    }
    Ok(re)
}

// ── Profiles ─────────────────────────────────────────────────────────────

/// Serialisable per-institution overrides. Every field is optional; unset
/// fields keep the builder's current value.
///
/// ```json
/// {
///   "register_pattern": "^[A-Z]{3}\\d{2}[A-Z]{2}\\d{3}",
///   "grade_points": { "O": 10, "A+": 9 },
///   "grade_statuses": { "O": "PASSED", "A+": "PASSED" },
///   "noise_phrases": ["Controller of Examinations", "Page"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigProfile {
    pub header_pattern: Option<String>,
    pub department_qualifier: Option<String>,
    pub register_pattern: Option<String>,
    pub grade_pattern: Option<String>,
    /// Replaces the grade → point table when set.
    pub grade_points: Option<BTreeMap<String, f64>>,
    /// Replaces the grade → status table when set.
    pub grade_statuses: Option<BTreeMap<String, GradeStatus>>,
    pub noise_phrases: Option<Vec<String>>,
    pub concurrency: Option<usize>,
}

impl ConfigProfile {
    pub fn from_json_str(json: &str) -> Result<Self, GradesheetError> {
        serde_json::from_str(json)
            .map_err(|e| GradesheetError::InvalidConfig(format!("profile: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GradesheetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GradesheetError::InvalidConfig(format!(
                "cannot read profile '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Overlay the set fields onto `builder`.
    pub fn apply(self, mut builder: ExtractionConfigBuilder) -> ExtractionConfigBuilder {
        if let Some(p) = self.header_pattern {
            builder = builder.header_pattern(p);
        }
        if let Some(q) = self.department_qualifier {
            builder = builder.department_qualifier(q);
        }
        if let Some(p) = self.register_pattern {
            builder = builder.register_pattern(p);
        }
        if let Some(p) = self.grade_pattern {
            builder = builder.grade_pattern(p);
        }
        if let Some(points) = self.grade_points {
            builder.config.grades.points = points;
        }
        if let Some(statuses) = self.grade_statuses {
            builder.config.grades.statuses = statuses;
        }
        if let Some(phrases) = self.noise_phrases {
            builder = builder.noise_phrases(phrases);
        }
        if let Some(n) = self.concurrency {
            builder = builder.concurrency(n);
        }
        builder
    }
}
