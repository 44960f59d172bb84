//! Record building: turn student blocks into subject → grade results and
//! collect the department's subject catalog.

use crate::config::ExtractionConfig;
use crate::output::{RecordSet, StudentBlock, StudentRecord, SubjectResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Parse every `SUBJECT (GRADE)` token in `text`, left to right.
///
/// A subject code that appears twice keeps its last grade. Unknown grades
/// score 0 with status `Unknown`.
pub fn parse_subjects(text: &str, config: &ExtractionConfig) -> BTreeMap<String, SubjectResult> {
    let mut subjects = BTreeMap::new();

    for caps in config.grade_pattern.captures_iter(text) {
        let (Some(subject), Some(grade)) = (caps.name("subject"), caps.name("grade")) else {
            continue;
        };
        let grade = grade.as_str().trim();
        subjects.insert(
            subject.as_str().to_string(),
            SubjectResult {
                grade: grade.to_string(),
                grade_point: config.grades.point(grade),
                status: config.grades.status(grade),
            },
        );
    }

    subjects
}

/// Build one record per block, in block order, plus the sorted catalog of
/// every subject code seen.
///
/// A block without grade tokens still yields a record, with no subjects.
pub fn build_records(blocks: &[StudentBlock], config: &ExtractionConfig) -> RecordSet {
    let mut catalog: BTreeSet<String> = BTreeSet::new();

    let students: Vec<StudentRecord> = blocks
        .iter()
        .map(|block| {
            let subjects = parse_subjects(&block.text, config);
            catalog.extend(subjects.keys().cloned());
            StudentRecord {
                reg_no: block.reg_no.clone(),
                subjects,
            }
        })
        .collect();

    info!(
        "Structured data created for {} students with {} subjects",
        students.len(),
        catalog.len()
    );

    RecordSet {
        subjects: catalog.into_iter().collect(),
        students,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::GradeStatus;

    fn config() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn parses_grades_with_points_and_status() {
        let subjects = parse_subjects("ENGG101 (A) ENGG102 (F)", &config());
        assert_eq!(subjects.len(), 2);

        let a = &subjects["ENGG101"];
        assert_eq!(a.grade, "A");
        assert_eq!(a.grade_point, 8.0);
        assert_eq!(a.status, GradeStatus::Passed);

        let f = &subjects["ENGG102"];
        assert_eq!(f.grade, "F");
        assert_eq!(f.grade_point, 0.0);
        assert_eq!(f.status, GradeStatus::Failed);
    }

    #[test]
    fn grade_token_is_trimmed() {
        let subjects = parse_subjects("MAT101( B+ ) PHY102 (WH)", &config());
        assert_eq!(subjects["MAT101"].grade, "B+");
        assert_eq!(subjects["MAT101"].grade_point, 7.0);
        assert_eq!(subjects["PHY102"].status, GradeStatus::Withheld);
    }

    #[test]
    fn unknown_grade_defaults() {
        let subjects = parse_subjects("CST201 (Absent)", &config());
        let r = &subjects["CST201"];
        assert_eq!(r.grade, "Absent");
        assert_eq!(r.grade_point, 0.0);
        assert_eq!(r.status, GradeStatus::Unknown);
    }

    #[test]
    fn last_duplicate_subject_wins() {
        let subjects = parse_subjects("CST201 (F) CST203 (B) CST201 (C)", &config());
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects["CST201"].grade, "C");
        assert_eq!(subjects["CST201"].grade_point, 4.0);
    }

    #[test]
    fn code_must_start_at_word_boundary() {
        assert!(parse_subjects("XENGG101 (A)", &config()).is_empty());
    }

    #[test]
    fn empty_blob_keeps_student() {
        let blocks = vec![
            StudentBlock::new("TKM22CS001", ""),
            StudentBlock::new("TKM22CS002", "withheld for malpractice"),
        ];
        let set = build_records(&blocks, &config());
        assert!(set.subjects.is_empty());
        assert_eq!(set.students.len(), 2);
        assert!(set.students.iter().all(|s| s.subjects.is_empty()));
    }

    #[test]
    fn catalog_is_sorted_union() {
        let blocks = vec![
            StudentBlock::new("TKM22CS001", "PHY102 (A) MAT101 (B)"),
            StudentBlock::new("TKM22CS002", "CST201 (S) MAT101 (C)"),
        ];
        let set = build_records(&blocks, &config());
        assert_eq!(set.subjects, vec!["CST201", "MAT101", "PHY102"]);
        let regs: Vec<&str> = set.students.iter().map(|s| s.reg_no.as_str()).collect();
        assert_eq!(regs, vec!["TKM22CS001", "TKM22CS002"]);
    }

    #[test]
    fn duplicate_register_numbers_stay_separate() {
        let blocks = vec![
            StudentBlock::new("TKM22CS001", "MAT101 (A)"),
            StudentBlock::new("TKM22CS001", "MAT101 (F)"),
        ];
        let set = build_records(&blocks, &config());
        assert_eq!(set.students.len(), 2);
        assert_eq!(set.students[0].subjects["MAT101"].grade, "A");
        assert_eq!(set.students[1].subjects["MAT101"].grade, "F");
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let blocks = vec![
            StudentBlock::new("TKM22CS001", "MAT101 (A) PHY102 (X)"),
            StudentBlock::new("TKM22CS002", "CST201 (B+)"),
        ];
        let c = config();
        assert_eq!(build_records(&blocks, &c), build_records(&blocks, &c));
    }

    #[test]
    fn custom_grade_table() {
        let c = ExtractionConfig::builder()
            .grade("O", 10.0, GradeStatus::Passed)
            .grade("AB", 0.0, GradeStatus::Withheld)
            .build()
            .unwrap();
        let subjects = parse_subjects("MAT101 (O) PHY102 (AB)", &c);
        assert_eq!(subjects["MAT101"].grade_point, 10.0);
        assert_eq!(subjects["PHY102"].status, GradeStatus::Withheld);
    }
}
