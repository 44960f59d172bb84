//! Department scan: the ordered, de-duplicated list of department sections
//! present in a document.

use crate::config::ExtractionConfig;
use crate::output::DepartmentName;
use crate::pipeline::input::PageSource;
use tracing::{debug, info};

/// Canonical department name if `line` is a department header.
///
/// The captured name is trimmed, upper-cased and suffixed with the
/// configured qualifier. A header whose name phrase is blank is not a header.
pub fn header_department(line: &str, config: &ExtractionConfig) -> Option<DepartmentName> {
    let caps = config.header_pattern.captures(line)?;
    let name = caps.name("name")?.as_str().trim();
    if name.is_empty() {
        return None;
    }

    let name = name.to_uppercase();
    let qualifier = config.department_qualifier.trim().to_uppercase();
    if qualifier.is_empty() {
        Some(DepartmentName::new(name))
    } else {
        Some(DepartmentName::new(format!("{name} {qualifier}")))
    }
}

/// Find every department header in the document, in first-seen order.
///
/// Returns an empty list when no header exists; that is not an error.
pub fn scan_departments(pages: &PageSource, config: &ExtractionConfig) -> Vec<DepartmentName> {
    let mut departments: Vec<DepartmentName> = Vec::new();

    for line in pages.lines() {
        if let Some(dept) = header_department(line, config) {
            if !departments.contains(&dept) {
                debug!("Department detected: {}", dept);
                departments.push(dept);
            }
        }
    }

    info!("Total departments found: {}", departments.len());
    departments
}
