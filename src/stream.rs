//! Streaming analysis API: emit departments as they complete.
//!
//! Unlike [`crate::analyze::analyze`], which returns only after every
//! department is done, [`analyze_stream`] yields each [`DepartmentResult`]
//! as soon as its worker finishes, so a caller can persist one department's
//! records while the next is still being extracted. Departments arrive in
//! completion order; use the `department` field to tell them apart.

use crate::analyze::{plan, run_department};
use crate::config::ExtractionConfig;
use crate::error::GradesheetError;
use crate::output::DepartmentResult;
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of department results.
pub type DepartmentStream =
    Pin<Box<dyn Stream<Item = Result<DepartmentResult, GradesheetError>> + Send>>;

/// Analyse a page file, streaming departments as they are ready.
///
/// The department scan runs before this function returns, so an empty stream
/// means the selection resolved to no departments.
///
/// # Returns
/// - `Ok(DepartmentStream)`: one item per selected department; an item is
///   `Err` only if its worker panicked
/// - `Err(GradesheetError)`: fatal input error (file not found etc.)
///
/// # Example
/// ```rust,no_run
/// use gradesheet::{analyze_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let mut departments = analyze_stream("results.txt", &config).await?;
/// while let Some(dept) = departments.next().await {
///     let dept = dept?;
///     println!("{}: {} students", dept.department, dept.students.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn analyze_stream(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<DepartmentStream, GradesheetError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming analysis: {}", input_str);

    let pages = input::resolve_input(input_str).await?;
    let (_, targets) = plan(&pages, config);

    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(targets.len());
    }

    let pages = Arc::new(pages);
    let shared = Arc::new(config.clone());
    let total = targets.len();
    let students = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&students);
    let callback = config.progress_callback.clone();

    let s = stream::iter(targets.into_iter().map(move |dept| {
        let pages = Arc::clone(&pages);
        let config = Arc::clone(&shared);
        async move {
            tokio::task::spawn_blocking(move || run_department(&pages, dept, &config, total))
                .await
                .map_err(|e| GradesheetError::Internal(format!("Department task panicked: {e}")))
        }
    }))
    .buffer_unordered(config.concurrency.max(1))
    .inspect(move |item| {
        if let Ok(dept) = item {
            counted.fetch_add(dept.students.len(), Ordering::Relaxed);
        }
    })
    // Runs once every department is out; yields nothing.
    .chain(
        stream::once(async move {
            let students = students.load(Ordering::Relaxed);
            info!("Streaming analysis complete: {} departments, {} students", total, students);
            if let Some(cb) = callback {
                cb.on_analysis_complete(total, students);
            }
        })
        .filter_map(|()| async { None::<Result<DepartmentResult, GradesheetError>> }),
    );

    Ok(Box::pin(s))
}
