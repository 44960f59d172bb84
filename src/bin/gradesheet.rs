//! CLI binary for gradesheet.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use gradesheet::{
    analyze, analyze_to_file, inspect, AnalysisProgressCallback, AnalysisReport, ConfigProfile,
    DepartmentSelection, ExtractionConfig, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Diagnostics printed before the rest are summarised as a count.
const MAX_DIAGNOSTICS_SHOWN: usize = 20;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar advancing per department, with a log
/// line per finished department. Departments may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Reading pages…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, total_departments: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} departments  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total_departments as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Extracting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{total_departments} departments found"))
        ));
    }

    fn on_department_start(&self, department: &str, _total: usize) {
        self.bar.set_message(department.to_string());
    }

    fn on_department_complete(&self, department: &str, _total: usize, students: usize) {
        let mark = if students == 0 { yellow("∅") } else { green("✓") };
        self.bar.println(format!(
            "  {mark} {department:<45} {}",
            dim(&format!("{students:>4} students"))
        ));
        self.bar.inc(1);
    }

    fn on_analysis_complete(&self, total_departments: usize, total_students: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} students across {} departments",
            green("✔"),
            bold(&total_students.to_string()),
            total_departments
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summary of every department (stdout)
  gradesheet results.txt

  # Pages as a JSON array of strings (null = page without text)
  gradesheet pages.json --format json -o report.json

  # One department as a student × subject grade matrix
  gradesheet results.txt -d "computer science engineering" --format matrix

  # Only list the departments present
  gradesheet --list-departments results.txt

  # Another institution's conventions
  gradesheet --profile ktu-2019.json results.txt

INPUT:
  *.json     JSON array of page strings; null marks a page without text
  otherwise  UTF-8 text, pages separated by form feeds (pdftotext output)

ENVIRONMENT VARIABLES:
  RUST_LOG              Log filter, overrides --verbose / --quiet
  GRADESHEET_PROFILE    Default for --profile
"#;

/// Extract department, student and grade records from result-sheet text.
#[derive(Parser, Debug)]
#[command(
    name = "gradesheet",
    version,
    about = "Extract department, student and grade records from result-sheet text",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Page file: JSON array of page strings, or form-feed separated text.
    input: String,

    /// Write output to this file instead of stdout.
    #[arg(short, long, env = "GRADESHEET_OUTPUT")]
    output: Option<PathBuf>,

    /// Department to extract (repeatable). Default: every department found.
    #[arg(short = 'd', long = "department")]
    departments: Vec<String>,

    /// List departments and missing pages only, no extraction.
    #[arg(long)]
    list_departments: bool,

    /// Output format.
    #[arg(long, env = "GRADESHEET_FORMAT", value_enum, default_value = "summary")]
    format: OutputFormat,

    /// JSON profile overriding patterns, grade tables and noise phrases.
    #[arg(long, env = "GRADESHEET_PROFILE")]
    profile: Option<PathBuf>,

    /// Departments extracted concurrently. Default: 4, or the profile's value.
    #[arg(short, long, env = "GRADESHEET_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Disable progress bar.
    #[arg(long, env = "GRADESHEET_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GRADESHEET_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GRADESHEET_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One line per department.
    Summary,
    /// Tab-separated student × subject grade matrix per department.
    Matrix,
    /// Full report (departments, diagnostics, stats).
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.list_departments;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── List-only mode ───────────────────────────────────────────────────
    if cli.list_departments {
        let overview = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect page file")?;

        let rendered = if cli.format == OutputFormat::Json {
            serde_json::to_string_pretty(&overview).context("Failed to serialise overview")?
        } else {
            let mut out = format!("Pages:         {}\n", overview.total_pages);
            if !overview.missing_pages.is_empty() {
                let missing: Vec<String> =
                    overview.missing_pages.iter().map(|p| p.to_string()).collect();
                out.push_str(&format!("Missing pages: {}\n", missing.join(", ")));
            }
            out.push_str(&format!("Departments:   {}\n", overview.departments.len()));
            for dept in &overview.departments {
                out.push_str(&format!("  {dept}  {}\n", dim(&dept.storage_key())));
            }
            out
        };
        return emit(&cli, &rendered).await;
    }

    // ── Full report straight to a file ───────────────────────────────────
    if let (OutputFormat::Json, Some(output_path)) = (cli.format, &cli.output) {
        let stats = analyze_to_file(&cli.input, output_path, &config)
            .await
            .context("Analysis failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} students  {} departments  {}ms  →  {}",
                green("✔"),
                stats.students,
                stats.departments,
                stats.duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
        return Ok(());
    }

    // ── Run analysis ─────────────────────────────────────────────────────
    let report = analyze(&cli.input, &config)
        .await
        .context("Analysis failed")?;

    let rendered = match cli.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        }
        OutputFormat::Matrix => render_matrices(&report),
        OutputFormat::Summary => render_summary(&report),
    };
    emit(&cli, &rendered).await?;

    if !cli.quiet {
        print_diagnostics(&report);
        if !show_progress {
            eprintln!(
                "Extracted {} students from {} departments in {}ms",
                report.stats.students, report.stats.departments, report.stats.duration_ms
            );
        }
    }

    Ok(())
}

/// Map CLI args (and an optional profile) to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder();

    if let Some(ref path) = cli.profile {
        let profile = ConfigProfile::from_path(path)
            .with_context(|| format!("Failed to load profile from {:?}", path))?;
        builder = profile.apply(builder);
    }

    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }

    if !cli.departments.is_empty() {
        builder = builder.departments(DepartmentSelection::Only(cli.departments.clone()));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Write to `--output` or stdout, always ending with a newline.
async fn emit(cli: &Cli, rendered: &str) -> Result<()> {
    let mut text = rendered.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    if let Some(ref path) = cli.output {
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        io::stdout()
            .lock()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}

fn render_summary(report: &AnalysisReport) -> String {
    let mut out = format!(
        "{:<45} {:>8} {:>8}\n",
        "DEPARTMENT", "STUDENTS", "SUBJECTS"
    );
    for dept in &report.departments {
        let name = if dept.found {
            dept.department.to_string()
        } else {
            format!("{} (not found)", dept.department)
        };
        out.push_str(&format!(
            "{:<45} {:>8} {:>8}\n",
            name,
            dept.students.len(),
            dept.subjects.len()
        ));
    }
    out
}

fn render_matrices(report: &AnalysisReport) -> String {
    report
        .departments
        .iter()
        .map(|dept| format!("# {}\n{}", dept.department, dept.matrix().to_tsv()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn print_diagnostics(report: &AnalysisReport) {
    for d in report.diagnostics.iter().take(MAX_DIAGNOSTICS_SHOWN) {
        eprintln!("  {} {}", yellow("⚠"), d);
    }
    let hidden = report.diagnostics.len().saturating_sub(MAX_DIAGNOSTICS_SHOWN);
    if hidden > 0 {
        eprintln!("  {}", dim(&format!("… and {hidden} more (see --format json)")));
    }
}
