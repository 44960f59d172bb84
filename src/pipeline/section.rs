//! Section extraction: isolate one department's section and cut it into
//! per-student blocks.
//!
//! The extractor is a three-phase state machine driven line by line:
//!
//! ```text
//!            header == target           any header
//! Searching ─────────────────▶ Extracting ──────────▶ Done
//!                                 │  ▲
//!                                 └──┘ register no. / text / noise
//! ```
//!
//! Each input line is first classified into a [`Line`], then folded into a
//! [`SectionState`] with [`SectionState::step`]. The state value carries the
//! phase, the currently open block and the blocks flushed so far; nothing else
//! is mutable. The phase persists across page boundaries.

use crate::config::ExtractionConfig;
use crate::output::{DepartmentName, StudentBlock};
use crate::pipeline::input::PageSource;
use crate::pipeline::normalize::collapse_whitespace;
use crate::pipeline::scan::header_department;
use std::ops::ControlFlow;
use tracing::{debug, info};

/// Where the extractor is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Looking for the target department's header.
    #[default]
    Searching,
    /// Inside the target section.
    Extracting,
    /// Past the target section; nothing more is read.
    Done,
}

/// One input line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    /// A department header, with its canonical name.
    Header(DepartmentName),
    /// A line starting with a register number. `rest` is what follows it,
    /// with leading commas and quotes stripped.
    Student { reg_no: &'a str, rest: &'a str },
    /// A line containing a noise phrase.
    Noise,
    Text(&'a str),
}

/// Classify one line. Headers win over register numbers, and register-number
/// lines are never treated as noise.
pub fn classify<'a>(line: &'a str, config: &ExtractionConfig) -> Line<'a> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Blank;
    }

    if let Some(dept) = header_department(line, config) {
        return Line::Header(dept);
    }

    if let Some(m) = config.register_pattern.find(line) {
        if m.start() == 0 && !m.is_empty() {
            let rest = line[m.end()..]
                .trim()
                .trim_start_matches(',')
                .trim_start_matches('"')
                .trim();
            return Line::Student {
                reg_no: m.as_str(),
                rest,
            };
        }
    }

    if config.is_noise(line) {
        Line::Noise
    } else {
        Line::Text(line)
    }
}

/// A student block still collecting fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenBlock {
    reg_no: String,
    fragments: Vec<String>,
}

impl OpenBlock {
    fn close(self) -> StudentBlock {
        let text = collapse_whitespace(&self.fragments.join(" "));
        StudentBlock::new(self.reg_no, text)
    }
}

/// Extractor state threaded through the line fold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionState {
    phase: Phase,
    open: Option<OpenBlock>,
    blocks: Vec<StudentBlock>,
}

impl SectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Blocks flushed so far, in encounter order.
    pub fn blocks(&self) -> &[StudentBlock] {
        &self.blocks
    }

    /// Register number of the block currently collecting fragments.
    pub fn open_reg_no(&self) -> Option<&str> {
        self.open.as_ref().map(|b| b.reg_no.as_str())
    }

    /// Apply one classified line.
    pub fn step(mut self, line: Line<'_>, target: &str) -> Self {
        match (self.phase, line) {
            (Phase::Done, _) | (_, Line::Blank) => {}

            (Phase::Searching, Line::Header(dept)) => {
                if dept.as_str() == target {
                    info!("Entered department section: {}", dept);
                    self.phase = Phase::Extracting;
                }
            }
            (Phase::Searching, _) => {}

            (Phase::Extracting, Line::Header(dept)) => {
                self.flush();
                info!("Next department reached ({}). Stopping extraction.", dept);
                self.phase = Phase::Done;
            }
            (Phase::Extracting, Line::Student { reg_no, rest }) => {
                self.flush();
                let mut fragments = Vec::new();
                if !rest.is_empty() {
                    fragments.push(rest.to_string());
                }
                self.open = Some(OpenBlock {
                    reg_no: reg_no.to_string(),
                    fragments,
                });
            }
            (Phase::Extracting, Line::Text(text)) => {
                // Text before the first student is section boilerplate.
                if let Some(open) = self.open.as_mut() {
                    open.fragments.push(text.to_string());
                }
            }
            (Phase::Extracting, Line::Noise) => {}
        }
        self
    }

    /// End of input: flush the open block and hand over the result.
    pub fn finish(mut self) -> Section {
        self.flush();
        Section {
            found: self.phase != Phase::Searching,
            blocks: self.blocks,
        }
    }

    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            let block = open.close();
            debug!("Student parsed: {}", block.reg_no);
            self.blocks.push(block);
        }
    }
}

/// Result of extracting one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    /// Whether the target's header appeared. `false` with empty `blocks`
    /// means the target was not found; `true` with empty `blocks` is a
    /// section without students.
    pub found: bool,
    pub blocks: Vec<StudentBlock>,
}

/// Run the state machine for `target` over the whole document.
pub fn scan_section(pages: &PageSource, target: &str, config: &ExtractionConfig) -> Section {
    let folded = pages.lines().try_fold(SectionState::new(), |state, line| {
        let state = state.step(classify(line, config), target);
        if state.phase() == Phase::Done {
            ControlFlow::Break(state)
        } else {
            ControlFlow::Continue(state)
        }
    });
    let state = match folded {
        ControlFlow::Break(state) | ControlFlow::Continue(state) => state,
    };

    let section = state.finish();
    if section.found {
        info!("Total students extracted for {}: {}", target, section.blocks.len());
    } else {
        info!("Department section not found: {}", target);
    }
    section
}

/// Ordered `(register number, text)` blocks of `target`'s section; empty when
/// the section is absent.
pub fn extract_section(
    pages: &PageSource,
    target: &str,
    config: &ExtractionConfig,
) -> Vec<StudentBlock> {
    scan_section(pages, target, config).blocks
}
