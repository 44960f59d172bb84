//! Pipeline stages for result-sheet extraction.
//!
//! Each submodule implements exactly one transformation step, and each step
//! fully produces its output before the next one starts.
//!
//! ## Data Flow
//!
//! ```text
//!                  ┌──▶ scan ───────────▶ [department names]
//! input ──▶ pages ─┤                            │ (one target)
//! (file)           └──▶ section ◀───────────────┘
//!                         │ [student blocks]
//!                         ▼
//!                       records ──▶ (subject catalog, student records)
//! ```
//!
//! 1. [`input`]    : load per-page text, cleaned by [`normalize`]
//! 2. [`scan`]     : one forward pass collecting department headers
//! 3. [`section`]  : state machine isolating one department's section and
//!    cutting it into per-student blocks
//! 4. [`records`]  : grade-token parsing and the subject catalog
//!
//! `scan` and `section` both re-read the pages from the start. `section`
//! must see the lines of one document in order and on one thread; running
//! different departments on different threads is fine.

pub mod input;
pub mod normalize;
pub mod records;
pub mod scan;
pub mod section;
