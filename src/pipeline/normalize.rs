//! Text normalisation applied to page text and student blobs.
//!
//! Text handed over by an extraction tool carries artefacts that break line
//! matching without changing meaning: Windows or old-Mac line endings,
//! zero-width characters and soft hyphens inside register numbers, trailing
//! spaces. Each rule below is a pure `&str → String` function, applied in
//! order by [`clean_page_text`].

/// Clean one page of extracted text.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, joiners)
/// 3. Trim trailing whitespace per line
pub fn clean_page_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    trim_trailing_whitespace(&s)
}

/// Collapse every run of whitespace to one space and trim both ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "TKM22\u{200B}CS001\u{FEFF} MAT\u{00AD}101";
        assert_eq!(remove_invisible_chars(input), "TKM22CS001 MAT101");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(
            trim_trailing_whitespace("  TKM22CS001   \nMAT101 (A)  "),
            "  TKM22CS001\nMAT101 (A)"
        );
    }

    #[test]
    fn test_clean_page_text() {
        let input = "CIVIL ENGINEERING [Full Time]  \r\nTKM22CE\u{200B}001 CET201 (A)\r\n";
        assert_eq!(
            clean_page_text(input),
            "CIVIL ENGINEERING [Full Time]\nTKM22CE001 CET201 (A)"
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  MAT101 (A)\t PHY102\n(B+)  "),
            "MAT101 (A) PHY102 (B+)"
        );
        assert_eq!(collapse_whitespace("   "), "");
    }
}
