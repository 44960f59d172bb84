//! Input resolution: load a page file into a [`PageSource`].
//!
//! Decoding the original document is somebody else's job; this crate starts
//! from the per-page text an extraction tool produced. Two on-disk shapes are
//! accepted:
//!
//! * `*.json`: an array of strings, `null` marking a page without text
//! * anything else: UTF-8 text with pages separated by form feeds (`\x0C`),
//!   the convention of most PDF-to-text tools
//!
//! A [`PageSource`] is re-iterable: each extraction pass walks it again from
//! the first page.

use crate::error::GradesheetError;
use crate::pipeline::normalize::clean_page_text;
use std::path::{Path, PathBuf};
use tracing::debug;

const PAGE_BREAK: char = '\u{000C}';

/// Ordered page texts of one document. `None` marks a page without text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSource {
    pages: Vec<Option<String>>,
}

impl PageSource {
    /// Build from raw page texts. Each page is cleaned; a page that is empty
    /// or whitespace-only after cleaning counts as absent.
    pub fn new<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let pages = pages
            .into_iter()
            .map(|page| {
                page.map(|text| clean_page_text(text.as_ref()))
                    .filter(|text| !text.trim().is_empty())
            })
            .collect();
        Self { pages }
    }

    /// Split form-feed separated text into pages. A single empty segment
    /// after a trailing form feed is not a page.
    pub fn from_text(text: &str) -> Self {
        let mut segments: Vec<&str> = text.split(PAGE_BREAK).collect();
        if segments.len() > 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
            segments.pop();
        }
        Self::new(segments.into_iter().map(Some))
    }

    /// Parse a JSON array of `string | null`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let pages: Vec<Option<String>> = serde_json::from_str(json)?;
        Ok(Self::new(pages))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages with their 1-indexed page number.
    pub fn pages(&self) -> impl Iterator<Item = (usize, Option<&str>)> + '_ {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, page)| (idx + 1, page.as_deref()))
    }

    /// 1-indexed numbers of pages without text.
    pub fn missing_pages(&self) -> Vec<usize> {
        self.pages()
            .filter(|(_, text)| text.is_none())
            .map(|(page_num, _)| page_num)
            .collect()
    }

    /// Every line of every page, in document order. Pages without text are
    /// skipped silently; they surface once as `MissingPageText` diagnostics.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.pages().filter_map(|(_, text)| text).flat_map(str::lines)
    }
}

impl<S: AsRef<str>> FromIterator<Option<S>> for PageSource {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Check if the path names a JSON page file.
pub fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Load the page file at `input`.
pub async fn resolve_input(input: &str) -> Result<PageSource, GradesheetError> {
    let path = PathBuf::from(input);

    if !path.exists() {
        return Err(GradesheetError::FileNotFound { path });
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(GradesheetError::PermissionDenied { path });
        }
        Err(e) => {
            return Err(GradesheetError::InvalidInput {
                path,
                reason: e.to_string(),
            });
        }
    };

    let text = String::from_utf8(bytes).map_err(|e| GradesheetError::InvalidInput {
        path: path.clone(),
        reason: format!("not UTF-8 text: {e}"),
    })?;

    let source = if is_json(&path) {
        PageSource::from_json(&text).map_err(|e| GradesheetError::InvalidInput {
            path: path.clone(),
            reason: format!("expected a JSON array of page strings: {e}"),
        })?
    } else {
        PageSource::from_text(&text)
    };

    debug!("Loaded {} pages from {}", source.len(), path.display());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("results.json")));
        assert!(is_json(Path::new("RESULTS.JSON")));
        assert!(!is_json(Path::new("results.txt")));
        assert!(!is_json(Path::new("results")));
    }

    #[test]
    fn form_feed_splits_pages() {
        let src = PageSource::from_text("page one\x0cpage two\x0c");
        assert_eq!(src.len(), 2);
        assert_eq!(
            src.pages().collect::<Vec<_>>(),
            vec![(1, Some("page one")), (2, Some("page two"))]
        );
    }

    #[test]
    fn blank_page_is_absent() {
        let src = PageSource::from_text("first\x0c  \n \x0cthird");
        assert_eq!(src.len(), 3);
        assert_eq!(src.missing_pages(), vec![2]);
    }

    #[test]
    fn json_nulls_are_absent_pages() {
        let src = PageSource::from_json(r#"["a\nb", null, ""]"#).unwrap();
        assert_eq!(src.len(), 3);
        assert_eq!(src.missing_pages(), vec![2, 3]);
        assert_eq!(src.lines().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn json_must_be_an_array() {
        assert!(PageSource::from_json(r#"{"pages": []}"#).is_err());
    }

    #[test]
    fn lines_span_pages_in_order() {
        let src: PageSource = vec![Some("a\r\nb"), None, Some("c")].into_iter().collect();
        assert_eq!(src.lines().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }
}
