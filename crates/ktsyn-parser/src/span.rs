//! Line/column positions for diagnostics
//!
//! Parse errors carry byte ranges; these helpers turn them into the
//! `file:line:col` form shown to users.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;

/// A byte range resolved to 1-indexed line and column numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourceSpan {
    pub fn from_range(range: Range<usize>, line_index: &LineIndex) -> Self {
        let (line, column) = line_index.line_col(range.start);
        let (end_line, end_column) = line_index.line_col(range.end);
        Self {
            file: None,
            start: range.start,
            end: range.end,
            line,
            column,
            end_line,
            end_column,
        }
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// Byte offset to line/column lookup
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: source.len(),
        }
    }

    /// Convert a byte offset to (line, column), both 1-indexed. Columns count
    /// bytes; offsets past the end clamp to the end of input.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        };
        let line_start = self
            .line_starts
            .get(line.saturating_sub(1))
            .copied()
            .unwrap_or(0);
        (line, offset - line_start + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_multiple_lines() {
        let index = LineIndex::new("class A\n\nfun f()");

        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(7), (1, 8)); // '\n'
        assert_eq!(index.line_col(8), (2, 1)); // empty line
        assert_eq!(index.line_col(9), (3, 1));
        assert_eq!(index.line_col(13), (3, 5));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn test_offsets_past_end_clamp() {
        let index = LineIndex::new("ab");
        assert_eq!(index.line_col(100), (1, 3));
    }

    #[test]
    fn test_source_span_display() {
        let index = LineIndex::new("package a\nimport b.*\n");
        let span = SourceSpan::from_range(17..18, &index);
        assert_eq!(span.to_string(), "2:8");
        assert_eq!(span.with_file("Main.kt").to_string(), "Main.kt:2:8");
    }
}
