//! Line store
//!
//! Source text split into indexed lines. Every later stage addresses text by
//! line index and character column; there is no incremental edit model, a new
//! `Document` replaces the old one on each re-analysis.

use serde::{Deserialize, Serialize};

/// A zero-based line and character column in a document.
///
/// Columns count Unicode scalar values, not bytes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A single-line span: `start..end` columns on `line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Range {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }

    /// Check if this range covers a position (end exclusive, but a zero-width
    /// range still contains its own start).
    pub fn contains(&self, position: Position) -> bool {
        position.line == self.line
            && position.column >= self.start
            && (position.column < self.end || self.start == self.end)
    }
}

/// One physical line of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    index: usize,
    text: String,
}

impl Line {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Width of the leading whitespace, tabs counted as four columns
    pub fn indent(&self) -> usize {
        self.text
            .chars()
            .take_while(|c| c.is_whitespace())
            .map(|c| if c == '\t' { 4 } else { 1 })
            .sum()
    }

    /// Column of the first non-whitespace character
    pub fn first_column(&self) -> usize {
        self.text.chars().take_while(|c| c.is_whitespace()).count()
    }

    /// Text between two character columns (clamped to the line)
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    /// Text from a character column to the end of the line
    pub fn slice_from(&self, start: usize) -> String {
        self.text.chars().skip(start).collect()
    }

    /// Range covering the trimmed content of the line
    pub fn content_range(&self) -> Range {
        let start = self.first_column();
        let end = self.text.trim_end().chars().count().max(start);
        Range::new(self.index, start, end)
    }
}

/// An ordered sequence of lines with an optional URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    uri: Option<String>,
    lines: Vec<Line>,
}

impl Document {
    /// Split text into lines. A trailing `\r` on each line is dropped.
    pub fn new(text: &str) -> Self {
        let lines = text
            .split('\n')
            .enumerate()
            .map(|(index, raw)| Line::new(index, raw.strip_suffix('\r').unwrap_or(raw)))
            .collect();
        Self { uri: None, lines }
    }

    pub fn with_uri(uri: impl Into<String>, text: &str) -> Self {
        let mut doc = Self::new(text);
        doc.uri = Some(uri.into());
        doc
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Line::is_empty)
    }

    /// Find the identifier under (or immediately before) a position.
    ///
    /// Returns the word and its range.
    pub fn word_at(&self, position: Position) -> Option<(String, Range)> {
        let line = self.line(position.line)?;
        let chars: Vec<char> = line.text().chars().collect();
        let col = position.column;
        if col > chars.len() {
            return None;
        }

        let is_word = |c: char| c.is_alphanumeric() || c == '_';

        let mut start = col;
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        let mut end = col;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }

        if start >= end {
            return None;
        }

        let word: String = chars[start..end].iter().collect();
        Some((word, Range::new(position.line, start, end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_and_crlf() {
        let doc = Document::new("var a = 1\r\nvar b = 2\n");
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.line(0).unwrap().text(), "var a = 1");
        assert_eq!(doc.line(1).unwrap().index(), 1);
        assert!(doc.line(2).unwrap().is_blank());
    }

    #[test]
    fn test_indent_counts_tabs() {
        let line = Line::new(0, "\t  end");
        assert_eq!(line.indent(), 6);
        assert_eq!(line.first_column(), 3);
    }

    #[test]
    fn test_slice_uses_characters() {
        let line = Line::new(0, "var é = \"ü\"");
        assert_eq!(line.slice(4, 5), "é");
        assert_eq!(line.slice_from(8), "\"ü\"");
    }

    #[test]
    fn test_word_at() {
        let doc = Document::new("let foo = bar.baz");
        assert_eq!(doc.word_at(Position::new(0, 5)).unwrap().0, "foo");
        assert_eq!(doc.word_at(Position::new(0, 7)).unwrap().0, "foo");
        assert_eq!(doc.word_at(Position::new(0, 15)).unwrap().0, "baz");
        assert!(doc.word_at(Position::new(0, 8)).is_none());
        assert!(doc.word_at(Position::new(4, 0)).is_none());
    }

    #[test]
    fn test_range_contains() {
        let range = Range::new(2, 4, 8);
        assert!(range.contains(Position::new(2, 4)));
        assert!(!range.contains(Position::new(2, 8)));
        assert!(!range.contains(Position::new(1, 5)));
    }
}
