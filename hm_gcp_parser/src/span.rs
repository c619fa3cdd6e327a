//! Source locations for tokens, syntax nodes and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A byte range in the source with the 1-based position of its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset start (0-indexed)
    pub start: usize,
    /// Byte offset end (exclusive)
    pub end: usize,
    /// Line of `start` (1-indexed)
    pub line: usize,
    /// Column of `start` (1-indexed, in bytes)
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        if other.start < self.start {
            return other.to(self);
        }
        Span {
            start: self.start,
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line-start table used to turn byte offsets into line/column pairs.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', source.as_bytes()).map(|i| i + 1));
        Self { line_starts }
    }

    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        (line + 1, offset - line_start + 1)
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        Span::new(start, end, line, column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let map = SourceMap::new("x = 1;\n(pair x\n  x)");
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(6), (1, 7));
        assert_eq!(map.line_col(7), (2, 1));
        assert_eq!(map.line_col(17), (3, 3));
        assert_eq!(map.line_count(), 3);
    }

    #[test]
    fn test_span_to() {
        let map = SourceMap::new("(dec 3)");
        let open = map.span(0, 1);
        let close = map.span(6, 7);
        let whole = close.to(&open);
        assert_eq!(whole.start, 0);
        assert_eq!(whole.end, 7);
        assert_eq!(whole.column, 1);
        assert_eq!(whole.len(), 7);
        assert_eq!(whole.to_string(), "1:1");
    }
}
