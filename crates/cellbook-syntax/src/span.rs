//! Byte spans into cell source and human-readable positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open byte range `start..end` into the cell source.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Slice the source text covered by this span.
    ///
    /// Returns `None` when the span does not fall on character boundaries
    /// of `source`.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

/// A location in cell source: 1-based line, 0-based column (in characters)
/// and the byte offset it was derived from.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// Compute the line/column of a byte offset in `source`.
    ///
    /// Offsets past the end are clamped to the end of the source, and offsets
    /// inside a multi-byte character resolve to the start of that character.
    pub fn from_offset(source: &str, offset: usize) -> Position {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count();

        Position {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_first_line() {
        let pos = Position::from_offset("x = y + 2", 4);
        assert_eq!((pos.line, pos.column, pos.offset), (1, 4, 4));
    }

    #[test]
    fn test_position_after_newline() {
        let pos = Position::from_offset("a\nbc\nd", 4);
        assert_eq!((pos.line, pos.column), (2, 2));
    }

    #[test]
    fn test_position_counts_characters_not_bytes() {
        let src = "é = 1";
        let pos = Position::from_offset(src, src.len());
        assert_eq!(pos.column, 5);
    }

    #[test]
    fn test_position_clamps_offset() {
        let pos = Position::from_offset("ab", 99);
        assert_eq!(pos.offset, 2);
        assert_eq!(pos.column, 2);
    }

    #[test]
    fn test_position_inside_multibyte_char() {
        let pos = Position::from_offset("é", 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_span_slice() {
        let span = Span::new(4, 9);
        assert_eq!(span.slice("x = y + 2"), Some("y + 2"));
        assert_eq!(Span::new(0, 1).slice("é"), None);
    }
}
