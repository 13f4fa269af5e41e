//! Syntax errors reported while reading a cell.

use thiserror::Error;

use crate::span::Position;

/// A grammatical error in cell source.
///
/// Only the byte offset is recorded; [`SyntaxError::position`] derives the
/// line and column from the source the error came from.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            offset,
        }
    }

    pub fn position(&self, source: &str) -> Position {
        Position::from_offset(source, self.offset)
    }
}

pub type SyntaxResult<T> = std::result::Result<T, SyntaxError>;
