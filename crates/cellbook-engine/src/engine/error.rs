//! Structured cell errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cellbook_syntax::{Position, SyntaxError};

/// An error attached to a cell, independent of the grammar engine's own
/// error type so it can be logged, rendered or sent over the wire as is.
#[derive(Error, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[error("{message}{}", position_suffix(.position))]
pub struct CellError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl CellError {
    pub fn new(message: impl Into<String>) -> CellError {
        CellError {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(message: impl Into<String>, position: Position) -> CellError {
        CellError {
            message: message.into(),
            position: Some(position),
        }
    }

    /// Convert a syntax error, resolving its offset against `source`.
    pub fn from_syntax(source: &str, err: &SyntaxError) -> CellError {
        CellError::at(err.message.clone(), err.position(source))
    }
}

fn position_suffix(position: &Option<Position>) -> String {
    match position {
        Some(position) => format!(" ({})", position),
        None => String::new(),
    }
}
