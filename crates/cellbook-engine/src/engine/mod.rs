//! Notebook cell engine API.
//!
//! - [`parse`] - Classify a cell's source and extract its dependencies
//! - [`ParseResult`] and its statements - The outcome of [`parse`]
//! - [`Cell`], [`CellKind`], [`CellMap`] - Data structures for cell storage
//! - [`CellError`] - Structured, serializable cell errors
//! - [`detect_cycle`], [`cyclic_components`] - Circular dependency detection

mod cell;
mod cycle;
mod error;
mod parse;

pub use cell::{Cell, CellId, CellKind, CellMap};
pub use cycle::{cyclic_components, detect_cycle};
pub use error::CellError;
pub use parse::{
    AssignmentStatement, ExceptionStatement, ImportName, ImportStatement, ParseResult, parse,
};

pub use cellbook_syntax::Position;
