//! cellbook_syntax - Cell grammar for reactive notebooks.
//!
//! Reads the source of a single notebook cell (an ECMAScript expression or
//! block, a `viewof` definition, or an `import` declaration) into a small
//! description with byte spans, together with the free references of the
//! cell body. ECMAScript itself is parsed and scoped by `oxc`; this crate
//! owns the notebook-specific forms around it.

pub mod ast;
pub mod error;
mod nesting;
mod parser;
mod references;
mod scan;
pub mod span;

pub use ast::{CellBody, CellNode, Definition, Ident, ImportDecl, ImportSpecifier};
pub use error::{SyntaxError, SyntaxResult};
pub use parser::parse_cell;
pub use span::{Position, Span};
