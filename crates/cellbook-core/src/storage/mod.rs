//! Text notebook format (`.cellbook`).
//!
//! ```text
//! # Cellbook Notebook
//! --- cell 1 code ---
//! x = y + 2
//! --- cell 2 md pinned ---
//! # Title ${x}
//! ```
//!
//! Content lines that start with `---` or `\` are written with a leading
//! `\`, which the reader strips.

mod parser;
mod writer;

pub use parser::{parse_notebook, parse_notebook_content};
pub use writer::{write_notebook, write_notebook_content};

pub(crate) const HEADER_PREFIX: &str = "---";
pub(crate) const ESCAPE: char = '\\';
