//! cellbook-core - UI-agnostic notebook model + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::{Diagnostic, DiagnosticKind, Notebook, STANDARD_BUILTINS};
pub use error::{NotebookError, Result};

pub use cellbook_engine::engine::{CellId, CellKind};
