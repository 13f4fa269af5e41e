//! Notebook state and logic (UI-agnostic).

mod graph;
mod io;
mod ops;
mod state;

pub use graph::{Diagnostic, DiagnosticKind};
pub use state::{Notebook, STANDARD_BUILTINS};
