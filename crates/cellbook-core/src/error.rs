//! Error types for Cellbook core.

use thiserror::Error;

use cellbook_engine::engine::CellId;

/// Errors that can occur while editing, ordering or storing a notebook.
#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unknown cell {0}")]
    UnknownCell(CellId),

    #[error("Circular dependency detected: {}", format_path(.0))]
    CircularDependency(Vec<CellId>),

    #[error("No file path set")]
    NoFilePath,
}

fn format_path(path: &[CellId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, NotebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            NotebookError::CircularDependency(vec![1, 2, 1]).to_string(),
            "Circular dependency detected: 1 -> 2 -> 1"
        );
        assert_eq!(
            NotebookError::Parse {
                line: 3,
                message: "Duplicate cell id 1".to_string()
            }
            .to_string(),
            "Parse error at line 3: Duplicate cell id 1"
        );
    }
}
