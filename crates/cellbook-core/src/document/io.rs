use std::path::{Path, PathBuf};

use log::debug;

use super::Notebook;
use crate::error::{NotebookError, Result};
use crate::storage::{parse_notebook, write_notebook};

impl Notebook {
    /// Save to the current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(NotebookError::NoFilePath);
        };
        write_notebook(&path, &self.order, &self.cells)?;
        self.modified = false;
        debug!("saved {} cells to {}", self.order.len(), path.display());
        Ok(path)
    }

    /// Save to `path` and make it the current file path.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        self.file_path = Some(path.to_path_buf());
        self.save_file()
    }

    /// Replace the notebook contents with a file. Nothing changes if the
    /// file cannot be read or parsed.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let cells = parse_notebook(path)?;

        self.cells.clear();
        self.order.clear();
        self.next_id = 1;
        for (id, cell) in cells {
            self.cells.insert(id, cell);
            self.order.push(id);
            self.next_id = self.next_id.max(id.saturating_add(1));
        }
        self.rebuild_dependents();

        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        debug!("loaded {} cells from {}", self.order.len(), path.display());
        Ok(())
    }
}
