use std::collections::HashSet;

use log::debug;

use super::Notebook;
use crate::error::{NotebookError, Result};
use cellbook_engine::engine::{Cell, CellId, CellKind};

impl Notebook {
    /// Mark all cells that depend (transitively) on the changed cell as
    /// stale. Returns them in notebook order.
    pub fn mark_dependents_stale(&mut self, changed: CellId) -> Vec<CellId> {
        let mut to_process = vec![changed];
        let mut visited = HashSet::new();
        let mut marked = Vec::new();
        while let Some(id) = to_process.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(deps) = self.dependents.get(&id) else {
                continue;
            };
            for &dep in deps {
                if let Some(mut cell) = self.cells.get_mut(&dep) {
                    cell.stale = true;
                }
                if dep != changed && !marked.contains(&dep) {
                    marked.push(dep);
                }
                to_process.push(dep);
            }
        }
        marked.sort_by_key(|&id| self.position(id));
        marked
    }

    /// Add a cell at `position` (appended when `None` or past the end).
    pub fn insert_cell(&mut self, kind: CellKind, source: &str, position: Option<usize>) -> CellId {
        let id = self.next_id;
        self.next_id += 1;
        self.insert_parsed(id, Cell::new(kind, source), position);
        id
    }

    pub(crate) fn insert_parsed(&mut self, id: CellId, cell: Cell, position: Option<usize>) {
        self.cells.insert(id, cell);
        let position = position.unwrap_or(self.order.len()).min(self.order.len());
        self.order.insert(position, id);
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.rebuild_dependents();
        self.mark_dependents_stale(id);
        self.modified = true;
    }

    /// Replace a cell's source. Cells that read the old or the new
    /// definitions become stale.
    pub fn set_cell_source(&mut self, id: CellId, source: &str) -> Result<Vec<CellId>> {
        let mut stale = self.mark_dependents_stale(id);
        {
            let mut cell = self.cells.get_mut(&id).ok_or(NotebookError::UnknownCell(id))?;
            cell.set_source(source);
        }
        self.rebuild_dependents();
        for dep in self.mark_dependents_stale(id) {
            if !stale.contains(&dep) {
                stale.push(dep);
            }
        }
        stale.sort_by_key(|&c| self.position(c));
        self.modified = true;
        debug!("cell {} edited, {} dependents stale", id, stale.len());
        Ok(stale)
    }

    /// Remove a cell. Its former dependents become stale.
    pub fn remove_cell(&mut self, id: CellId) -> Result<Cell> {
        let Some(position) = self.position(id) else {
            return Err(NotebookError::UnknownCell(id));
        };
        self.mark_dependents_stale(id);
        self.order.remove(position);
        let (_, cell) = self.cells.remove(&id).ok_or(NotebookError::UnknownCell(id))?;
        self.rebuild_dependents();
        self.modified = true;
        Ok(cell)
    }

    /// Move a cell to a new notebook position (clamped to the end).
    pub fn move_cell(&mut self, id: CellId, position: usize) -> Result<()> {
        let Some(current) = self.position(id) else {
            return Err(NotebookError::UnknownCell(id));
        };
        self.order.remove(current);
        let position = position.min(self.order.len());
        self.order.insert(position, id);
        self.rebuild_dependents();
        self.modified = true;
        Ok(())
    }

    pub fn set_pinned(&mut self, id: CellId, pinned: bool) -> Result<()> {
        let mut cell = self.cells.get_mut(&id).ok_or(NotebookError::UnknownCell(id))?;
        if cell.pinned != pinned {
            cell.pinned = pinned;
            self.modified = true;
        }
        Ok(())
    }

    /// Snapshot of a cell.
    pub fn cell(&self, id: CellId) -> Option<Cell> {
        self.cells.get(&id).map(|r| r.clone())
    }

    /// Snapshots of all cells in notebook order.
    pub fn cells_in_order(&self) -> Vec<(CellId, Cell)> {
        self.order
            .iter()
            .filter_map(|&id| self.cell(id).map(|cell| (id, cell)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fresh(notebook: &Notebook) {
        for mut entry in notebook.cells.iter_mut() {
            entry.stale = false;
        }
    }

    fn stale_cells(notebook: &Notebook) -> Vec<CellId> {
        notebook
            .order
            .iter()
            .copied()
            .filter(|id| notebook.cells.get(id).is_some_and(|c| c.stale))
            .collect()
    }

    #[test]
    fn test_insert_assigns_ids_and_positions() {
        let mut nb = Notebook::new();
        let a = nb.insert_cell(CellKind::Code, "a = 1", None);
        let b = nb.insert_cell(CellKind::Code, "b = 2", Some(0));
        let c = nb.insert_cell(CellKind::Code, "c = 3", Some(99));
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(nb.order, vec![b, a, c]);
        assert!(nb.modified);
    }

    #[test]
    fn test_edit_marks_transitive_dependents_stale() {
        let mut nb = Notebook::new();
        let a = nb.insert_cell(CellKind::Code, "a = 1", None);
        let b = nb.insert_cell(CellKind::Code, "b = a + 1", None);
        let c = nb.insert_cell(CellKind::Code, "c = b * 2", None);
        let d = nb.insert_cell(CellKind::Code, "d = 4", None);
        fresh(&nb);

        let stale = nb.set_cell_source(a, "a = 2").unwrap();
        assert_eq!(stale, vec![b, c]);
        assert_eq!(stale_cells(&nb), vec![a, b, c]);
        assert!(!nb.cell(d).unwrap().stale);
    }

    #[test]
    fn test_rename_marks_old_and_new_readers_stale() {
        let mut nb = Notebook::new();
        let a = nb.insert_cell(CellKind::Code, "a = 1", None);
        let reads_a = nb.insert_cell(CellKind::Code, "a + 1", None);
        let reads_z = nb.insert_cell(CellKind::Code, "z * 2", None);
        fresh(&nb);

        let stale = nb.set_cell_source(a, "z = 1").unwrap();
        assert_eq!(stale, vec![reads_a, reads_z]);
    }

    #[test]
    fn test_insert_marks_readers_stale() {
        let mut nb = Notebook::new();
        let reader = nb.insert_cell(CellKind::Code, "later * 2", None);
        fresh(&nb);
        nb.insert_cell(CellKind::Code, "later = 21", None);
        assert!(nb.cell(reader).unwrap().stale);
    }

    #[test]
    fn test_remove_cell() {
        let mut nb = Notebook::new();
        let a = nb.insert_cell(CellKind::Code, "a = 1", None);
        let b = nb.insert_cell(CellKind::Code, "b = a", None);
        fresh(&nb);

        let removed = nb.remove_cell(a).unwrap();
        assert_eq!(removed.source, "a = 1");
        assert_eq!(nb.order, vec![b]);
        assert!(nb.cell(b).unwrap().stale);
        assert!(nb.definitions.get("a").is_none());
        assert!(matches!(nb.remove_cell(a), Err(NotebookError::UnknownCell(1))));
    }

    #[test]
    fn test_move_cell() {
        let mut nb = Notebook::new();
        let a = nb.insert_cell(CellKind::Code, "1", None);
        let b = nb.insert_cell(CellKind::Code, "2", None);
        let c = nb.insert_cell(CellKind::Code, "3", None);
        nb.move_cell(c, 0).unwrap();
        assert_eq!(nb.order, vec![c, a, b]);
        nb.move_cell(c, 10).unwrap();
        assert_eq!(nb.order, vec![a, b, c]);
        assert!(nb.move_cell(42, 0).is_err());
    }

    #[test]
    fn test_unknown_cell_edit() {
        let mut nb = Notebook::new();
        assert!(matches!(
            nb.set_cell_source(7, "x = 1"),
            Err(NotebookError::UnknownCell(7))
        ));
        assert!(nb.set_pinned(7, true).is_err());
    }

    #[test]
    fn test_cells_in_order() {
        let mut nb = Notebook::new();
        nb.insert_cell(CellKind::Markdown, "# Title", None);
        nb.insert_cell(CellKind::Code, "x = 1", Some(0));
        let sources: Vec<_> = nb
            .cells_in_order()
            .into_iter()
            .map(|(_, cell)| cell.source)
            .collect();
        assert_eq!(sources, vec!["x = 1", "# Title"]);
    }
}
