//! Writer for the .cellbook file format

use std::fs;
use std::path::Path;

use super::{ESCAPE, HEADER_PREFIX};
use crate::error::Result;
use cellbook_engine::engine::{CellId, CellMap};

/// Write the cells in `order` to a .cellbook file
pub fn write_notebook(path: &Path, order: &[CellId], cells: &CellMap) -> Result<()> {
    let content = write_notebook_content(order, cells);
    fs::write(path, content)?;
    Ok(())
}

/// Write the cells in `order` to a .cellbook format string
pub fn write_notebook_content(order: &[CellId], cells: &CellMap) -> String {
    let mut lines = vec!["# Cellbook Notebook".to_string()];

    for &id in order {
        let Some(cell) = cells.get(&id) else {
            continue;
        };
        let pinned = if cell.pinned { " pinned" } else { "" };
        lines.push(format!("--- cell {} {}{} ---", id, cell.kind, pinned));
        lines.extend(cell.source.split('\n').map(escape_line));
    }

    lines.join("\n") + "\n"
}

fn escape_line(line: &str) -> String {
    if line.starts_with(HEADER_PREFIX) || line.starts_with(ESCAPE) {
        format!("{}{}", ESCAPE, line)
    } else {
        line.to_string()
    }
}
