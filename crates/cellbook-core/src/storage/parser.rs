//! Parser for the .cellbook file format

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use super::{ESCAPE, HEADER_PREFIX};
use crate::error::{NotebookError, Result};
use cellbook_engine::engine::{Cell, CellId, CellKind};

/// Parse a .cellbook file into its cells, in notebook order.
pub fn parse_notebook(path: &Path) -> Result<Vec<(CellId, Cell)>> {
    let content = fs::read_to_string(path)?;
    debug!("parsing notebook {}", path.display());
    parse_notebook_content(&content)
}

/// A cell whose header has been read and whose content lines are pending.
struct PendingCell<'a> {
    id: CellId,
    kind: CellKind,
    pinned: bool,
    lines: Vec<&'a str>,
}

impl PendingCell<'_> {
    fn finish(self) -> (CellId, Cell) {
        let mut cell = Cell::new(self.kind, &self.lines.join("\n"));
        cell.pinned = self.pinned;
        (self.id, cell)
    }
}

/// Parse .cellbook content from a string
pub fn parse_notebook_content(content: &str) -> Result<Vec<(CellId, Cell)>> {
    let content = content.strip_suffix('\n').unwrap_or(content);
    let mut cells = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: Option<PendingCell> = None;

    if content.is_empty() {
        return Ok(cells);
    }

    for (line_num, line) in content.split('\n').enumerate() {
        if line.starts_with(HEADER_PREFIX) {
            let (id, kind, pinned) = parse_header(line, line_num + 1)?;
            if !seen.insert(id) {
                return Err(NotebookError::Parse {
                    line: line_num + 1,
                    message: format!("Duplicate cell id {}", id),
                });
            }
            if let Some(cell) = pending.take() {
                cells.push(cell.finish());
            }
            pending = Some(PendingCell {
                id,
                kind,
                pinned,
                lines: Vec::new(),
            });
            continue;
        }

        match pending.as_mut() {
            Some(cell) => cell.lines.push(line.strip_prefix(ESCAPE).unwrap_or(line)),
            None if line.trim().is_empty() || line.starts_with('#') => {}
            None => {
                return Err(NotebookError::Parse {
                    line: line_num + 1,
                    message: "Content before the first cell header".to_string(),
                });
            }
        }
    }

    if let Some(cell) = pending {
        cells.push(cell.finish());
    }
    Ok(cells)
}

fn parse_header(line: &str, line_num: usize) -> Result<(CellId, CellKind, bool)> {
    let malformed = || NotebookError::Parse {
        line: line_num,
        message: format!("Malformed cell header: {}", line.trim_end()),
    };

    let caps = header_re().captures(line.trim_end()).ok_or_else(malformed)?;
    let id = caps[1].parse::<CellId>().map_err(|_| malformed())?;
    let kind = CellKind::from_tag(&caps[2]).ok_or_else(malformed)?;
    Ok((id, kind, caps.get(3).is_some()))
}

fn header_re() -> &'static Regex {
    static HEADER_RE: OnceLock<Regex> = OnceLock::new();
    HEADER_RE.get_or_init(|| {
        Regex::new(r"^--- cell ([0-9]+) (code|md|html)( pinned)? ---$")
            .expect("cell header regex must compile")
    })
}
