//! cellbook_engine - Cell parsing and dependency extraction for reactive notebooks.

pub mod engine;

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use dashmap::DashMap;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Resolve each cell's dependencies to the cells defining them.
    fn edges(cells: &CellMap) -> HashMap<CellId, Vec<CellId>> {
        let mut definitions = HashMap::new();
        for entry in cells.iter() {
            for name in entry.defined_names() {
                definitions.insert(name.to_string(), *entry.key());
            }
        }
        cells
            .iter()
            .map(|entry| {
                let targets = entry
                    .dependencies()
                    .filter_map(|name| definitions.get(name).copied())
                    .collect();
                (*entry.key(), targets)
            })
            .collect()
    }

    #[test]
    fn test_cycle_between_cells() {
        let cells: CellMap = Arc::new(DashMap::new());
        cells.insert(1, Cell::new_code("a = b + 1"));
        cells.insert(2, Cell::new_code("b = c * 2"));
        cells.insert(3, Cell::new_code("c = a"));
        cells.insert(4, Cell::new_code("d = a"));

        let graph = edges(&cells);
        let cycle = detect_cycle(4, |id| graph.get(&id).cloned().unwrap_or_default());
        assert_eq!(cycle, Some(vec![1, 2, 3, 1]));
    }

    #[test]
    fn test_breaking_a_cycle() {
        let cells: CellMap = Arc::new(DashMap::new());
        cells.insert(1, Cell::new_code("a = b + 1"));
        cells.insert(2, Cell::new_code("b = a"));

        if let Some(mut cell) = cells.get_mut(&2) {
            cell.set_source("b = 41");
        }
        let graph = edges(&cells);
        assert_eq!(detect_cycle(1, |id| graph.get(&id).cloned().unwrap_or_default()), None);
    }

    #[test]
    fn test_import_cell_defines_aliases() {
        let cells: CellMap = Arc::new(DashMap::new());
        cells.insert(1, Cell::new_code("import {chart as c} from '@d3/bar-chart'"));
        cells.insert(2, Cell::new_code("viewof v = c(data)"));

        let graph = edges(&cells);
        assert_eq!(graph[&2], vec![1]);
        assert!(graph[&1].is_empty());
    }

    #[test]
    fn test_exception_cell_has_no_edges() {
        let cell = Cell::new_code("a = (b");
        assert!(cell.parsed.is_exception());
        assert_eq!(cell.dependencies().count(), 0);
        assert!(cell.defined_names().is_empty());
    }
}
