//! Evaluation order and notebook-level diagnostics.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use log::debug;
use serde::{Deserialize, Serialize};

use super::Notebook;
use crate::error::{NotebookError, Result};
use cellbook_engine::engine::{CellId, Position, cyclic_components, detect_cycle};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    DuplicateDefinition,
    UnresolvedReference,
    CircularDependency,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::ParseError => "parse_error",
            DiagnosticKind::DuplicateDefinition => "duplicate_definition",
            DiagnosticKind::UnresolvedReference => "unresolved_reference",
            DiagnosticKind::CircularDependency => "circular_dependency",
        }
    }
}

/// A problem attached to one cell.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub cell: CellId,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Source position, for parse errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Diagnostic {
    fn new(cell: CellId, kind: DiagnosticKind, message: String) -> Diagnostic {
        Diagnostic {
            cell,
            kind,
            message,
            position: None,
        }
    }
}

impl Notebook {
    /// Detect a cycle reachable from `id` through cell inputs.
    pub fn detect_cycle(&self, id: CellId) -> Option<Vec<CellId>> {
        detect_cycle(id, |cell| self.inputs(cell))
    }

    /// Every cell in an order where inputs come before their readers. Among
    /// cells whose inputs are ready, notebook position decides.
    pub fn evaluation_order(&self) -> Result<Vec<CellId>> {
        let inputs: HashMap<CellId, Vec<CellId>> =
            self.order.iter().map(|&id| (id, self.inputs(id))).collect();
        let mut pending: HashMap<CellId, usize> =
            inputs.iter().map(|(&id, deps)| (id, deps.len())).collect();

        let mut ready: BTreeSet<usize> = self
            .order
            .iter()
            .enumerate()
            .filter(|&(_, id)| pending.get(id) == Some(&0))
            .map(|(position, _)| position)
            .collect();

        let mut sorted = Vec::with_capacity(self.order.len());
        while let Some(position) = ready.pop_first() {
            let id = self.order[position];
            sorted.push(id);
            let Some(readers) = self.dependents.get(&id) else {
                continue;
            };
            for reader in readers {
                let Some(count) = pending.get_mut(reader) else {
                    continue;
                };
                *count = count.saturating_sub(1);
                if *count == 0 {
                    ready.extend(self.position(*reader));
                }
            }
        }

        if sorted.len() < self.order.len() {
            let blocked = self
                .order
                .iter()
                .copied()
                .find(|id| !sorted.contains(id))
                .unwrap_or_default();
            let cycle = self.detect_cycle(blocked).unwrap_or_else(|| vec![blocked]);
            return Err(NotebookError::CircularDependency(cycle));
        }

        debug!("evaluation order: {:?}", sorted);
        Ok(sorted)
    }

    /// Parse errors, duplicate definitions, unresolved references and
    /// cycles, in notebook order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let components = cyclic_components(&self.order, |cell| self.inputs(cell));

        for &id in &self.order {
            let Some(cell) = self.cells.get(&id) else {
                continue;
            };

            if let Some(error) = cell.error() {
                diagnostics.push(Diagnostic {
                    position: error.position,
                    ..Diagnostic::new(id, DiagnosticKind::ParseError, error.message.clone())
                });
                continue;
            }

            for name in cell.defined_names() {
                let definers = self.definitions.get(name).map(Vec::as_slice).unwrap_or_default();
                if definers.len() > 1 {
                    let others: Vec<String> = definers
                        .iter()
                        .filter(|&&other| other != id)
                        .map(|other| other.to_string())
                        .collect();
                    diagnostics.push(Diagnostic::new(
                        id,
                        DiagnosticKind::DuplicateDefinition,
                        format!("'{}' is also defined by cell {}", name, others.join(", ")),
                    ));
                }
            }

            for name in cell.dependencies() {
                if !self.definitions.contains_key(name) && !self.builtins.contains(name) {
                    diagnostics.push(Diagnostic::new(
                        id,
                        DiagnosticKind::UnresolvedReference,
                        format!("'{}' is not defined", name),
                    ));
                }
            }
            drop(cell);

            let component = components.iter().find(|component| component.contains(&id));
            if let Some(cycle) = component.and_then(|members| self.cycle_through(id, members)) {
                diagnostics.push(Diagnostic::new(
                    id,
                    DiagnosticKind::CircularDependency,
                    format!("Circular definition: {}", self.describe_path(&cycle)),
                ));
            }
        }

        diagnostics
    }

    /// Shortest cycle from `id` back to itself, staying inside `members`.
    fn cycle_through(&self, id: CellId, members: &[CellId]) -> Option<Vec<CellId>> {
        let members: HashSet<CellId> = members.iter().copied().collect();
        let mut parent: HashMap<CellId, CellId> = HashMap::new();
        let mut queue = VecDeque::from([id]);

        while let Some(cell) = queue.pop_front() {
            for next in self.inputs(cell) {
                if !members.contains(&next) {
                    continue;
                }
                if next == id {
                    let mut path = vec![cell];
                    while let Some(&previous) = path.last().and_then(|last| parent.get(last)) {
                        path.push(previous);
                    }
                    path.reverse();
                    path.push(id);
                    return Some(path);
                }
                if next != cell && !parent.contains_key(&next) {
                    parent.insert(next, cell);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// `a -> b -> a`, using cell names where cells have one.
    fn describe_path(&self, path: &[CellId]) -> String {
        path.iter()
            .map(|&id| {
                self.cells
                    .get(&id)
                    .and_then(|cell| cell.name().map(str::to_string))
                    .unwrap_or_else(|| format!("#{}", id))
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellbook_engine::engine::CellKind;
    use pretty_assertions::assert_eq;

    fn notebook(sources: &[&str]) -> Notebook {
        let mut nb = Notebook::new();
        for source in sources {
            nb.insert_cell(CellKind::Code, source, None);
        }
        nb
    }

    #[test]
    fn test_definitions_before_uses() {
        let nb = notebook(&["c = a + b", "b = a * 2", "a = 1", "viewof x = Inputs.range()"]);
        assert_eq!(nb.evaluation_order().unwrap(), vec![3, 2, 1, 4]);
    }

    #[test]
    fn test_ties_follow_notebook_position() {
        let nb = notebook(&["3", "x = 1", "2"]);
        assert_eq!(nb.evaluation_order().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_import_aliases_resolve() {
        let nb = notebook(&["chart(data)", "data = [1, 2]", "import {barChart as chart} from '@d3/bar-chart'"]);
        assert_eq!(nb.evaluation_order().unwrap(), vec![2, 3, 1]);
        assert!(nb.diagnostics().is_empty());
    }

    #[test]
    fn test_cycle_is_an_error() {
        let nb = notebook(&["a = b", "b = c", "c = a", "d = 1"]);
        match nb.evaluation_order() {
            Err(NotebookError::CircularDependency(cycle)) => assert_eq!(cycle, vec![1, 2, 3, 1]),
            other => panic!("expected cycle, got {:?}", other),
        }
        assert_eq!(nb.detect_cycle(4), None);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let nb = notebook(&["x = x + 1"]);
        assert!(matches!(
            nb.evaluation_order(),
            Err(NotebookError::CircularDependency(_))
        ));
        let diagnostics = nb.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::CircularDependency);
        assert_eq!(diagnostics[0].message, "Circular definition: x -> x");
    }

    #[test]
    fn test_every_cell_on_a_cycle_is_reported() {
        // z sits on the z <-> c cycle even though a DFS from z first walks
        // into the a <-> b cycle.
        let nb = notebook(&["z = a + c", "a = b", "b = a", "c = z"]);
        let cycles: Vec<_> = nb
            .diagnostics()
            .into_iter()
            .filter(|d| d.kind == DiagnosticKind::CircularDependency)
            .map(|d| (d.cell, d.message))
            .collect();
        assert_eq!(
            cycles,
            vec![
                (1, "Circular definition: z -> c -> z".to_string()),
                (2, "Circular definition: a -> b -> a".to_string()),
                (3, "Circular definition: b -> a -> b".to_string()),
                (4, "Circular definition: c -> z -> c".to_string()),
            ]
        );
    }

    #[test]
    fn test_cells_downstream_of_a_cycle_are_not_on_it() {
        let nb = notebook(&["a = b", "b = a", "c = a"]);
        let flagged: Vec<_> = nb
            .diagnostics()
            .into_iter()
            .filter(|d| d.kind == DiagnosticKind::CircularDependency)
            .map(|d| d.cell)
            .collect();
        assert_eq!(flagged, vec![1, 2]);
    }

    #[test]
    fn test_diagnostics() {
        let nb = notebook(&["a = 1", "a = 2", "b = missing + width", "c = (", "md`${a}`"]);
        let diagnostics = nb.diagnostics();
        let kinds: Vec<_> = diagnostics.iter().map(|d| (d.cell, d.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, DiagnosticKind::DuplicateDefinition),
                (2, DiagnosticKind::DuplicateDefinition),
                (3, DiagnosticKind::UnresolvedReference),
                (4, DiagnosticKind::ParseError),
            ]
        );
        assert_eq!(diagnostics[0].message, "'a' is also defined by cell 2");
        assert_eq!(diagnostics[2].message, "'missing' is not defined");
        assert!(diagnostics[3].position.is_some());
    }

    #[test]
    fn test_builtins_are_configurable() {
        let mut nb = Notebook::with_builtins(["custom"]);
        nb.insert_cell(CellKind::Code, "custom + width", None);
        let diagnostics = nb.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "'width' is not defined");
    }

    #[test]
    fn test_failed_cells_still_ordered() {
        let nb = notebook(&["a = (", "b = a"]);
        assert_eq!(nb.evaluation_order().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_diagnostic_serialization() {
        let nb = notebook(&["x = y"]);
        let json = serde_json::to_value(nb.diagnostics()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"cell": 1, "kind": "unresolved_reference", "message": "'y' is not defined"}
            ])
        );
    }
}
