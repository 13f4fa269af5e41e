//! Circular dependency detection between cells.
//!
//! A cell that (transitively) depends on its own output can never be
//! evaluated. [`detect_cycle`] walks the dependency edges depth-first from a
//! starting cell and reports the first cycle it closes;
//! [`cyclic_components`] finds every cell that sits on some cycle.
//!
//! Both walks keep their own stack, so arbitrarily long dependency chains
//! are fine.

use std::collections::{HashMap, HashSet};

use super::CellId;

/// Detect a cycle reachable from `start`. `edges` returns the cells a cell
/// reads from. Returns the cycle path with its first cell repeated at the
/// end (e.g. `[a, b, a]`), or `None`.
pub fn detect_cycle<F>(start: CellId, edges: F) -> Option<Vec<CellId>>
where
    F: Fn(CellId) -> Vec<CellId>,
{
    let mut done = HashSet::new();
    let mut on_path = HashSet::from([start]);
    let mut path = vec![start];
    // Successors of each cell on `path`, and the next one to visit.
    let mut pending = vec![(edges(start), 0usize)];

    while let Some((successors, cursor)) = pending.last_mut() {
        let next = successors.get(*cursor).copied();
        *cursor += 1;

        match next {
            Some(next) if on_path.contains(&next) => {
                // Drop the prefix leading into the cycle.
                let first = path.iter().position(|&id| id == next)?;
                let mut cycle = path.split_off(first);
                cycle.push(next);
                return Some(cycle);
            }
            Some(next) if done.contains(&next) => {}
            Some(next) => {
                on_path.insert(next);
                path.push(next);
                pending.push((edges(next), 0));
            }
            None => {
                pending.pop();
                if let Some(finished) = path.pop() {
                    on_path.remove(&finished);
                    done.insert(finished);
                }
            }
        }
    }
    None
}

/// Strongly connected components of the graph over `cells` that contain a
/// cycle: components of two or more cells, and single cells that read
/// themselves. Cells within a component, and the components themselves,
/// follow the order of `cells`.
pub fn cyclic_components<F>(cells: &[CellId], edges: F) -> Vec<Vec<CellId>>
where
    F: Fn(CellId) -> Vec<CellId>,
{
    let order: HashMap<CellId, usize> = cells.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let mut tarjan = Tarjan::default();

    for &root in cells {
        if tarjan.index.contains_key(&root) {
            continue;
        }
        tarjan.visit(root);
        let mut pending = vec![(root, edges(root), 0usize)];

        while let Some((cell, successors, cursor)) = pending.last_mut() {
            let cell = *cell;
            let next = successors.get(*cursor).copied();
            *cursor += 1;

            match next {
                Some(next) if !tarjan.index.contains_key(&next) => {
                    tarjan.visit(next);
                    pending.push((next, edges(next), 0));
                }
                Some(next) if tarjan.on_stack.contains(&next) => {
                    let reached = tarjan.index_of(next);
                    tarjan.lower(cell, reached);
                }
                Some(_) => {}
                None => {
                    pending.pop();
                    if let Some((parent, _, _)) = pending.last() {
                        let low = tarjan.lowlink_of(cell);
                        tarjan.lower(*parent, low);
                    }
                    if tarjan.lowlink_of(cell) == tarjan.index_of(cell) {
                        let component = tarjan.pop_component(cell);
                        let cyclic = component.len() > 1 || edges(cell).contains(&cell);
                        if cyclic {
                            tarjan.components.push(component);
                        }
                    }
                }
            }
        }
    }

    let position = |id: &CellId| order.get(id).copied().unwrap_or(usize::MAX);
    let mut components = tarjan.components;
    for component in &mut components {
        component.sort_by_key(position);
    }
    components.sort_by_key(|component| component.first().map_or(usize::MAX, position));
    components
}

/// Bookkeeping for Tarjan's algorithm.
#[derive(Default)]
struct Tarjan {
    index: HashMap<CellId, usize>,
    lowlink: HashMap<CellId, usize>,
    stack: Vec<CellId>,
    on_stack: HashSet<CellId>,
    components: Vec<Vec<CellId>>,
}

impl Tarjan {
    fn visit(&mut self, cell: CellId) {
        let index = self.index.len();
        self.index.insert(cell, index);
        self.lowlink.insert(cell, index);
        self.stack.push(cell);
        self.on_stack.insert(cell);
    }

    fn index_of(&self, cell: CellId) -> usize {
        self.index.get(&cell).copied().unwrap_or(usize::MAX)
    }

    fn lowlink_of(&self, cell: CellId) -> usize {
        self.lowlink.get(&cell).copied().unwrap_or(usize::MAX)
    }

    fn lower(&mut self, cell: CellId, value: usize) {
        if let Some(low) = self.lowlink.get_mut(&cell) {
            *low = (*low).min(value);
        }
    }

    fn pop_component(&mut self, root: CellId) -> Vec<CellId> {
        let mut component = Vec::new();
        while let Some(cell) = self.stack.pop() {
            self.on_stack.remove(&cell);
            component.push(cell);
            if cell == root {
                break;
            }
        }
        component
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn graph(edges: &[(CellId, CellId)]) -> impl Fn(CellId) -> Vec<CellId> {
        let mut map: HashMap<CellId, Vec<CellId>> = HashMap::new();
        for &(from, to) in edges {
            map.entry(from).or_default().push(to);
        }
        move |id| map.get(&id).cloned().unwrap_or_default()
    }

    #[test]
    fn test_no_cycle() {
        assert_eq!(detect_cycle(1, graph(&[(1, 2), (2, 3), (1, 3)])), None);
    }

    #[test]
    fn test_self_cycle() {
        assert_eq!(detect_cycle(1, graph(&[(1, 1)])), Some(vec![1, 1]));
    }

    #[test]
    fn test_cycle_path() {
        let edges = graph(&[(1, 2), (2, 3), (3, 1)]);
        assert_eq!(detect_cycle(1, edges), Some(vec![1, 2, 3, 1]));
    }

    #[test]
    fn test_cycle_downstream_of_start() {
        let edges = graph(&[(1, 2), (2, 3), (3, 2)]);
        assert_eq!(detect_cycle(1, edges), Some(vec![2, 3, 2]));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let edges = graph(&[(1, 2), (1, 3), (2, 4), (3, 4)]);
        assert_eq!(detect_cycle(1, edges), None);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n: CellId = 100_000;
        let chain = |id: CellId| if id < n { vec![id + 1] } else { vec![] };
        assert_eq!(detect_cycle(1, chain), None);

        let looped = |id: CellId| if id < n { vec![id + 1] } else { vec![1] };
        let cycle = detect_cycle(1, looped).unwrap();
        assert_eq!(cycle.len(), n as usize + 1);
        assert_eq!((cycle[0], cycle[cycle.len() - 1]), (1, 1));
    }

    #[test]
    fn test_components_cover_every_cycle() {
        // 1 reads 2 and 4; 2 and 3 read each other; 4 reads 1.
        let edges = graph(&[(1, 2), (1, 4), (2, 3), (3, 2), (4, 1)]);
        assert_eq!(cyclic_components(&[1, 2, 3, 4], edges), vec![vec![1, 4], vec![2, 3]]);
    }

    #[test]
    fn test_components_self_loop_and_acyclic() {
        let edges = graph(&[(1, 1), (2, 3), (3, 4)]);
        assert_eq!(cyclic_components(&[1, 2, 3, 4], edges), vec![vec![1]]);
    }

    #[test]
    fn test_components_follow_cell_order() {
        let edges = graph(&[(5, 9), (9, 7), (7, 5)]);
        assert_eq!(cyclic_components(&[9, 7, 5], edges), vec![vec![9, 7, 5]]);
    }

    #[test]
    fn test_components_on_long_chain() {
        let n: CellId = 100_000;
        let cells: Vec<CellId> = (1..=n).collect();
        let looped = |id: CellId| if id < n { vec![id + 1] } else { vec![1] };
        let components = cyclic_components(&cells, looped);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].len(), n as usize);
    }
}
