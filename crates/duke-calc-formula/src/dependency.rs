//! Dependency tracking for formula calculation

use duke_calc_core::CellKey;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Dependency graph for formula cells
///
/// Tracks which cells a formula reads (its dependencies) and, in reverse,
/// which formulas read a cell (its dependents). Nodes are created the first
/// time a cell takes part in a formula and are never removed; clearing a
/// formula only drops its outgoing edges.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells its formula reads
    dependencies: HashMap<CellKey, BTreeSet<CellKey>>,
    /// Cell → Cells whose formulas read it
    dependents: HashMap<CellKey, BTreeSet<CellKey>>,
    /// Cell → Formula text
    formulas: HashMap<CellKey, String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `formula` for `cell`, replacing its dependency set with `deps`
    ///
    /// Reverse edges from cells no longer referenced are removed.
    pub fn set_formula(
        &mut self,
        cell: CellKey,
        formula: impl Into<String>,
        deps: impl IntoIterator<Item = CellKey>,
    ) {
        let new_deps: BTreeSet<CellKey> = deps.into_iter().collect();

        self.touch(cell);
        for &dep in &new_deps {
            self.touch(dep);
        }

        let old_deps = self
            .dependencies
            .insert(cell, new_deps.clone())
            .unwrap_or_default();

        for stale in old_deps.difference(&new_deps) {
            if let Some(dependents) = self.dependents.get_mut(stale) {
                dependents.remove(&cell);
            }
        }
        for &dep in &new_deps {
            self.dependents.entry(dep).or_default().insert(cell);
        }

        self.formulas.insert(cell, formula.into());
    }

    /// Drop the formula of `cell` and every edge to the cells it read
    ///
    /// The node itself stays, as do edges from cells that read `cell`.
    pub fn clear_formula(&mut self, cell: CellKey) {
        if let Some(deps) = self.dependencies.get_mut(&cell) {
            for dep in std::mem::take(deps) {
                if let Some(dependents) = self.dependents.get_mut(&dep) {
                    dependents.remove(&cell);
                }
            }
        }
        self.formulas.remove(&cell);
    }

    /// Get cells that the given cell's formula reads
    pub fn dependencies(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.dependencies
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells whose formulas read the given cell
    pub fn dependents(&self, cell: CellKey) -> impl Iterator<Item = CellKey> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Formula text recorded for a cell
    pub fn formula(&self, cell: CellKey) -> Option<&str> {
        self.formulas.get(&cell).map(String::as_str)
    }

    /// Check whether the cell has a node in the graph
    pub fn contains(&self, cell: CellKey) -> bool {
        self.dependencies.contains_key(&cell)
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.dependencies.len()
    }

    /// Transitive dependents of `cell`, each after everything it reads
    ///
    /// `cell` itself is never part of the order. Cells on a cycle appear once,
    /// in depth-first order.
    pub fn recalc_order(&self, cell: CellKey) -> Vec<CellKey> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();

        self.topological_sort(cell, &mut result, &mut visited);

        result.reverse();
        result.retain(|&key| key != cell);
        result
    }

    /// Topological sort helper (post-order DFS over dependents)
    ///
    /// Each stack frame holds a cell and the dependents not yet visited, so
    /// chain length never grows the call stack.
    fn topological_sort(
        &self,
        start: CellKey,
        result: &mut Vec<CellKey>,
        visited: &mut HashSet<CellKey>,
    ) {
        if !visited.insert(start) {
            return;
        }
        let mut stack = vec![(start, self.dependents(start))];

        while let Some((cell, pending)) = stack.last_mut() {
            if let Some(dependent) = pending.next() {
                if visited.insert(dependent) {
                    stack.push((dependent, self.dependents(dependent)));
                }
            } else {
                result.push(*cell);
                stack.pop();
            }
        }
    }

    /// Check whether following dependencies from `cell` ever loops back
    ///
    /// Finds any cycle reachable from `cell`, not only ones passing through it.
    pub fn has_cycle(&self, cell: CellKey) -> bool {
        let mut visited = HashSet::from([cell]);
        let mut on_path = HashSet::from([cell]);
        let mut stack = vec![(cell, self.dependencies(cell))];

        while let Some((current, pending)) = stack.last_mut() {
            if let Some(dependency) = pending.next() {
                if on_path.contains(&dependency) {
                    return true;
                }
                if visited.insert(dependency) {
                    on_path.insert(dependency);
                    stack.push((dependency, self.dependencies(dependency)));
                }
            } else {
                let done = *current;
                on_path.remove(&done);
                stack.pop();
            }
        }

        false
    }

    fn touch(&mut self, cell: CellKey) {
        self.dependencies.entry(cell).or_default();
        self.dependents.entry(cell).or_default();
    }
}
