//! Incremental formula calculation
//!
//! [`FormulaEngine`] owns a cell store, the dependency graph built from the
//! formulas written into it, and the function registry. Writing a cell
//! recalculates everything downstream of it before returning.
//!
//! # Example
//!
//! ```rust
//! use duke_calc::prelude::*;
//!
//! let mut engine = FormulaEngine::new();
//! let a1 = CellAddress::parse("A1").unwrap();
//! let b1 = CellAddress::parse("B1").unwrap();
//!
//! engine.update_cell_data(a1, 1.0, None);
//! engine.update_cell_data(b1, CellValue::default(), Some("=A1+1"));
//! assert_eq!(engine.value(b1), Some(&CellValue::Number(2.0)));
//!
//! let stats = engine.update_cell_data(a1, 5.0, None);
//! assert_eq!(stats.cells_calculated, 1);
//! assert_eq!(engine.value(b1), Some(&CellValue::Number(6.0)));
//! ```

use crate::{
    evaluate, lexer, parse_formula_with_options, CellAddress, CellKey, CellRange, CellRecord,
    CellStore, CellValue, DependencyGraph, EvaluationContext, FormulaResult, FormulaValue,
    FunctionRegistry, ParseOptions, ValueStore, DEFAULT_MAX_DEPTH, DEFAULT_MAX_RANGE_CELLS,
};

/// Options for the formula engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Deepest formula nesting the parser accepts (default: 64)
    pub max_depth: usize,
    /// Most cells a range argument such as `A1:B10` may cover (default: 10 000)
    pub max_range_cells: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Number of formula cells calculated
    pub cells_calculated: usize,
    /// Number of those that produced the `#ERROR` value
    pub errors: usize,
}

impl CalculationStats {
    fn record(&mut self, value: &CellValue) {
        self.cells_calculated += 1;
        if value.is_error() {
            self.errors += 1;
        }
    }
}

/// The formula engine
///
/// Generic over the cell store so a grid can hand over its own storage;
/// [`ValueStore`] is used otherwise.
#[derive(Debug, Clone)]
pub struct FormulaEngine<S: CellStore = ValueStore> {
    store: S,
    graph: DependencyGraph,
    registry: FunctionRegistry,
    options: EngineOptions,
}

impl FormulaEngine<ValueStore> {
    /// Create an engine over an empty [`ValueStore`]
    pub fn new() -> Self {
        Self::with_store(ValueStore::new())
    }
}

impl Default for FormulaEngine<ValueStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CellStore> FormulaEngine<S> {
    /// Create an engine over an existing store with default options
    ///
    /// Formulas already present in the store are not registered in the
    /// dependency graph until they are written through
    /// [`update_cell_data`](Self::update_cell_data).
    pub fn with_store(store: S) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    /// Create an engine over an existing store with custom options
    pub fn with_options(store: S, options: EngineOptions) -> Self {
        Self {
            store,
            graph: DependencyGraph::new(),
            registry: FunctionRegistry::new(),
            options,
        }
    }

    /// Calculate `formula` as the formula of `cell`
    ///
    /// The cells the formula references are recorded as `cell`'s dependencies
    /// whether or not calculation succeeds. Any lex, parse or evaluation
    /// failure yields [`CellValue::Error`]. The store is not written.
    pub fn calculate(&mut self, formula: &str, cell: impl Into<CellKey>) -> CellValue {
        let cell = cell.into();

        let deps = self.referenced_cells(formula, cell);
        self.graph.set_formula(cell, formula, deps);

        match self.evaluate(formula) {
            Ok(value) => value.into(),
            Err(e) => {
                tracing::warn!("Formula {formula:?} in cell {cell} failed: {e}");
                CellValue::Error
            }
        }
    }

    /// Evaluate a formula against the current store
    ///
    /// Unlike [`calculate`](Self::calculate), this touches neither the
    /// dependency graph nor the store, and reports failures as errors.
    pub fn evaluate(&self, formula: &str) -> FormulaResult<FormulaValue> {
        let parse_options = ParseOptions {
            max_depth: self.options.max_depth,
        };
        let ast = parse_formula_with_options(formula, &parse_options)?;

        let ctx = EvaluationContext::new(&self.store)
            .with_registry(&self.registry)
            .with_max_range_cells(self.options.max_range_cells);
        Ok(evaluate(&ast, &ctx)?)
    }

    /// Write a cell and recalculate everything that depends on it
    ///
    /// With a formula, the stored value is the formula's calculated result
    /// and `value` is ignored. Without one (or with a blank one), `value` is
    /// stored and any previous formula of the cell is dropped along with its
    /// dependency edges.
    ///
    /// The returned stats count the cell itself when it holds a formula.
    pub fn update_cell_data(
        &mut self,
        cell: impl Into<CellKey>,
        value: impl Into<CellValue>,
        formula: Option<&str>,
    ) -> CalculationStats {
        let cell = cell.into();
        let mut stats = CalculationStats::default();

        match formula.filter(|f| !f.trim().is_empty()) {
            Some(formula) => {
                let result = self.calculate(formula, cell);
                stats.record(&result);
                tracing::debug!("Set formula {formula:?} in cell {cell} = {result}");
                self.store.set(cell, CellRecord::with_formula(result, formula));
            }
            None => {
                let value = value.into();
                tracing::debug!("Set value of cell {cell} = {value}");
                self.graph.clear_formula(cell);
                self.store.set(cell, CellRecord::new(value));
            }
        }

        let downstream = self.recalculate_dependents(cell);
        stats.cells_calculated += downstream.cells_calculated;
        stats.errors += downstream.errors;
        stats
    }

    /// Check whether following `cell`'s references ever loops back
    ///
    /// Advisory only: cells on a cycle still calculate, each once per update.
    pub fn check_circular_dependency(&self, cell: impl Into<CellKey>) -> bool {
        self.graph.has_cycle(cell.into())
    }

    /// Recalculate every formula downstream of `cell`
    ///
    /// Cells are visited in dependency order, each exactly once; `cell` itself
    /// is not recalculated.
    pub fn recalculate_dependents(&mut self, cell: impl Into<CellKey>) -> CalculationStats {
        let cell = cell.into();
        let order = self.graph.recalc_order(cell);
        let mut stats = CalculationStats::default();

        for dependent in order {
            let Some(formula) = self.graph.formula(dependent).map(str::to_owned) else {
                continue;
            };

            let value = self.calculate(&formula, dependent);
            tracing::trace!("Recalculated cell {dependent} = {value}");
            stats.record(&value);
            self.store.set_value(dependent, value);
        }

        if stats.cells_calculated > 0 {
            tracing::debug!(
                "Recalculated {} dependents of cell {cell} ({} errors)",
                stats.cells_calculated,
                stats.errors
            );
        }

        stats
    }

    /// Stored value of a cell
    pub fn value(&self, cell: impl Into<CellKey>) -> Option<&CellValue> {
        self.store.value(cell.into())
    }

    /// Options in effect
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store
    ///
    /// Writes made here bypass dependency tracking and recalculation.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the engine, returning its store
    pub fn into_store(self) -> S {
        self.store
    }

    /// The dependency graph
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Function registry, for registering custom functions
    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Keys of every cell a formula references; ranges contribute each cell
    fn referenced_cells(&self, formula: &str, cell: CellKey) -> Vec<CellKey> {
        let mut deps = Vec::new();

        for reference in lexer::cell_references(formula) {
            if reference.contains(':') {
                match CellRange::parse(&reference) {
                    Ok(range) if range.cell_count() <= self.options.max_range_cells as u64 => {
                        deps.extend(range.cells().map(|addr| addr.key()));
                    }
                    Ok(range) => tracing::warn!(
                        "Range {reference} in cell {cell} covers {} cells, not tracked",
                        range.cell_count()
                    ),
                    Err(e) => tracing::warn!("Skipping reference in cell {cell}: {e}"),
                }
            } else {
                match CellAddress::parse(&reference) {
                    Ok(addr) => deps.push(addr.key()),
                    Err(e) => tracing::warn!("Skipping reference in cell {cell}: {e}"),
                }
            }
        }

        deps
    }
}
