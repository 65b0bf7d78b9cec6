//! Formula evaluator
//!
//! Evaluates formula ASTs against a [`CellStore`] to produce values.

use crate::ast::{AstNode, BinaryOperator, UnaryOperator};
use crate::error::{EvalError, EvalResult};
use crate::functions::FunctionRegistry;
use duke_calc_core::{CellAddress, CellRange, CellStore, CellValue, ValueStore, ERROR_SENTINEL};
use std::sync::OnceLock;

/// Default cap on the number of cells a range argument may cover
pub const DEFAULT_MAX_RANGE_CELLS: usize = 10_000;

/// Built-in function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn builtin_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

static EMPTY_STORE: OnceLock<ValueStore> = OnceLock::new();

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    /// Values of a range argument, row-major, absent cells skipped
    Array(Vec<FormulaValue>),
}

impl FormulaValue {
    /// Coerce to a number
    ///
    /// Strings are trimmed and parsed, falling back to 0 when the text is not
    /// a finite number. Booleans are 1 or 0. Anything else is 0.
    pub fn to_number(&self) -> f64 {
        match self {
            FormulaValue::Number(n) => *n,
            FormulaValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            FormulaValue::Boolean(true) => 1.0,
            FormulaValue::Boolean(false) => 0.0,
            FormulaValue::Array(_) => 0.0,
        }
    }

    /// Non-zero numbers, non-empty strings and `true` are truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            FormulaValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FormulaValue::String(s) => !s.is_empty(),
            FormulaValue::Boolean(b) => *b,
            FormulaValue::Array(_) => false,
        }
    }

    /// Read a stored cell value; the error value reads as its sentinel text
    pub fn from_cell(value: &CellValue) -> Self {
        match value {
            CellValue::Number(n) => FormulaValue::Number(*n),
            CellValue::String(s) => FormulaValue::String(s.clone()),
            CellValue::Boolean(b) => FormulaValue::Boolean(*b),
            CellValue::Error => FormulaValue::String(ERROR_SENTINEL.to_string()),
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) => CellValue::Number(n),
            FormulaValue::String(s) => CellValue::String(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Array(_) => CellValue::Error,
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Cell values that references resolve against
    pub store: &'a dyn CellStore,
    /// Functions callable from formulas
    pub registry: &'a FunctionRegistry,
    /// Largest range a function argument may cover
    pub max_range_cells: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context over `store` with the built-in functions
    pub fn new(store: &'a dyn CellStore) -> Self {
        Self {
            store,
            registry: builtin_registry(),
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }

    /// Create a context over an empty store (for testing)
    pub fn simple() -> EvaluationContext<'static> {
        EvaluationContext::new(EMPTY_STORE.get_or_init(ValueStore::new))
    }

    /// Use a custom function registry
    pub fn with_registry(mut self, registry: &'a FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the range size limit
    pub fn with_max_range_cells(mut self, max_range_cells: usize) -> Self {
        self.max_range_cells = max_range_cells;
        self
    }

    /// Value of a single cell; absent cells read as 0
    pub fn cell_value(&self, reference: &str) -> EvalResult<FormulaValue> {
        if reference.contains(':') {
            return Err(EvalError::RangeNotAllowed(reference.to_string()));
        }

        let address = CellAddress::parse(reference)
            .map_err(|_| EvalError::InvalidReference(reference.to_string()))?;

        Ok(self
            .store
            .value(address.key())
            .map_or(FormulaValue::Number(0.0), FormulaValue::from_cell))
    }

    /// Values of the non-empty cells in a range, row-major
    pub fn range_values(&self, reference: &str) -> EvalResult<FormulaValue> {
        let range = CellRange::parse(reference)
            .map_err(|_| EvalError::InvalidReference(reference.to_string()))?;

        let cells = range.cell_count();
        if cells > self.max_range_cells as u64 {
            return Err(EvalError::RangeTooLarge {
                range: reference.to_string(),
                cells,
                limit: self.max_range_cells,
            });
        }

        let values = range
            .cells()
            .filter_map(|address| self.store.value(address.key()))
            .map(FormulaValue::from_cell)
            .collect();

        Ok(FormulaValue::Array(values))
    }
}

/// Evaluate a formula expression to a single value
///
/// # Example
/// ```rust
/// use duke_calc_formula::evaluator::{evaluate, EvaluationContext, FormulaValue};
/// use duke_calc_formula::parser::parse_formula;
///
/// let ast = parse_formula("=2^3^2").unwrap();
/// let value = evaluate(&ast, &EvaluationContext::simple()).unwrap();
/// assert_eq!(value, FormulaValue::Number(512.0));
/// ```
pub fn evaluate(expr: &AstNode, ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    match evaluate_node(expr, ctx)? {
        FormulaValue::Array(_) => Err(EvalError::RangeNotAllowed(expr.to_string())),
        value => Ok(value),
    }
}

fn evaluate_node(expr: &AstNode, ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    match expr {
        // === Literals ===
        AstNode::Number(n) => Ok(FormulaValue::Number(*n)),
        AstNode::String(s) => Ok(FormulaValue::String(s.clone())),

        // === References ===
        AstNode::CellRef(reference) => ctx.cell_value(reference),

        // === Operators ===
        AstNode::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        AstNode::UnaryOp { op, operand } => {
            let value = evaluate_node(operand, ctx)?.to_number();
            match op {
                UnaryOperator::Negate => Ok(FormulaValue::Number(-value)),
            }
        }

        // === Functions ===
        AstNode::FunctionCall { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &AstNode,
    right: &AstNode,
    ctx: &EvaluationContext,
) -> EvalResult<FormulaValue> {
    let l = evaluate_node(left, ctx)?.to_number();
    let r = evaluate_node(right, ctx)?.to_number();

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            l / r
        }
        BinaryOperator::Remainder => l % r,
        BinaryOperator::Power => l.powf(r),
    };

    Ok(FormulaValue::Number(result))
}

/// Evaluate a function call
///
/// A range reference given directly as an argument expands to an array;
/// anywhere else it is a scalar reference and fails.
fn evaluate_function(
    name: &str,
    args: &[AstNode],
    ctx: &EvaluationContext,
) -> EvalResult<FormulaValue> {
    let func = ctx
        .registry
        .get(name)
        .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;

    func.check_arity(args.len())?;

    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        let value = match arg {
            AstNode::CellRef(reference) if reference.contains(':') => {
                ctx.range_values(reference)?
            }
            _ => evaluate_node(arg, ctx)?,
        };
        evaluated_args.push(value);
    }

    (func.implementation)(&evaluated_args, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormulaResult;
    use crate::functions::FunctionDef;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::simple();
        Ok(evaluate(&ast, &ctx)?)
    }

    fn eval_with(formula: &str, store: &ValueStore) -> EvalResult<FormulaValue> {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &EvaluationContext::new(store))
    }

    fn eval_err(formula: &str) -> EvalError {
        let ast = parse_formula(formula).unwrap();
        evaluate(&ast, &EvaluationContext::simple()).unwrap_err()
    }

    fn sample_store() -> ValueStore {
        let mut store = ValueStore::new();
        store.insert("A1", 1.0).unwrap();
        store.insert("A2", 2.0).unwrap();
        store.insert("A3", 4.0).unwrap();
        store.insert("B1", "12").unwrap();
        store.insert("B2", true).unwrap();
        store.insert("C1", CellValue::Error).unwrap();
        store
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(eval("=3.14").unwrap(), FormulaValue::Number(3.14));
        assert_eq!(
            eval("=\"Hello\"").unwrap(),
            FormulaValue::String("Hello".into())
        );
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2*3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("=10-4-3").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=2^3^2").unwrap(), FormulaValue::Number(512.0));
        assert_eq!(eval("=7%4").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=-7%4").unwrap(), FormulaValue::Number(-3.0));
        assert_eq!(eval("=--5").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("=-2^2").unwrap(), FormulaValue::Number(4.0));
    }

    #[test]
    fn test_evaluate_string_coercion() {
        assert_eq!(eval("=\" 2.5 \"*2").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("=\"abc\"+1").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("=-\"3\"").unwrap(), FormulaValue::Number(-3.0));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        assert_eq!(eval_err("=1/0"), EvalError::DivisionByZero);
        assert_eq!(eval_err("=1/(2-2)"), EvalError::DivisionByZero);
        assert_eq!(eval_err("=1/\"x\""), EvalError::DivisionByZero);
    }

    #[test]
    fn test_remainder_by_zero_is_nan() {
        match eval("=5%0").unwrap() {
            FormulaValue::Number(n) => assert!(n.is_nan()),
            other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_cell_references() {
        let store = sample_store();

        assert_eq!(eval_with("=A1+A3", &store), Ok(FormulaValue::Number(5.0)));
        assert_eq!(eval_with("=B1/2", &store), Ok(FormulaValue::Number(6.0)));
        assert_eq!(eval_with("=B2*10", &store), Ok(FormulaValue::Number(10.0)));
        // Absent cells read as zero
        assert_eq!(eval_with("=Z99+1", &store), Ok(FormulaValue::Number(1.0)));
        // A bare reference returns the stored value unchanged
        assert_eq!(eval_with("=B1", &store), Ok(FormulaValue::String("12".into())));
    }

    #[test]
    fn test_error_cells_read_as_sentinel_text() {
        let store = sample_store();
        assert_eq!(
            eval_with("=C1", &store),
            Ok(FormulaValue::String(ERROR_SENTINEL.into()))
        );
        assert_eq!(eval_with("=C1+1", &store), Ok(FormulaValue::Number(1.0)));
        // 1 + "12" + "#ERROR"
        assert_eq!(eval_with("=SUM(A1:C1)", &store), Ok(FormulaValue::Number(13.0)));
        assert_eq!(eval_with("=COUNT(C1, 2)", &store), Ok(FormulaValue::Number(2.0)));
        assert_eq!(eval_with("=COUNT(A1:C1)", &store), Ok(FormulaValue::Number(3.0)));
    }

    #[test]
    fn test_non_finite_text_coerces_to_zero() {
        assert_eq!(eval("=\"NaN\"+1").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("=\"inf\"*2").unwrap(), FormulaValue::Number(0.0));
        assert_eq!(eval("=\" -infinity \"+3").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=\"1e3\"+1").unwrap(), FormulaValue::Number(1001.0));
    }

    #[test]
    fn test_evaluate_functions() {
        assert_eq!(eval("=SUM(1,2,3)").unwrap(), FormulaValue::Number(6.0));
        assert_eq!(eval("=SUM()").unwrap(), FormulaValue::Number(0.0));
        assert_eq!(eval("=AVERAGE(2,4,6)").unwrap(), FormulaValue::Number(4.0));
        assert_eq!(eval("=MIN(5,2,8,1)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("=MAX(5,2,8,1)").unwrap(), FormulaValue::Number(8.0));
        assert_eq!(eval("=COUNT(1,\"a\",3)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=ABS(-2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("=SQRT(9)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=ROUND(2.5, 0)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=POWER(2, 8)").unwrap(), FormulaValue::Number(256.0));
        assert_eq!(eval("=Round(1.25, 1)").unwrap(), FormulaValue::Number(1.3));
    }

    #[test]
    fn test_evaluate_if() {
        assert_eq!(eval("=IF(1, 2, 3)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("=IF(0, 2, 3)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(
            eval("=IF(\"\", \"yes\", \"no\")").unwrap(),
            FormulaValue::String("no".into())
        );
        // Both branches are evaluated
        assert_eq!(eval_err("=IF(1, 2, 1/0)"), EvalError::DivisionByZero);
    }

    #[test]
    fn test_evaluate_nested_functions() {
        assert_eq!(
            eval("=SUM(1, MAX(2, 3), ABS(-4)) * 2").unwrap(),
            FormulaValue::Number(16.0)
        );
    }

    #[test]
    fn test_argument_count_errors() {
        assert_eq!(
            eval_err("=IF(1,2)"),
            EvalError::ArgumentCount {
                function: "IF".into(),
                expected: "exactly 3".into(),
                actual: 2
            }
        );
        assert!(matches!(
            eval_err("=ROUND(1)"),
            EvalError::ArgumentCount { actual: 1, .. }
        ));
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            eval_err("=NOPE(1)"),
            EvalError::UnknownFunction("NOPE".into())
        );
        assert_eq!(eval_err("=AVERAGE()"), EvalError::EmptyAverage);
    }

    #[test]
    fn test_range_arguments() {
        let store = sample_store();

        assert_eq!(eval_with("=SUM(A1:A3)", &store), Ok(FormulaValue::Number(7.0)));
        assert_eq!(eval_with("=SUM(A3:A1)", &store), Ok(FormulaValue::Number(7.0)));
        // B1 holds "12" and B2 TRUE, A4..B4 are absent and skipped
        assert_eq!(eval_with("=SUM(A1:B4)", &store), Ok(FormulaValue::Number(20.0)));
        assert_eq!(eval_with("=COUNT(A1:B4)", &store), Ok(FormulaValue::Number(5.0)));
        assert_eq!(
            eval_with("=AVERAGE(A1:A3, 5)", &store),
            Ok(FormulaValue::Number(3.0))
        );
        assert_eq!(
            eval_with("=AVERAGE(D1:D9)", &store),
            Err(EvalError::EmptyAverage)
        );
    }

    #[test]
    fn test_ranges_outside_function_arguments() {
        let store = sample_store();

        assert_eq!(
            eval_with("=A1:A3", &store),
            Err(EvalError::RangeNotAllowed("A1:A3".into()))
        );
        assert_eq!(
            eval_with("=SUM(A1:A3+1)", &store),
            Err(EvalError::RangeNotAllowed("A1:A3".into()))
        );
        assert!(matches!(
            eval_with("=ABS(A1:A3)", &store),
            Err(EvalError::RangeNotAllowed(_))
        ));
    }

    #[test]
    fn test_range_size_limit() {
        let store = sample_store();
        let ast = parse_formula("=SUM(A1:B10)").unwrap();

        let ctx = EvaluationContext::new(&store).with_max_range_cells(19);
        assert_eq!(
            evaluate(&ast, &ctx),
            Err(EvalError::RangeTooLarge {
                range: "A1:B10".into(),
                cells: 20,
                limit: 19
            })
        );

        let ctx = EvaluationContext::new(&store).with_max_range_cells(20);
        assert_eq!(evaluate(&ast, &ctx), Ok(FormulaValue::Number(20.0)));
    }

    #[test]
    fn test_invalid_reference() {
        assert_eq!(
            eval_err("=A99999999999"),
            EvalError::InvalidReference("A99999999999".into())
        );
    }

    #[test]
    fn test_custom_registry() {
        fn double(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
            Ok(FormulaValue::Number(args[0].to_number() * 2.0))
        }

        let mut registry = FunctionRegistry::new();
        registry
            .register(FunctionDef {
                name: "DOUBLE",
                min_args: 1,
                max_args: Some(1),
                implementation: double,
            })
            .unwrap();

        let store = sample_store();
        let ctx = EvaluationContext::new(&store).with_registry(&registry);
        let ast = parse_formula("=DOUBLE(A3) + 1").unwrap();
        assert_eq!(evaluate(&ast, &ctx), Ok(FormulaValue::Number(9.0)));
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let store = sample_store();
        let first = eval_with("=SUM(A1:A3)*B1-ROUND(A2/3, 2)", &store);
        let second = eval_with("=SUM(A1:A3)*B1-ROUND(A2/3, 2)", &store);
        assert_eq!(first, second);
    }
}
