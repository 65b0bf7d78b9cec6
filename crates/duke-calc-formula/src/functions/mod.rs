//! Built-in spreadsheet functions

pub mod logical;
pub mod math;

use crate::error::{EvalError, EvalResult, RegistryError};
use crate::evaluator::{EvaluationContext, FormulaValue};
use std::collections::HashMap;

/// Function implementation signature
///
/// Arguments arrive fully evaluated. A range argument arrives as a single
/// [`FormulaValue::Array`] holding the values of the non-empty cells it covers.
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> EvalResult<FormulaValue>;

/// Function definition
#[derive(Clone)]
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Check a call's argument count against this definition
    pub fn check_arity(&self, actual: usize) -> EvalResult<()> {
        let expected = match self.max_args {
            Some(max) if max == self.min_args && actual != max => format!("exactly {}", max),
            Some(max) if actual > max => format!("at most {}", max),
            _ if actual < self.min_args => format!("at least {}", self.min_args),
            _ => return Ok(()),
        };

        Err(EvalError::ArgumentCount {
            function: self.name.to_string(),
            expected,
            actual,
        })
    }
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Function registry
///
/// Names are stored upper-cased; lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_logical_functions();

        registry
    }

    /// Create a registry with no functions at all
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check whether a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Register a function
    ///
    /// Rejects empty names, names already taken and `min_args > max_args`.
    pub fn register(&mut self, def: FunctionDef) -> Result<(), RegistryError> {
        let key = def.name.trim().to_uppercase();
        if key.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.functions.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }
        if let Some(max) = def.max_args {
            if def.min_args > max {
                return Err(RegistryError::InvalidArity {
                    name: key,
                    min: def.min_args,
                    max,
                });
            }
        }

        self.functions.insert(key, def);
        Ok(())
    }

    // Built-in tables are checked by `test_builtins_pass_validation`
    fn insert(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_string(), def);
    }

    fn register_math_functions(&mut self) {
        self.insert(FunctionDef {
            name: "SUM",
            min_args: 0,
            max_args: None,
            implementation: math::fn_sum,
        });

        self.insert(FunctionDef {
            name: "AVERAGE",
            min_args: 0,
            max_args: None,
            implementation: math::fn_average,
        });

        self.insert(FunctionDef {
            name: "MIN",
            min_args: 0,
            max_args: None,
            implementation: math::fn_min,
        });

        self.insert(FunctionDef {
            name: "MAX",
            min_args: 0,
            max_args: None,
            implementation: math::fn_max,
        });

        self.insert(FunctionDef {
            name: "COUNT",
            min_args: 0,
            max_args: None,
            implementation: math::fn_count,
        });

        self.insert(FunctionDef {
            name: "ABS",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_abs,
        });

        self.insert(FunctionDef {
            name: "SQRT",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_sqrt,
        });

        self.insert(FunctionDef {
            name: "ROUND",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_round,
        });

        self.insert(FunctionDef {
            name: "POWER",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_power,
        });
    }

    fn register_logical_functions(&mut self) {
        self.insert(FunctionDef {
            name: "IF",
            min_args: 3,
            max_args: Some(3),
            implementation: logical::fn_if,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a scalar argument as a number, rejecting ranges
pub(crate) fn number_arg(
    args: &[FormulaValue],
    index: usize,
    function: &'static str,
) -> EvalResult<f64> {
    match args.get(index) {
        Some(FormulaValue::Array(_)) => Err(EvalError::RangeNotAllowed(format!(
            "argument {} of {}",
            index + 1,
            function
        ))),
        Some(value) => Ok(value.to_number()),
        None => Err(EvalError::ArgumentCount {
            function: function.to_string(),
            expected: format!("at least {}", index + 1),
            actual: args.len(),
        }),
    }
}

/// Flatten arguments, expanding ranges in place
pub(crate) fn flatten(args: &[FormulaValue]) -> impl Iterator<Item = &FormulaValue> {
    args.iter().flat_map(|arg| match arg {
        FormulaValue::Array(items) => items.iter(),
        scalar => std::slice::from_ref(scalar).iter(),
    })
}
