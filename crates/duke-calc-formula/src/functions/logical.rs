//! Logical functions

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// IF(condition, if_true, if_false)
///
/// All three arguments are evaluated before the call; the chosen branch is
/// returned unchanged.
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let [condition, if_true, if_false] = args else {
        return Err(EvalError::ArgumentCount {
            function: "IF".to_string(),
            expected: "exactly 3".to_string(),
            actual: args.len(),
        });
    };

    if let FormulaValue::Array(_) = condition {
        return Err(EvalError::RangeNotAllowed("condition of IF".to_string()));
    }

    if condition.is_truthy() {
        Ok(if_true.clone())
    } else {
        Ok(if_false.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn if_(condition: FormulaValue) -> EvalResult<FormulaValue> {
        let args = [
            condition,
            FormulaValue::String("yes".into()),
            FormulaValue::Number(0.0),
        ];
        fn_if(&args, &EvaluationContext::simple())
    }

    #[test]
    fn test_if_truthiness() {
        let yes = Ok(FormulaValue::String("yes".into()));
        let no = Ok(FormulaValue::Number(0.0));

        assert_eq!(if_(FormulaValue::Number(2.0)), yes);
        assert_eq!(if_(FormulaValue::Number(0.0)), no);
        assert_eq!(if_(FormulaValue::String("x".into())), yes);
        assert_eq!(if_(FormulaValue::String(String::new())), no);
        assert_eq!(if_(FormulaValue::Boolean(true)), yes);
        assert_eq!(if_(FormulaValue::Boolean(false)), no);
    }

    #[test]
    fn test_if_rejects_range_condition() {
        assert!(matches!(
            if_(FormulaValue::Array(vec![FormulaValue::Number(1.0)])),
            Err(EvalError::RangeNotAllowed(_))
        ));
    }
}
