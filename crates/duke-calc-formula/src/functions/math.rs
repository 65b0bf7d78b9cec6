//! Math and aggregate functions
//!
//! Aggregates accept any mix of scalars and ranges and coerce every value
//! with [`FormulaValue::to_number`]. Scalar functions reject ranges.

use super::{flatten, number_arg};
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// SUM function
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let sum = flatten(args).map(FormulaValue::to_number).sum();
    Ok(FormulaValue::Number(sum))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in flatten(args) {
        sum += value.to_number();
        count += 1;
    }

    if count == 0 {
        return Err(EvalError::EmptyAverage);
    }

    Ok(FormulaValue::Number(sum / count as f64))
}

/// MIN function, 0 when there are no values
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let min = flatten(args).map(FormulaValue::to_number).reduce(f64::min);
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX function, 0 when there are no values
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let max = flatten(args).map(FormulaValue::to_number).reduce(f64::max);
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

/// COUNT function
///
/// Counts values without coercing them; a range counts its non-empty cells.
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    Ok(FormulaValue::Number(flatten(args).count() as f64))
}

/// ABS(number) - Returns the absolute value of a number
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let number = number_arg(args, 0, "ABS")?;
    Ok(FormulaValue::Number(number.abs()))
}

/// SQRT(number) - Returns the positive square root of a number
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let number = number_arg(args, 0, "SQRT")?;
    if number < 0.0 {
        return Err(EvalError::InvalidArgument {
            function: "SQRT",
            reason: format!("{} is negative", number),
        });
    }
    Ok(FormulaValue::Number(number.sqrt()))
}

/// Largest digit count ROUND honors; `10^308` is the last finite power of ten
const MAX_ROUND_DIGITS: i32 = 308;

/// ROUND(number, num_digits) - Rounds a number to a specified number of digits
///
/// Rounds half away from zero: `ROUND(2.5, 0)` is 3 and `ROUND(-2.5, 0)` is -3.
/// Negative digit counts round to the left of the decimal point.
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let number = number_arg(args, 0, "ROUND")?;
    let num_digits =
        (number_arg(args, 1, "ROUND")? as i32).clamp(-MAX_ROUND_DIGITS, MAX_ROUND_DIGITS);

    let multiplier = 10_f64.powi(num_digits);
    let result = if number >= 0.0 {
        (number * multiplier + 0.5).floor() / multiplier
    } else {
        (number * multiplier - 0.5).ceil() / multiplier
    };

    // Scaling overflowed, so the number is already that precise
    if !result.is_finite() {
        return Ok(FormulaValue::Number(number));
    }
    Ok(FormulaValue::Number(result))
}

/// POWER(number, power) - Equivalent to number^power
pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> EvalResult<FormulaValue> {
    let number = number_arg(args, 0, "POWER")?;
    let power = number_arg(args, 1, "POWER")?;
    Ok(FormulaValue::Number(number.powf(power)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> FormulaValue {
        FormulaValue::Number(n)
    }

    fn call(
        f: fn(&[FormulaValue], &EvaluationContext) -> EvalResult<FormulaValue>,
        args: &[FormulaValue],
    ) -> EvalResult<FormulaValue> {
        f(args, &EvaluationContext::simple())
    }

    #[test]
    fn test_aggregates_flatten_ranges() {
        let args = [
            num(1.0),
            FormulaValue::Array(vec![num(2.0), FormulaValue::String("3".into())]),
            FormulaValue::Boolean(true),
        ];

        assert_eq!(call(fn_sum, &args), Ok(num(7.0)));
        assert_eq!(call(fn_average, &args), Ok(num(1.75)));
        assert_eq!(call(fn_min, &args), Ok(num(1.0)));
        assert_eq!(call(fn_max, &args), Ok(num(3.0)));
        assert_eq!(call(fn_count, &args), Ok(num(4.0)));
    }

    #[test]
    fn test_aggregates_without_values() {
        let empty_range = [FormulaValue::Array(vec![])];

        assert_eq!(call(fn_sum, &[]), Ok(num(0.0)));
        assert_eq!(call(fn_max, &[]), Ok(num(0.0)));
        assert_eq!(call(fn_min, &empty_range), Ok(num(0.0)));
        assert_eq!(call(fn_count, &empty_range), Ok(num(0.0)));
        assert_eq!(call(fn_average, &[]), Err(EvalError::EmptyAverage));
        assert_eq!(call(fn_average, &empty_range), Err(EvalError::EmptyAverage));
    }

    #[test]
    fn test_min_max_with_negatives() {
        let args = [num(-4.0), num(-1.5), num(-9.0)];
        assert_eq!(call(fn_max, &args), Ok(num(-1.5)));
        assert_eq!(call(fn_min, &args), Ok(num(-9.0)));
    }

    #[test]
    fn test_abs_and_sqrt() {
        assert_eq!(call(fn_abs, &[num(-3.5)]), Ok(num(3.5)));
        assert_eq!(call(fn_sqrt, &[num(16.0)]), Ok(num(4.0)));
        assert!(matches!(
            call(fn_sqrt, &[num(-1.0)]),
            Err(EvalError::InvalidArgument { function: "SQRT", .. })
        ));
    }

    #[test]
    fn test_round_function() {
        assert_eq!(call(fn_round, &[num(2.5), num(0.0)]), Ok(num(3.0)));
        assert_eq!(call(fn_round, &[num(-2.5), num(0.0)]), Ok(num(-3.0)));
        assert_eq!(call(fn_round, &[num(2.4), num(0.0)]), Ok(num(2.0)));
        assert_eq!(call(fn_round, &[num(3.14159), num(2.0)]), Ok(num(3.14)));
        assert_eq!(call(fn_round, &[num(1234.5), num(-2.0)]), Ok(num(1200.0)));
        assert_eq!(call(fn_round, &[num(1250.0), num(-2.0)]), Ok(num(1300.0)));
    }

    #[test]
    fn test_round_extreme_digits() {
        assert_eq!(call(fn_round, &[num(1.0), num(400.0)]), Ok(num(1.0)));
        assert_eq!(call(fn_round, &[num(123.456), num(400.0)]), Ok(num(123.456)));
        assert_eq!(call(fn_round, &[num(-0.25), num(1e12)]), Ok(num(-0.25)));
        assert_eq!(call(fn_round, &[num(5.0), num(-400.0)]), Ok(num(0.0)));
        assert_eq!(call(fn_round, &[num(-5.0), num(-1e12)]), Ok(num(0.0)));
    }

    #[test]
    fn test_power_function() {
        assert_eq!(call(fn_power, &[num(2.0), num(10.0)]), Ok(num(1024.0)));
        assert_eq!(call(fn_power, &[num(4.0), num(0.5)]), Ok(num(2.0)));
    }

    #[test]
    fn test_scalar_functions_reject_ranges() {
        let range = FormulaValue::Array(vec![num(1.0)]);
        assert!(matches!(
            call(fn_abs, &[range.clone()]),
            Err(EvalError::RangeNotAllowed(_))
        ));
        assert!(matches!(
            call(fn_power, &[num(2.0), range]),
            Err(EvalError::RangeNotAllowed(_))
        ));
    }
}
