//! Numeric built-ins: formatting, rounding, human-scale numbers, random
//! numbers and arithmetic evaluation.

use rand::Rng;

use crate::builtins::{float_arg, int_arg};
use crate::error::MacroError;
use crate::eval::evaluate;
use crate::expand::Call;
use crate::function::{Category, FuncDef};
use crate::numeric::{self, format_f64, format_i64, parse_f64, parse_i64, round_half_even};
use crate::param::ParamKind::*;

/// Largest number of decimals a rounding call may request.
const MAX_DIGITS: i64 = 28;

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "abs",
        abs,
        1,
        2,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "Absolute value, with an optional format",
    ),
    FuncDef::new(
        "int",
        int,
        1,
        2,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "64-bit integer, with an optional format",
    ),
    FuncDef::new(
        "floor",
        floor,
        1,
        2,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "Largest integer not above the value, with an optional format",
    ),
    FuncDef::new(
        "hnum",
        hnum,
        2,
        2,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "Human-scale number using neg;T;B;M;K;H words",
    ),
    FuncDef::new(
        "eval",
        eval,
        1,
        2,
        &[ValueOrLiteralOrText, Literal],
        Category::Numbers,
        "Evaluate an arithmetic expression; Try yields NAN on failure",
    ),
    FuncDef::new(
        "random",
        random,
        1,
        1,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "Random integer from 0 up to but excluding the limit",
    ),
    FuncDef::new(
        "round",
        round,
        3,
        3,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "Round to digits (midpoints to even) and format",
    ),
    FuncDef::new(
        "roundnz",
        round,
        4,
        4,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "As round, adding extra digits when the result would be zero",
    ),
    FuncDef::new(
        "roundscale",
        round,
        5,
        5,
        &[ValueOrLiteralOrText],
        Category::Numbers,
        "As roundnz, scaling the value first",
    ),
];

fn format_arg(call: &Call<'_, '_>, i: usize) -> String {
    call.opt_value_or_literal(i).unwrap_or_default()
}

fn abs(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let v = float_arg(call, 0, "Parameter must be a number")?;
    format_f64(v.abs(), &format_arg(call, 1))
}

fn int(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let v = int_arg(call, 0, "Parameter must be an integer number")?;
    format_i64(v, &format_arg(call, 1))
}

fn floor(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let v = float_arg(call, 0, "Parameter must be a number")?;
    format_f64(v.floor(), &format_arg(call, 1))
}

fn hnum(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let v = float_arg(call, 0, "Parameter must be a number")?;
    let words = call.value_or_literal(1);
    let words: Vec<&str> = words.split(';').collect();
    numeric::hnum(v, &words)
}

fn eval(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let expr = call.value_or_literal(0);
    let try_it = call.len() > 1 && call.raw(1).eq_ignore_ascii_case("try");
    match evaluate(&expr) {
        Ok(result) => Ok(result),
        Err(_) if try_it => Ok("NAN".to_string()),
        Err(err) => Err(MacroError::failed(err.to_string())),
    }
}

fn random(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let limit = int_arg(
        call,
        0,
        "Parameter should be an integer constant or a variable name with an integer in its value",
    )?;
    match limit {
        n if n < 0 => Err(MacroError::invalid("Random limit must not be negative")),
        0 => Ok("0".to_string()),
        n => Ok(call.rng().gen_range(0..n).to_string()),
    }
}

/// Shared by `round`, `roundnz` and `roundscale`; the parameter count
/// selects which extras apply.
fn round(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let extra = if call.len() >= 4 {
        int_arg(call, 3, "Extra digits must be an integer")?
    } else {
        0
    };
    let scale = if call.len() >= 5 {
        float_arg(call, 4, "Scale must be a number")?
    } else {
        1.0
    };
    let value = parse_f64(&call.value_or_literal(0))
        .ok_or_else(|| MacroError::invalid("Value must be an integer or fractional number"))?
        * scale;
    let digits = parse_i64(&call.value_or_literal(1))
        .filter(|d| (0..=MAX_DIGITS).contains(d))
        .ok_or_else(|| MacroError::invalid("Digits must be a variable or an integer number of digits"))?;
    let mut fmt = call.value_or_literal(2);

    let mut result = round_half_even(value, digits as u32);
    if extra > 0 && result.abs() < 1e-7 {
        let widened = (digits + extra).min(MAX_DIGITS);
        fmt = widen_format(&fmt, (widened - digits) as usize);
        result = round_half_even(value, widened as u32);
    }
    format_f64(result, &fmt)
}

/// Add `extra` optional decimal places to a custom format.
fn widen_format(fmt: &str, extra: usize) -> String {
    let custom = fmt.contains('0') || fmt.contains('#');
    if fmt.is_empty() || !custom || fmt.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return fmt.to_string();
    }
    let hashes = "#".repeat(extra);
    if fmt.contains('.') {
        format!("{}{}", fmt, hashes)
    } else {
        format!("{}.{}", fmt, hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::widen_format;
    use crate::{Expander, FunctionTable, MacroError, Variables};

    fn run(text: &str) -> Result<String, MacroError> {
        let table = FunctionTable::builtin();
        let vars: Variables = [("fuel", "-12.75"), ("fmt", "0.0")].into_iter().collect();
        Expander::new(&table, vars).with_seed(1).expand(text)
    }

    #[test]
    fn abs_int_floor() {
        assert_eq!(run("%abs(fuel)").unwrap(), "12.75");
        assert_eq!(run("%abs(fuel, fmt)").unwrap(), "12.8");
        assert_eq!(run("%floor(fuel)").unwrap(), "-13");
        assert_eq!(run("%int(42, \"D4\")").unwrap(), "0042");
        assert_eq!(
            run("%int(fuel)").unwrap_err().to_string(),
            "Parameter must be an integer number"
        );
        assert_eq!(
            run("%abs(1, \"Z\")").unwrap_err().to_string(),
            "Format is incorrect"
        );
    }

    #[test]
    fn human_scale() {
        assert_eq!(run("%hnum(1500000, \"neg;T;B;M;K;H\")").unwrap(), "1.5 M");
        assert_eq!(run("%hnum(-2500, \"neg;T;B;M;K;H\")").unwrap(), "neg 2 K 5 H");
        assert_eq!(
            run("%hnum(5, \"a;b\")").unwrap_err().to_string(),
            "Need prefixes and postfixes"
        );
    }

    #[test]
    fn eval_with_and_without_try() {
        assert_eq!(run("%eval(\"(1+2)*4\")").unwrap(), "12");
        assert_eq!(run("%eval(\"1/0\", Try)").unwrap(), "NAN");
        assert_eq!(run("%eval(\"1/0\")").unwrap_err().to_string(), "Divide by zero");
    }

    #[test]
    fn random_stays_in_range() {
        for _ in 0..10 {
            let v: i64 = run("%random(6)").unwrap().parse().unwrap();
            assert!((0..6).contains(&v));
        }
        assert_eq!(run("%random(0)").unwrap(), "0");
        assert!(run("%random(x)").is_err());
    }

    #[test]
    fn rounding_family() {
        assert_eq!(run("%round(2.5, 0, \"\")").unwrap(), "2");
        assert_eq!(run("%round(3.14159, 2, \"0.00\")").unwrap(), "3.14");
        assert_eq!(run("%roundnz(0.00042, 2, \"0.##\", 3)").unwrap(), "0.0004");
        assert_eq!(run("%roundnz(1.234, 2, \"0.##\", 3)").unwrap(), "1.23");
        assert_eq!(run("%roundscale(1500, 1, \"0.0\", 0, 0.001)").unwrap(), "1.5");
        assert!(run("%round(1, -1, \"\")").is_err());
    }

    #[test]
    fn huge_values_still_format() {
        assert_eq!(
            run("%round(1e30, 2, \"0.00\")").unwrap(),
            "1000000000000000000000000000000.00"
        );
        assert_eq!(run("%abs(-1e30, \"0\")").unwrap(), "1000000000000000000000000000000");
        assert!(run("%hnum(1e41, \"n;T;B;M;K;H\")").unwrap().ends_with(" T"));
    }

    #[test]
    fn widening_only_touches_custom_formats() {
        assert_eq!(widen_format("0.##", 2), "0.####");
        assert_eq!(widen_format("0", 2), "0.##");
        assert_eq!(widen_format("N2", 2), "N2");
        assert_eq!(widen_format("", 2), "");
    }
}
