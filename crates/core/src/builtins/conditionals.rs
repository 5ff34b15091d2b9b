//! The `if*` family.
//!
//! Parameters after normalization: 0 value, 1 comparator, 2 true
//! branch, 3 false branch, 4 empty-value branch. Unary tests have no
//! comparator, so an empty one is inserted before evaluation. A branch
//! given as a variable name is expanded one level deeper; a string
//! branch was already expanded when the call was parsed.

use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef};
use crate::numeric::{parse_f64, parse_i64};
use crate::param::Param;
use crate::param::ParamKind::{ValueOrLiteralOrText, VarOrText};
use crate::text::{contains_ignore_case, eq_ignore_case};

const EPSILON: f64 = 0.000001;

const UNARY: &[crate::param::ParamKind] = &[VarOrText];
const BINARY: &[crate::param::ParamKind] = &[VarOrText];
const NUMERIC: &[crate::param::ParamKind] = &[VarOrText, ValueOrLiteralOrText, VarOrText];

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new("iftrue", if_true, 2, 3, UNARY, Category::Conditionals, "Branch on a non-zero integer"),
    FuncDef::new("iffalse", if_false, 2, 3, UNARY, Category::Conditionals, "Branch on a zero integer"),
    FuncDef::new("ifzero", if_zero, 2, 3, UNARY, Category::Conditionals, "Branch on a number within 1e-6 of zero"),
    FuncDef::new("ifnonzero", if_non_zero, 2, 3, UNARY, Category::Conditionals, "Branch on a number not within 1e-6 of zero"),
    FuncDef::new("ifempty", if_empty, 2, 4, UNARY, Category::Conditionals, "Branch on an empty value"),
    FuncDef::new("ifnotempty", if_not_empty, 2, 4, UNARY, Category::Conditionals, "Branch on a non-empty value"),
    FuncDef::new("ifcontains", if_contains, 3, 5, BINARY, Category::Conditionals, "Branch on case-insensitive containment"),
    FuncDef::new("ifnotcontains", if_not_contains, 3, 5, BINARY, Category::Conditionals, "Branch on case-insensitive non-containment"),
    FuncDef::new("ifequal", if_equal, 3, 5, BINARY, Category::Conditionals, "Branch on case-insensitive equality"),
    FuncDef::new("ifnotequal", if_not_equal, 3, 5, BINARY, Category::Conditionals, "Branch on case-insensitive inequality"),
    FuncDef::new("ifgt", if_greater, 3, 4, NUMERIC, Category::Conditionals, "Branch on value > comparator")
        .aliases(&["ifnumgreater"]),
    FuncDef::new("ifge", if_greater_equal, 3, 4, NUMERIC, Category::Conditionals, "Branch on value >= comparator")
        .aliases(&["ifnumgreaterequal"]),
    FuncDef::new("iflt", if_less, 3, 4, NUMERIC, Category::Conditionals, "Branch on value < comparator")
        .aliases(&["ifnumless"]),
    FuncDef::new("ifle", if_less_equal, 3, 4, NUMERIC, Category::Conditionals, "Branch on value <= comparator")
        .aliases(&["ifnumlessequal"]),
    FuncDef::new("ifeq", if_num_equal, 3, 4, NUMERIC, Category::Conditionals, "Branch on numeric equality within 1e-6")
        .aliases(&["ifnumequal"]),
    FuncDef::new("ifne", if_num_not_equal, 3, 4, NUMERIC, Category::Conditionals, "Branch on numeric inequality beyond 1e-6")
        .aliases(&["ifnumnotequal"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Test {
    True,
    Zero,
    Empty,
    Contains,
    Equal,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    NumEqual,
}

impl Test {
    fn is_unary(self) -> bool {
        matches!(self, Test::True | Test::Zero | Test::Empty)
    }
}

fn if_true(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::True, true)
}
fn if_false(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::True, false)
}
fn if_zero(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Zero, true)
}
fn if_non_zero(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Zero, false)
}
fn if_empty(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Empty, true)
}
fn if_not_empty(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Empty, false)
}
fn if_contains(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Contains, true)
}
fn if_not_contains(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Contains, false)
}
fn if_equal(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Equal, true)
}
fn if_not_equal(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Equal, false)
}
fn if_greater(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Greater, true)
}
fn if_greater_equal(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::GreaterEqual, true)
}
fn if_less(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::Less, true)
}
fn if_less_equal(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::LessEqual, true)
}
fn if_num_equal(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::NumEqual, true)
}
fn if_num_not_equal(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    condition(call, Test::NumEqual, false)
}

fn condition(call: &mut Call<'_, '_>, test: Test, expect: bool) -> Result<String, MacroError> {
    if test.is_unary() {
        call.insert_param(1, Param::Literal(String::new()));
    }

    let value = call.value(0)?;
    let branch = if call.len() >= 5 && value.is_empty() {
        Some(4)
    } else if evaluate(test, expect, &value, &call.value_or_literal(1))? {
        Some(2)
    } else if call.len() >= 4 {
        Some(3)
    } else {
        None
    };

    let Some(branch) = branch else {
        return Ok(String::new());
    };
    match call.param(branch).clone() {
        Param::Literal(text) => Ok(text),
        Param::VariableRef(name) => {
            let body = call
                .vars()
                .get(&name)
                .map(str::to_string)
                .ok_or_else(|| MacroError::missing(name.as_str()))?;
            call.expand_nested(&body)
        }
    }
}

fn evaluate(test: Test, expect: bool, value: &str, comparator: &str) -> Result<bool, MacroError> {
    let outcome = match test {
        Test::True => {
            let n = parse_i64(value)
                .ok_or_else(|| MacroError::invalid("Condition value is not an integer"))?;
            (n != 0) == expect
        }
        Test::Zero => {
            let n = parse_f64(value).ok_or_else(|| {
                MacroError::invalid("Condition value is not a fractional or integer")
            })?;
            (n.abs() < EPSILON) == expect
        }
        Test::Empty => value.is_empty() == expect,
        Test::Contains => contains_ignore_case(value, comparator) == expect,
        Test::Equal => eq_ignore_case(value, comparator) == expect,
        numeric => {
            let (Some(left), Some(right)) = (parse_f64(value), parse_f64(comparator)) else {
                return Err(MacroError::invalid(
                    "Condition value is not a fractional or integer on one or both sides",
                ));
            };
            match numeric {
                Test::Greater => left > right,
                Test::GreaterEqual => left >= right,
                Test::Less => left < right,
                Test::LessEqual => left <= right,
                _ => ((left - right).abs() < EPSILON) == expect,
            }
        }
    };
    Ok(outcome)
}
