//! The built-in function library, one module per category.
//!
//! Each module exports `FUNCTIONS`, a const table of [`FuncDef`]s.
//! Handlers compute with native types and serialize at the end:
//! booleans become `"1"`/`"0"`, numbers their invariant text.

use crate::error::MacroError;
use crate::expand::Call;
use crate::function::FuncDef;
use crate::numeric::{parse_f64, parse_i64};

mod arrays;
mod conditionals;
mod dates;
mod files;
mod misc;
mod numbers;
mod processes;
mod strings;
mod vars;

/// Every built-in table, in registration order.
pub(crate) const ALL_TABLES: &[&[FuncDef]] = &[
    vars::FUNCTIONS,
    numbers::FUNCTIONS,
    strings::FUNCTIONS,
    conditionals::FUNCTIONS,
    arrays::FUNCTIONS,
    dates::FUNCTIONS,
    files::FUNCTIONS,
    processes::FUNCTIONS,
    misc::FUNCTIONS,
];

pub(crate) fn flag(b: bool) -> String {
    if b { "1" } else { "0" }.to_string()
}

/// Integer from a literal token, a variable's value, or quoted text.
pub(crate) fn int_arg(call: &Call<'_, '_>, i: usize, message: &str) -> Result<i64, MacroError> {
    parse_i64(&call.value_or_literal(i)).ok_or_else(|| MacroError::invalid(message))
}

/// Float from a literal token, a variable's value, or quoted text.
pub(crate) fn float_arg(call: &Call<'_, '_>, i: usize, message: &str) -> Result<f64, MacroError> {
    parse_f64(&call.value_or_literal(i)).ok_or_else(|| MacroError::invalid(message))
}
