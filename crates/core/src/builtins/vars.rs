//! Variable built-ins: existence tests, defaults and indirect expansion.

use crate::builtins::flag;
use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef, MAX_PARAMS};
use crate::param::ParamKind::*;
use crate::text::contains_ignore_case;

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "exist",
        exist,
        1,
        MAX_PARAMS,
        &[NameOrText],
        Category::Variables,
        "1 if every named variable exists, else 0",
    ),
    FuncDef::new(
        "existsdefault",
        exists_default,
        2,
        2,
        &[NameOrText, VarOrText],
        Category::Variables,
        "Value of the variable if it exists, else the default",
    ),
    FuncDef::new(
        "expand",
        expand,
        1,
        MAX_PARAMS,
        &[VarOrText],
        Category::Variables,
        "Expand each value again and concatenate the results",
    ),
    FuncDef::new(
        "indirect",
        indirect,
        1,
        MAX_PARAMS,
        &[VarOrText],
        Category::Variables,
        "Expand the variables named by each value",
    ),
    FuncDef::new(
        "i",
        indirect_suffix,
        2,
        2,
        &[Var, LiteralOrText],
        Category::Variables,
        "Expand the variable named by a variable's value plus a suffix",
    ),
    FuncDef::new(
        "ispresent",
        is_present,
        2,
        3,
        &[VarName, VarOrText, ValueOrLiteralOrText],
        Category::Variables,
        "1 if the variable contains the text; default or 0 when it is missing",
    ),
];

fn exist(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let all = call.params().iter().all(|p| call.vars().exists(p.raw()));
    Ok(flag(all))
}

fn exists_default(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    match call.vars().get(call.raw(0)) {
        Some(value) => Ok(value.to_string()),
        None => call.value(1),
    }
}

fn expand(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let mut out = String::new();
    for i in 0..call.len() {
        let value = call.value(i)?;
        out.push_str(&call.expand_nested(&value)?);
    }
    Ok(out)
}

fn indirect(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let mut out = String::new();
    for i in 0..call.len() {
        let name = call.value(i)?;
        let target = lookup_indirect(call, name)?;
        out.push_str(&call.expand_nested(&target)?);
    }
    Ok(out)
}

fn indirect_suffix(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let name = format!("{}{}", call.value(0)?, call.raw(1));
    let target = lookup_indirect(call, name)?;
    call.expand_nested(&target)
}

fn lookup_indirect(call: &Call<'_, '_>, name: String) -> Result<String, MacroError> {
    match call.vars().get(&name) {
        Some(value) => Ok(value.to_string()),
        None => Err(MacroError::MissingIndirect { name }),
    }
}

fn is_present(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    match call.vars().get(call.raw(0)) {
        Some(value) => Ok(flag(contains_ignore_case(value, &call.value(1)?))),
        None if call.len() == 3 => Ok(call.value_or_literal(2)),
        None => Ok(flag(false)),
    }
}
