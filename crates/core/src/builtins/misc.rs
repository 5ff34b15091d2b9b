//! Miscellaneous built-ins.

use crate::builtins::flag;
use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef};
use crate::param::ParamKind::*;

pub(crate) const FUNCTIONS: &[FuncDef] = &[FuncDef::new(
    "jsonparse",
    json_parse,
    2,
    2,
    &[VarOrText],
    Category::Misc,
    "Flatten JSON into variables under a prefix",
)];

fn json_parse(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let json = call.value(0)?;
    let prefix = call.value(1)?;
    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|err| MacroError::failed(format!("JSON is not valid: {}", err)))?;
    call.vars_mut().add_json(&value, &prefix);
    Ok(flag(true))
}
