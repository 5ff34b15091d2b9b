//! Pseudo-arrays: variables named `root[1]`, `root[2]`, ... or sharing a
//! common name prefix.

use crate::builtins::int_arg;
use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef};
use crate::param::ParamKind::*;
use crate::text::{contains_ignore_case, split_caps};

const BAD_WINDOW: &str = "Start and/or length are not integers or variables do not exist";

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "expandarray",
        expand_array,
        4,
        5,
        &[
            NameOrText,
            VarOrText,
            ValueOrLiteralOrText,
            ValueOrLiteralOrText,
            LiteralOrText,
        ],
        Category::Arrays,
        "Join root[start] .. root[start+length-1], stopping at the first gap",
    ),
    FuncDef::new(
        "expandvars",
        expand_vars,
        4,
        5,
        &[
            NameOrText,
            VarOrText,
            ValueOrLiteralOrText,
            ValueOrLiteralOrText,
            LiteralOrText,
        ],
        Category::Arrays,
        "Join a 1-based window of the variables starting with root",
    ),
    FuncDef::new(
        "findarray",
        find_array,
        2,
        3,
        &[NameOrText, VarOrText, VarOrText],
        Category::Arrays,
        "Name of the first root-prefixed variable containing the text",
    ),
];

struct Window {
    root: String,
    separator: String,
    start: i64,
    length: i64,
    options: String,
}

impl Window {
    fn read(call: &Call<'_, '_>) -> Result<Self, MacroError> {
        Ok(Window {
            root: call.raw(0).to_string(),
            separator: call.value(1)?,
            start: int_arg(call, 2, BAD_WINDOW)?,
            length: int_arg(call, 3, BAD_WINDOW)?,
            options: if call.len() == 5 {
                call.raw(4).to_string()
            } else {
                String::new()
            },
        })
    }

    fn has(&self, option: &str) -> bool {
        contains_ignore_case(&self.options, option)
    }

    fn contains(&self, index: i64) -> bool {
        index >= self.start && index < self.start.saturating_add(self.length)
    }
}

fn expand_array(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let w = Window::read(call)?;
    let splitcaps = w.has("splitcaps");

    let mut entries = Vec::new();
    let mut index = w.start;
    while w.contains(index) {
        match call.vars().get(&format!("{}[{}]", w.root, index)) {
            Some(value) if splitcaps => entries.push(split_caps(value)),
            Some(value) => entries.push(value.to_string()),
            None => break,
        }
        index += 1;
    }
    Ok(entries.join(&w.separator))
}

fn expand_vars(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let w = Window::read(call)?;
    let splitcaps = w.has("splitcaps");
    let name_only = w.has("nameonly");
    let value_only = w.has("valueonly");

    let entries: Vec<String> = call
        .vars()
        .with_prefix(&w.root)
        .zip(1i64..)
        .filter(|(_, index)| w.contains(*index))
        .map(|((name, value), _)| {
            let suffix = &name[w.root.len()..];
            let entry = if value_only {
                value.to_string()
            } else if name_only {
                suffix.to_string()
            } else {
                format!("{} = {}", suffix, value)
            };
            if splitcaps {
                split_caps(&entry)
            } else {
                entry
            }
        })
        .collect();
    Ok(entries.join(&w.separator))
}

fn find_array(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let root = call.raw(0).to_string();
    let search = call.value(1)?;
    let after = call.opt_value(2)?.unwrap_or_default();

    let mut searching = after.is_empty();
    for (name, value) in call.vars().with_prefix(&root) {
        if searching {
            if contains_ignore_case(value, &search) {
                return Ok(name.to_string());
            }
        } else if name == after {
            searching = true;
        }
    }
    Ok(String::new())
}
