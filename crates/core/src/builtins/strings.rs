//! String built-ins.

use regex::{Regex, RegexBuilder};

use crate::builtins::int_arg;
use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef, MAX_PARAMS};
use crate::param::ParamKind::*;
use crate::text::{self, char_index_of, contains_ignore_case, replace_ignore_case};

const NOT_AN_INTEGER: &str =
    "Parameter should be an integer constant or a variable name with an integer in its value";

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "alt",
        alt,
        2,
        MAX_PARAMS,
        &[VarOrText],
        Category::Strings,
        "First non-empty value",
    ),
    FuncDef::new(
        "escapechar",
        escape_char,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Render control characters as \\n, \\r, \\t",
    ),
    FuncDef::new(
        "replaceescapechar",
        replace_escape_char,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Turn \\n, \\r, \\t back into control characters",
    ),
    FuncDef::new(
        "indexof",
        index_of,
        2,
        2,
        &[VarOrText],
        Category::Strings,
        "Character index of the second value in the first, or -1",
    ),
    FuncDef::new(
        "join",
        join,
        3,
        MAX_PARAMS,
        &[VarOrText],
        Category::Strings,
        "Join values with the first value as separator",
    ),
    FuncDef::new(
        "length",
        length,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Length in characters",
    ),
    FuncDef::new(
        "lower",
        lower,
        1,
        MAX_PARAMS,
        &[VarOrText],
        Category::Strings,
        "Lower case; further values are joined using the second as separator",
    ),
    FuncDef::new(
        "upper",
        upper,
        1,
        MAX_PARAMS,
        &[VarOrText],
        Category::Strings,
        "Upper case; further values are joined using the second as separator",
    ),
    FuncDef::new(
        "phrase",
        phrase,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Pick one of each {a|b} group, or one of a;b alternatives",
    ),
    FuncDef::new(
        "regex",
        regex_replace,
        3,
        3,
        &[VarOrText],
        Category::Strings,
        "Regular expression replace",
    ),
    FuncDef::new(
        "replace",
        replace,
        3,
        3,
        &[VarOrText],
        Category::Strings,
        "Case-insensitive replace",
    ),
    FuncDef::new(
        "replacevar",
        replace_var,
        2,
        2,
        &[VarOrText, ValueOrLiteralOrText],
        Category::Strings,
        "Apply the replacement patterns stored in variables with a prefix",
    )
    .aliases(&["rv"]),
    FuncDef::new(
        "rs",
        replace_var_split_caps,
        2,
        2,
        &[VarOrText, ValueOrLiteralOrText],
        Category::Strings,
        "As replacevar, then split caps",
    ),
    FuncDef::new(
        "splitcaps",
        split_caps,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Split a run-together identifier into words",
    )
    .aliases(&["sc"]),
    FuncDef::new(
        "substring",
        substring,
        3,
        3,
        &[VarOrText, ValueOrLiteralOrText, ValueOrLiteralOrText],
        Category::Strings,
        "Characters from start for length, clipped to the string",
    ),
    FuncDef::new(
        "trim",
        trim,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Strip leading and trailing whitespace",
    ),
    FuncDef::new(
        "wordof",
        word_of,
        2,
        3,
        &[VarOrText, ValueOrLiteralOrText, VarOrText],
        Category::Strings,
        "1-based word, split on the first character of the separator (default ;)",
    ),
    FuncDef::new(
        "wordlistcount",
        word_list_count,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Number of entries in a comma separated, optionally quoted list",
    ),
    FuncDef::new(
        "wordlistentry",
        word_list_entry,
        2,
        2,
        &[VarOrText, ValueOrLiteralOrText],
        Category::Strings,
        "0-based entry of a comma separated, optionally quoted list",
    ),
    FuncDef::new(
        "safevarname",
        safe_var_name,
        1,
        1,
        &[VarOrText],
        Category::Strings,
        "Replace characters not allowed in variable names with _",
    ),
    FuncDef::new(
        "findline",
        find_line,
        2,
        2,
        &[Var, VarOrText],
        Category::Strings,
        "First line of a variable containing the text",
    ),
];

fn alt(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    for i in 0..call.len() {
        let value = call.value(i)?;
        if !value.is_empty() {
            return Ok(value);
        }
    }
    Ok(String::new())
}

fn escape_char(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(text::escape_control(&call.value(0)?))
}

fn replace_escape_char(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(text::unescape_control(&call.value(0)?))
}

fn index_of(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(char_index_of(&call.value(0)?, &call.value(1)?).to_string())
}

/// First value, then each further value prefixed by the second.
fn joined_from_second(call: &Call<'_, '_>) -> Result<String, MacroError> {
    let mut value = call.value(0)?;
    if call.len() > 2 {
        let separator = call.value(1)?;
        for i in 2..call.len() {
            value.push_str(&separator);
            value.push_str(&call.value(i)?);
        }
    }
    Ok(value)
}

fn join(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let separator = call.value(0)?;
    let parts = (1..call.len())
        .map(|i| call.value(i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join(&separator))
}

fn length(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(call.value(0)?.chars().count().to_string())
}

fn lower(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(joined_from_second(call)?.to_lowercase())
}

fn upper(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(joined_from_second(call)?.to_uppercase())
}

fn phrase(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let value = call.value(0)?;
    Ok(text::pick_one_of_groups(&value, call.rng()))
}

fn regex_replace(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let value = call.value(0)?;
    let pattern = call.value(1)?;
    let replacement = call.value(2)?;
    let re = Regex::new(&pattern).map_err(|_| MacroError::failed("Regular expression failed"))?;
    Ok(re.replace_all(&value, replacement.as_str()).into_owned())
}

fn replace(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(replace_ignore_case(
        &call.value(0)?,
        &call.value(1)?,
        &call.value(2)?,
    ))
}

/// Every variable whose name starts with the root holds either
/// `find;replace` (case-insensitive) or `R;pattern;replacement`
/// (`r` for a case-insensitive regex). Patterns apply in name order.
fn apply_replacements(call: &Call<'_, '_>) -> Result<String, MacroError> {
    let mut value = call.value(0)?;
    let root = call.value_or_literal(1);

    for (_, pattern) in call.vars().with_prefix(&root) {
        let subs: Vec<&str> = pattern.split(';').collect();
        match subs.as_slice() {
            [find, with] if !find.is_empty() => {
                value = replace_ignore_case(&value, find, with);
            }
            [kind, re, with] if !re.is_empty() && kind.eq_ignore_ascii_case("r") => {
                let re = RegexBuilder::new(re)
                    .case_insensitive(*kind == "r")
                    .build()
                    .map_err(|_| MacroError::failed("Regular expression failed"))?;
                value = re.replace_all(&value, *with).into_owned();
            }
            _ => {
                return Err(MacroError::failed(format!(
                    "Malformed replacement pattern: {}",
                    pattern
                )))
            }
        }
    }
    Ok(value)
}

fn replace_var(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    apply_replacements(call)
}

fn replace_var_split_caps(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(text::split_caps(&apply_replacements(call)?))
}

fn split_caps(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(text::split_caps(&call.value(0)?))
}

fn substring(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    const MESSAGE: &str = "Start and/or length are not integers or variables do not exist";
    let start = int_arg(call, 1, MESSAGE)?;
    let length = int_arg(call, 2, MESSAGE)?;
    let value = call.value(0)?;

    if start < 0 || length <= 0 {
        return Ok(String::new());
    }
    Ok(value
        .chars()
        .skip(start as usize)
        .take(length as usize)
        .collect())
}

fn trim(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(call.value(0)?.trim().to_string())
}

fn word_of(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let value = call.value(0)?;
    let index = int_arg(call, 1, NOT_AN_INTEGER)?;
    let separator = call
        .opt_value(2)?
        .and_then(|s| s.chars().next())
        .unwrap_or(';');

    let words: Vec<&str> = value.split(separator).collect();
    let index = index.clamp(1, words.len() as i64) as usize;
    Ok(words[index - 1].to_string())
}

fn word_list_count(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(text::quoted_word_list(&call.value(0)?).len().to_string())
}

fn word_list_entry(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let list = text::quoted_word_list(&call.value(0)?);
    let index = int_arg(call, 1, NOT_AN_INTEGER)?;
    Ok(usize::try_from(index)
        .ok()
        .and_then(|i| list.get(i).cloned())
        .unwrap_or_default())
}

fn safe_var_name(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(text::safe_var_name(&call.value(0)?))
}

fn find_line(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let haystack = call.value(0)?;
    let needle = call.value(1)?;
    Ok(haystack
        .lines()
        .find(|line| contains_ignore_case(line, &needle))
        .unwrap_or_default()
        .to_string())
}
