//! Date and time built-ins.

use time::OffsetDateTime;

use crate::dates::{delta_format, parse_date, print_date};
use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef};
use crate::numeric::{parse_f64, shortest};
use crate::param::ParamKind::*;

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "date",
        date,
        2,
        2,
        &[VarOrText, LiteralOrText],
        Category::Dates,
        "Reprint a date using the print options",
    ),
    FuncDef::new(
        "datetimenow",
        date_time_now,
        1,
        1,
        &[LiteralOrText],
        Category::Dates,
        "Current UTC time using the print options",
    ),
    FuncDef::new(
        "datedelta",
        date_delta,
        2,
        3,
        &[VarOrText, VarOrText, LiteralOrText],
        Category::Dates,
        "Seconds from the first date to the second",
    ),
    FuncDef::new(
        "datedeltaformat",
        date_delta_format,
        3,
        3,
        &[ValueOrLiteralOrText, VarOrText, VarOrText],
        Category::Dates,
        "Describe a number of seconds as a span with before/after text",
    ),
    FuncDef::new(
        "datedeltaformatnow",
        date_delta_format_now,
        3,
        4,
        &[VarOrText, VarOrText, VarOrText, LiteralOrText],
        Category::Dates,
        "Describe the span from now to a date",
    ),
    FuncDef::new(
        "datedeltadiffformat",
        date_delta_diff_format,
        4,
        5,
        &[VarOrText, VarOrText, VarOrText, VarOrText, LiteralOrText],
        Category::Dates,
        "Describe the span from the first date to the second",
    ),
    FuncDef::new(
        "tickcount",
        tick_count,
        0,
        0,
        &[],
        Category::Dates,
        "Milliseconds since the session started",
    ),
];

/// Print options for positional parameter `i`, empty when absent.
fn options(call: &Call<'_, '_>, i: usize) -> String {
    if i < call.len() {
        call.raw(i).to_string()
    } else {
        String::new()
    }
}

fn parse_param(call: &Call<'_, '_>, i: usize, options: &str, message: &str) -> Result<OffsetDateTime, MacroError> {
    parse_date(&call.value(i)?, options).ok_or_else(|| MacroError::invalid(message))
}

fn date(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let opts = options(call, 1);
    let dt = parse_param(call, 0, &opts, "Date is not in correct en-US format")?;
    print_date(dt, &opts)
}

fn date_time_now(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    print_date(OffsetDateTime::now_utc(), &options(call, 0))
}

fn date_delta(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let opts = options(call, 2);
    let from = parse_param(call, 0, &opts, "A Date is not in correct en-US format")?;
    let to = parse_param(call, 1, &opts, "A Date is not in correct en-US format")?;
    Ok(shortest((to - from).as_seconds_f64()))
}

fn date_delta_format(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let seconds = parse_f64(&call.value_or_literal(0))
        .ok_or_else(|| MacroError::invalid("Time difference is not a number"))?;
    Ok(delta_format(seconds, &call.value(1)?, &call.value(2)?))
}

fn date_delta_format_now(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let opts = options(call, 3);
    let target = parse_param(call, 0, &opts, "Not a valid date")?;
    let seconds = (target - OffsetDateTime::now_utc()).as_seconds_f64();
    Ok(delta_format(seconds, &call.value(1)?, &call.value(2)?))
}

fn date_delta_diff_format(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let opts = options(call, 4);
    let from = parse_param(call, 0, &opts, "Not a valid date")?;
    let to = parse_param(call, 1, &opts, "Not a valid date")?;
    let seconds = (to - from).as_seconds_f64();
    Ok(delta_format(seconds, &call.value(2)?, &call.value(3)?))
}

fn tick_count(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    Ok(call.elapsed().as_millis().to_string())
}
