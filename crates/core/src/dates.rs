//! Date parsing, printing and delta formatting for the date built-ins.
//!
//! Parsed values are normalized to UTC. Input without an offset is taken
//! as UTC unless the options contain `local`, in which case the host's
//! local offset applies.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::MacroError;

/// `true` if the `;`-separated option list contains `name`.
pub fn has_option(options: &str, name: &str) -> bool {
    options
        .split(';')
        .any(|o| o.trim().eq_ignore_ascii_case(name))
}

/// The host's offset, or UTC when it cannot be determined.
pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Parse en-US (`M/d/yyyy [h:mm[:ss] AM|H:mm[:ss]]`), ISO
/// (`yyyy-MM-dd[ HH:mm:ss]`) or RFC 3339 text.
pub fn parse_date(value: &str, options: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(dt.to_offset(UtcOffset::UTC));
    }

    let offset = if has_option(options, "local") {
        local_offset()
    } else {
        UtcOffset::UTC
    };

    let with_time = [
        format_description!(
            "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period case_sensitive:false]"
        ),
        format_description!(
            "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute] [period case_sensitive:false]"
        ),
        format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]:[second]"),
        format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ];
    let date_only = [
        format_description!("[month padding:none]/[day padding:none]/[year]"),
        format_description!("[year]-[month]-[day]"),
    ];

    let parsed = with_time
        .iter()
        .find_map(|f| PrimitiveDateTime::parse(value, *f).ok())
        .or_else(|| {
            date_only
                .iter()
                .find_map(|f| Date::parse(value, *f).ok())
                .map(Date::midnight)
        })?;

    Some(parsed.assume_offset(offset).to_offset(UtcOffset::UTC))
}

/// Print a date. Options: `longdate`, `shortdate`, `longtime`,
/// `shorttime`, `iso`/`sortable`, `local`; the default is
/// `M/d/yyyy h:mm:ss AM`.
pub fn print_date(dt: OffsetDateTime, options: &str) -> Result<String, MacroError> {
    let dt = if has_option(options, "local") {
        dt.to_offset(local_offset())
    } else {
        dt
    };
    let bad = |e: time::error::Format| MacroError::invalid(format!("Date cannot be printed: {}", e));

    if has_option(options, "iso") || has_option(options, "sortable") {
        return dt
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
            .map_err(bad);
    }

    let mut parts = Vec::new();
    if has_option(options, "longdate") {
        parts.push(
            dt.format(format_description!(
                "[weekday], [month repr:long] [day padding:none], [year]"
            ))
            .map_err(bad)?,
        );
    } else if has_option(options, "shortdate") {
        parts.push(
            dt.format(format_description!("[month padding:none]/[day padding:none]/[year]"))
                .map_err(bad)?,
        );
    }
    if has_option(options, "longtime") {
        parts.push(
            dt.format(format_description!(
                "[hour repr:12 padding:none]:[minute]:[second] [period]"
            ))
            .map_err(bad)?,
        );
    } else if has_option(options, "shorttime") {
        parts.push(
            dt.format(format_description!("[hour repr:12 padding:none]:[minute] [period]"))
                .map_err(bad)?,
        );
    }

    if parts.is_empty() {
        return dt
            .format(format_description!(
                "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period]"
            ))
            .map_err(bad);
    }
    Ok(parts.join(" "))
}

/// `before + span` for non-negative deltas, `span + after` otherwise.
pub fn delta_format(seconds: f64, before: &str, after: &str) -> String {
    let span = span_text(seconds.abs());
    if seconds >= 0.0 {
        format!("{}{}", before, span)
    } else {
        format!("{}{}", span, after)
    }
}

/// The two most significant non-zero units, e.g. `2 days 3 hours`.
fn span_text(seconds: f64) -> String {
    let total = seconds.round() as u64;
    let units = [
        (total / 86_400, "day"),
        ((total / 3_600) % 24, "hour"),
        ((total / 60) % 60, "minute"),
        (total % 60, "second"),
    ];

    let Some(first) = units.iter().position(|(n, _)| *n > 0) else {
        return "0 seconds".to_string();
    };

    let mut words = vec![unit_text(units[first])];
    if let Some(next) = units.get(first + 1).filter(|(n, _)| *n > 0) {
        words.push(unit_text(*next));
    }
    words.join(" ")
}

fn unit_text((n, unit): (u64, &str)) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn en_us_and_iso_forms_parse_as_utc() {
        let expected = datetime!(2024-03-05 14:07:09 UTC);
        assert_eq!(parse_date("3/5/2024 2:07:09 PM", ""), Some(expected));
        assert_eq!(parse_date("3/5/2024 2:07:09 pm", ""), Some(expected));
        assert_eq!(parse_date("3/5/2024 14:07:09", ""), Some(expected));
        assert_eq!(parse_date("2024-03-05 14:07:09", ""), Some(expected));
        assert_eq!(parse_date("2024-03-05T14:07:09Z", ""), Some(expected));
        assert_eq!(
            parse_date("2024-03-05T16:07:09+02:00", ""),
            Some(expected)
        );
        assert_eq!(
            parse_date("3/5/2024", ""),
            Some(datetime!(2024-03-05 0:00 UTC))
        );
        assert_eq!(parse_date("5th of March", ""), None);
    }

    #[test]
    fn printing_options() {
        let dt = datetime!(2024-03-05 14:07:09 UTC);
        assert_eq!(print_date(dt, "").unwrap(), "3/5/2024 2:07:09 PM");
        assert_eq!(print_date(dt, "shortdate").unwrap(), "3/5/2024");
        assert_eq!(print_date(dt, "longdate").unwrap(), "Tuesday, March 5, 2024");
        assert_eq!(print_date(dt, "shorttime").unwrap(), "2:07 PM");
        assert_eq!(print_date(dt, "shortdate;longtime").unwrap(), "3/5/2024 2:07:09 PM");
        assert_eq!(print_date(dt, "ISO").unwrap(), "2024-03-05T14:07:09");
    }

    #[test]
    fn deltas_use_two_largest_units() {
        assert_eq!(delta_format(3725.0, "in ", " ago"), "in 1 hour 2 minutes");
        assert_eq!(delta_format(-2.0 * 86_400.0, "in ", " ago"), "2 days ago");
        assert_eq!(delta_format(45.0, "", ""), "45 seconds");
        assert_eq!(delta_format(0.0, "in ", ""), "in 0 seconds");
        assert_eq!(delta_format(90_061.0, "", ""), "1 day 1 hour");
    }
}
