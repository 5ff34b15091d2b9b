//! Culture-invariant number parsing and formatting.
//!
//! Formatting follows the .NET format-string conventions scripts were
//! written against: standard `N`/`F`/`D`/`G`/`X`/`E`/`P` specifiers and
//! custom `0`/`#`/`.`/`,` patterns. Rounding goes through
//! `rust_decimal` so that decimal midpoints behave predictably.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::MacroError;

// ──────────────────────────────────────────────
// Parsing
// ──────────────────────────────────────────────

/// Parse a finite float. No thousands separators, no `inf`/`nan`.
pub fn parse_f64(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i64(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok()
}

pub fn parse_i32(s: &str) -> Option<i32> {
    s.trim().parse::<i32>().ok()
}

// ──────────────────────────────────────────────
// Formatting
// ──────────────────────────────────────────────

/// Shortest round-trip representation.
pub fn shortest(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{}", v)
    }
}

/// Format a float with a .NET-style format string; empty means shortest.
pub fn format_f64(v: f64, fmt: &str) -> Result<String, MacroError> {
    if fmt.is_empty() {
        return Ok(shortest(v));
    }
    format_decimal(Decimal::from_f64(v), v, fmt, false)
}

/// Format an integer with a .NET-style format string; empty means plain.
pub fn format_i64(v: i64, fmt: &str) -> Result<String, MacroError> {
    if fmt.is_empty() {
        return Ok(v.to_string());
    }
    format_decimal(Some(Decimal::from(v)), v as f64, fmt, true)
}

fn bad_format() -> MacroError {
    MacroError::invalid("Format is incorrect")
}

/// `d` is `None` when `approx` lies outside the `Decimal` range.
fn format_decimal(
    d: Option<Decimal>,
    approx: f64,
    fmt: &str,
    integral: bool,
) -> Result<String, MacroError> {
    let mut chars = fmt.chars();
    let Some(letter) = chars.next() else {
        return Err(bad_format());
    };
    let rest = chars.as_str();

    if letter.is_ascii_alphabetic() && rest.len() <= 2 && rest.chars().all(|c| c.is_ascii_digit()) {
        let precision: Option<u32> = rest.parse().ok();
        return match letter.to_ascii_uppercase() {
            'N' => Ok(render(d, approx, &Pattern::grouped(precision.unwrap_or(2)))),
            'F' => Ok(render(d, approx, &Pattern::fixed(precision.unwrap_or(2)))),
            'P' => {
                let scaled = d.and_then(|d| d.checked_mul(Decimal::ONE_HUNDRED));
                let mut pattern = Pattern::grouped(precision.unwrap_or(2));
                pattern.suffix = " %".to_string();
                Ok(render(scaled, approx * 100.0, &pattern))
            }
            'D' if integral => {
                let d = d.ok_or_else(bad_format)?;
                let width = precision.unwrap_or(0) as usize;
                let digits = d.abs().trunc().to_string();
                let sign = if d.is_sign_negative() && !d.is_zero() { "-" } else { "" };
                Ok(format!("{}{:0>width$}", sign, digits, width = width))
            }
            'X' if integral => {
                let v = d.and_then(|d| d.to_i64()).ok_or_else(bad_format)?;
                let width = precision.unwrap_or(0) as usize;
                if letter == 'x' {
                    Ok(format!("{:0>width$x}", v, width = width))
                } else {
                    Ok(format!("{:0>width$X}", v, width = width))
                }
            }
            'G' => match precision {
                None | Some(0) => Ok(shortest(approx)),
                Some(p) => {
                    let text = format!("{:.*e}", (p - 1) as usize, approx);
                    let v: f64 = text.parse().map_err(|_| bad_format())?;
                    Ok(shortest(v))
                }
            },
            'E' => Ok(scientific(approx, precision.unwrap_or(6) as usize, letter)),
            _ => Err(bad_format()),
        };
    }

    let pattern = Pattern::parse(fmt).ok_or_else(bad_format)?;
    Ok(render(d, approx, &pattern))
}

/// .NET `E` layout: `d.ddddddE+ddd`.
fn scientific(v: f64, precision: usize, letter: char) -> String {
    let text = format!("{:.*e}", precision, v);
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exp: i32 = exponent.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}{}{}{:03}", mantissa, letter, sign, exp.abs())
}

/// A custom numeric pattern such as `#,##0.00#` with literal
/// prefix/suffix text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pattern {
    prefix: String,
    suffix: String,
    min_int: usize,
    min_frac: u32,
    max_frac: u32,
    grouping: bool,
}

impl Pattern {
    fn grouped(decimals: u32) -> Self {
        Pattern {
            prefix: String::new(),
            suffix: String::new(),
            min_int: 1,
            min_frac: decimals,
            max_frac: decimals,
            grouping: true,
        }
    }

    fn fixed(decimals: u32) -> Self {
        Pattern {
            grouping: false,
            ..Pattern::grouped(decimals)
        }
    }

    fn parse(fmt: &str) -> Option<Self> {
        let first = fmt.find(|c| matches!(c, '0' | '#' | '.'))?;
        let last = fmt.rfind(|c| matches!(c, '0' | '#'))?;
        if last < first {
            return None;
        }
        let body = &fmt[first..=last];
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
        if frac_part.contains('.') {
            return None;
        }
        let min_frac = frac_part.chars().filter(|c| *c == '0').count() as u32;
        let max_frac = frac_part.chars().filter(|c| matches!(c, '0' | '#')).count() as u32;
        Some(Pattern {
            prefix: fmt[..first].to_string(),
            suffix: fmt[last + 1..].to_string(),
            min_int: int_part.chars().filter(|c| *c == '0').count(),
            min_frac,
            max_frac,
            grouping: int_part.contains(','),
        })
    }
}

/// Lay out `value` per `pattern`. Without a `Decimal` the magnitude is
/// beyond 2^96, where an `f64` carries no fraction, so its plain digits
/// are exact enough.
fn render(value: Option<Decimal>, approx: f64, pattern: &Pattern) -> String {
    let (negative, text) = match value {
        Some(d) => {
            let rounded =
                d.round_dp_with_strategy(pattern.max_frac, RoundingStrategy::MidpointAwayFromZero);
            (rounded.is_sign_negative() && !rounded.is_zero(), rounded.abs().to_string())
        }
        None => (approx < 0.0, format!("{}", approx.abs())),
    };
    let (int_digits, frac_digits) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut frac = frac_digits.to_string();
    while frac.len() > pattern.min_frac as usize && frac.ends_with('0') {
        frac.pop();
    }
    while frac.len() < pattern.min_frac as usize {
        frac.push('0');
    }

    let mut int = if int_digits == "0" {
        String::new()
    } else {
        int_digits.to_string()
    };
    while int.len() < pattern.min_int {
        int.insert(0, '0');
    }
    if pattern.grouping {
        int = group_thousands(&int);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&pattern.prefix);
    out.push_str(&int);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out.push_str(&pattern.suffix);
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ──────────────────────────────────────────────
// Rounding and human-scale numbers
// ──────────────────────────────────────────────

/// Round to `digits` decimals, midpoints to even. Values outside the
/// `Decimal` range are already integral and come back unchanged.
pub fn round_half_even(value: f64, digits: u32) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(digits, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Human-scale rendering. `words` is at least six entries: negative
/// prefix, then trillion, billion, million, thousand, hundred.
pub fn hnum(value: f64, words: &[&str]) -> Result<String, MacroError> {
    if words.len() < 6 {
        return Err(MacroError::invalid("Need prefixes and postfixes"));
    }

    let mut value = value;
    let mut prefix = String::new();
    if value < 0.0 {
        prefix = format!("{} ", words[0]);
        value = -value;
    }

    let order = value.log10() as i32;
    let text = if order >= 12 {
        format!("{}{} {}", prefix, format_f64(value / 1e12, "0.##")?, words[1])
    } else if order >= 9 {
        format!("{}{} {}", prefix, format_f64(value / 1e9, "0.##")?, words[2])
    } else if order >= 6 {
        format!("{}{} {}", prefix, format_f64(value / 1e6, "0.##")?, words[3])
    } else if order >= 4 {
        format!("{}{} {}", prefix, format_f64(value / 1e3, "0")?, words[4])
    } else if order == 3 {
        let hundreds = (value / 1e2) as i64;
        let mut out = format!("{}{} {}", prefix, hundreds / 10, words[4]);
        if hundreds % 10 != 0 {
            out.push_str(&format!(" {} {}", hundreds % 10, words[5]));
        }
        out
    } else {
        format!("{}{}", prefix, shortest(value))
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: [&str; 6] = ["neg", "T", "B", "M", "K", "H"];

    #[test]
    fn invariant_parsing() {
        assert_eq!(parse_f64(" 1.5 "), Some(1.5));
        assert_eq!(parse_f64("-2e3"), Some(-2000.0));
        assert_eq!(parse_f64("1,5"), None);
        assert_eq!(parse_f64("inf"), None);
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_i64("42"), Some(42));
        assert_eq!(parse_i64("12.5"), None);
        assert_eq!(parse_i64("9223372036854775807"), Some(i64::MAX));
    }

    #[test]
    fn shortest_round_trip() {
        assert_eq!(shortest(1.5), "1.5");
        assert_eq!(shortest(100.0), "100");
        assert_eq!(shortest(-0.0), "0");
    }

    #[test]
    fn standard_formats() {
        assert_eq!(format_f64(1234.5678, "N").unwrap(), "1,234.57");
        assert_eq!(format_f64(1234.5678, "N0").unwrap(), "1,235");
        assert_eq!(format_f64(-0.5, "F1").unwrap(), "-0.5");
        assert_eq!(format_f64(2.5, "F0").unwrap(), "3");
        assert_eq!(format_f64(0.256, "P1").unwrap(), "25.6 %");
        assert_eq!(format_f64(1234.5, "E2").unwrap(), "1.23E+003");
        assert_eq!(format_i64(42, "D5").unwrap(), "00042");
        assert_eq!(format_i64(-42, "D5").unwrap(), "-00042");
        assert_eq!(format_i64(255, "X4").unwrap(), "00FF");
        assert_eq!(format_i64(255, "x").unwrap(), "ff");
        assert!(format_f64(1.5, "D").is_err());
        assert!(format_f64(1.5, "Q2").is_err());
    }

    #[test]
    fn magnitudes_beyond_decimal_range() {
        assert_eq!(
            format_f64(1e30, "0.00").unwrap(),
            "1000000000000000000000000000000.00"
        );
        assert_eq!(format_f64(-1e30, "0").unwrap(), "-1000000000000000000000000000000");
        assert_eq!(
            format_f64(1e30, "N0").unwrap(),
            "1,000,000,000,000,000,000,000,000,000,000"
        );
        assert_eq!(format_f64(1e30, "E2").unwrap(), "1.00E+030");
        assert_eq!(round_half_even(1e30, 2), 1e30);
        let text = hnum(1e41, &WORDS).unwrap();
        let (number, unit) = text.split_once(' ').unwrap();
        assert_eq!(unit, "T");
        assert!((number.parse::<f64>().unwrap() / 1e29 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn custom_patterns() {
        assert_eq!(format_f64(1.5, "0.##").unwrap(), "1.5");
        assert_eq!(format_f64(1.0, "0.##").unwrap(), "1");
        assert_eq!(format_f64(1.005, "0.00").unwrap(), "1.01");
        assert_eq!(format_f64(0.5, "#.00").unwrap(), ".50");
        assert_eq!(format_f64(1234567.0, "#,##0").unwrap(), "1,234,567");
        assert_eq!(format_f64(-3.14159, "$0.000 cr").unwrap(), "-$3.142 cr");
        assert_eq!(format_f64(7.0, "000").unwrap(), "007");
        assert!(format_f64(7.0, "abc").is_err());
    }

    #[test]
    fn banker_rounding() {
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(3.5, 0), 4.0);
        assert_eq!(round_half_even(1.2345, 2), 1.23);
        assert_eq!(round_half_even(0.0004, 2), 0.0);
    }

    #[test]
    fn human_scale_numbers() {
        assert_eq!(hnum(1_500_000.0, &WORDS).unwrap(), "1.5 M");
        assert_eq!(hnum(-2500.0, &WORDS).unwrap(), "neg 2 K 5 H");
        assert_eq!(hnum(3000.0, &WORDS).unwrap(), "3 K");
        assert_eq!(hnum(45_600.0, &WORDS).unwrap(), "46 K");
        assert_eq!(hnum(2.25e9, &WORDS).unwrap(), "2.25 B");
        assert_eq!(hnum(7e12, &WORDS).unwrap(), "7 T");
        assert_eq!(hnum(512.0, &WORDS).unwrap(), "512");
        assert_eq!(hnum(0.0, &WORDS).unwrap(), "0");
        assert!(hnum(1.0, &WORDS[..5]).is_err());
    }
}
