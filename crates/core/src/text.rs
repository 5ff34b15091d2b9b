//! String helpers shared by the string and array built-ins.

use rand::Rng;
use regex::{NoExpand, Regex};

/// Split a run-together identifier into words: `_` becomes a space, and
/// a space is inserted at lower→upper, letter↔digit and `ABc` boundaries.
pub fn split_caps(s: &str) -> String {
    let chars: Vec<char> = s.chars().map(|c| if c == '_' { ' ' } else { c }).collect();
    let mut out = String::with_capacity(s.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && !out.ends_with(' ') && c != ' ' {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_ascii_digit())
                || (prev.is_ascii_digit() && c.is_alphabetic())
                || (prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(|n| n.is_lowercase()));
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Render control characters as backslash escapes.
pub fn escape_control(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_control`].
pub fn unescape_control(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let replacement = match chars.peek() {
                Some('n') => Some('\n'),
                Some('r') => Some('\r'),
                Some('t') => Some('\t'),
                _ => None,
            };
            if let Some(r) = replacement {
                chars.next();
                out.push(r);
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Replace anything outside `[A-Za-z0-9_]` with `_`.
pub fn safe_var_name(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Parse `a, "b c", d` into its entries. Quotes group text containing
/// commas; `\"` inside quotes is a literal quote.
pub fn quoted_word_list(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = s.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut word = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '\\' if chars.peek() == Some(&'"') => {
                        chars.next();
                        word.push('"');
                    }
                    '"' => break,
                    c => word.push(c),
                }
            }
            while chars.peek().is_some_and(|c| *c != ',') {
                chars.next();
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                word.push(c);
                chars.next();
            }
            word = word.trim_end().to_string();
        }
        words.push(word);

        if chars.next().is_none() {
            break;
        }
    }
    words
}

/// Pick one alternative out of each `{a|b|c}` group, or out of the whole
/// string split on `;` when it has no groups.
pub fn pick_one_of_groups<R: Rng>(s: &str, rng: &mut R) -> String {
    if !s.contains('{') {
        let options: Vec<&str> = s.split(';').collect();
        return options[rng.gen_range(0..options.len())].to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let options: Vec<&str> = after[..close].split('|').collect();
                out.push_str(options[rng.gen_range(0..options.len())]);
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Case-insensitive literal replace.
pub fn replace_ignore_case(s: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return s.to_string();
    }
    match Regex::new(&format!("(?i){}", regex::escape(from))) {
        Ok(re) => re.replace_all(s, NoExpand(to)).into_owned(),
        Err(_) => s.replace(from, to),
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Char-based index of `needle` in `haystack`, or -1.
pub fn char_index_of(haystack: &str, needle: &str) -> i64 {
    match haystack.find(needle) {
        Some(byte) => haystack[..byte].chars().count() as i64,
        None => -1,
    }
}
