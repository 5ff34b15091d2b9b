//! Arithmetic expression evaluator behind `%eval`.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := number | '(' expr ')'
//! ```
//!
//! Integers stay integers while every operation is exact; anything else
//! promotes to floating point.

use crate::numeric::shortest;

/// Parentheses and unary signs nested deeper than this are refused.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("Divide by zero")]
    DivideByZero,

    #[error("Missing expression")]
    Empty,

    #[error("Unexpected '{0}' in expression")]
    Unexpected(char),

    #[error("Missing ) in expression")]
    MissingParen,

    #[error("Number '{0}' is not valid")]
    BadNumber(String),

    #[error("Expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }

    pub fn render(self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Float(f) => shortest(f),
        }
    }
}

/// Evaluate `expr` and render the result.
pub fn evaluate(expr: &str) -> Result<String, EvalError> {
    let mut p = Parser {
        src: expr.as_bytes(),
        text: expr,
        pos: 0,
        nesting: 0,
    };
    p.skip_ws();
    if p.peek().is_none() {
        return Err(EvalError::Empty);
    }
    let value = p.expr()?;
    p.skip_ws();
    match p.peek_char() {
        None => Ok(value.render()),
        Some(c) => Err(EvalError::Unexpected(c)),
    }
}

struct Parser<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
    nesting: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expr(&mut self) -> Result<Value, EvalError> {
        let mut left = self.term()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'+') => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = add(left, right);
                }
                Some(b'-') => {
                    self.pos += 1;
                    let right = self.term()?;
                    left = add(left, negate(right));
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<Value, EvalError> {
        let mut left = self.unary()?;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = multiply(left, right);
                }
                Some(b'/') => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = divide(left, right)?;
                }
                Some(b'%') => {
                    self.pos += 1;
                    let right = self.unary()?;
                    left = remainder(left, right)?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<Value, EvalError> {
        if self.nesting >= MAX_NESTING {
            return Err(EvalError::TooDeep);
        }
        self.nesting += 1;
        let value = self.signed();
        self.nesting -= 1;
        value
    }

    fn signed(&mut self) -> Result<Value, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(negate(self.unary()?))
            }
            Some(b'+') => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Value, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.expr()?;
                self.skip_ws();
                if self.peek() != Some(b')') {
                    return Err(EvalError::MissingParen);
                }
                self.pos += 1;
                Ok(value)
            }
            Some(b) if b.is_ascii_digit() || b == b'.' => self.number(),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
                {
                    self.pos += 1;
                }
                Err(EvalError::UnknownSymbol(self.text[start..self.pos].to_string()))
            }
            Some(_) => Err(EvalError::Unexpected(self.peek_char().unwrap_or('?'))),
            None => Err(EvalError::Empty),
        }
    }

    fn number(&mut self) -> Result<Value, EvalError> {
        let start = self.pos;

        if self.src[self.pos..].starts_with(b"0x") || self.src[self.pos..].starts_with(b"0X") {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits = &self.text[digits_start..self.pos];
            return i64::from_str_radix(digits, 16)
                .map(Value::Int)
                .map_err(|_| EvalError::BadNumber(self.text[start..self.pos].to_string()));
        }

        let mut float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => self.pos += 1,
                b'.' => {
                    float = true;
                    self.pos += 1;
                }
                b'e' | b'E' => {
                    float = true;
                    self.pos += 1;
                    if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }

        let text = &self.text[start..self.pos];
        let bad = || EvalError::BadNumber(text.to_string());
        if float {
            text.parse::<f64>().map(Value::Float).map_err(|_| bad())
        } else {
            match text.parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => text.parse::<f64>().map(Value::Float).map_err(|_| bad()),
            }
        }
    }
}

fn negate(v: Value) -> Value {
    match v {
        Value::Int(i) => i.checked_neg().map_or(Value::Float(-(i as f64)), Value::Int),
        Value::Float(f) => Value::Float(-f),
    }
}

fn add(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x
            .checked_add(y)
            .map_or(Value::Float(x as f64 + y as f64), Value::Int),
        _ => Value::Float(a.as_f64() + b.as_f64()),
    }
}

fn multiply(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x
            .checked_mul(y)
            .map_or(Value::Float(x as f64 * y as f64), Value::Int),
        _ => Value::Float(a.as_f64() * b.as_f64()),
    }
}

fn divide(a: Value, b: Value) -> Result<Value, EvalError> {
    if b.as_f64() == 0.0 {
        return Err(EvalError::DivideByZero);
    }
    Ok(match (a, b) {
        (Value::Int(x), Value::Int(y)) if x.checked_rem(y) == Some(0) => {
            x.checked_div(y).map_or(Value::Float(x as f64 / y as f64), Value::Int)
        }
        _ => Value::Float(a.as_f64() / b.as_f64()),
    })
}

fn remainder(a: Value, b: Value) -> Result<Value, EvalError> {
    if b.as_f64() == 0.0 {
        return Err(EvalError::DivideByZero);
    }
    Ok(match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.checked_rem(y).map_or(Value::Int(0), Value::Int),
        _ => Value::Float(a.as_f64() % b.as_f64()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_nesting_is_refused() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&parens), Err(EvalError::TooDeep));
        assert_eq!(evaluate(&"-".repeat(10_000)), Err(EvalError::TooDeep));
        let ok = format!("{}1{}", "(".repeat(30), ")".repeat(30));
        assert_eq!(evaluate(&ok).unwrap(), "1");
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(evaluate("2*(3+1)").unwrap(), "8");
        assert_eq!(evaluate("10 / 2").unwrap(), "5");
        assert_eq!(evaluate("7 % 3").unwrap(), "1");
        assert_eq!(evaluate("-(2+3)").unwrap(), "-5");
        assert_eq!(evaluate("0x10 + 1").unwrap(), "17");
    }

    #[test]
    fn inexact_results_promote_to_float() {
        assert_eq!(evaluate("7 / 2").unwrap(), "3.5");
        assert_eq!(evaluate("1.5 * 2").unwrap(), "3");
        assert_eq!(evaluate("1e3 + 0.25").unwrap(), "1000.25");
    }

    #[test]
    fn errors_are_reported() {
        assert_eq!(evaluate("1/0").unwrap_err(), EvalError::DivideByZero);
        assert_eq!(evaluate("5 % 0").unwrap_err(), EvalError::DivideByZero);
        assert_eq!(
            evaluate("2*(n+1)").unwrap_err().to_string(),
            "Unknown symbol 'n'"
        );
        assert_eq!(evaluate("(1+2").unwrap_err(), EvalError::MissingParen);
        assert_eq!(evaluate("1 2").unwrap_err(), EvalError::Unexpected('2'));
        assert_eq!(evaluate("  ").unwrap_err(), EvalError::Empty);
    }
}
