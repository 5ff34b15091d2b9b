//! Call parameters and the per-position kinds a function declares.

use crate::variables::Variables;

/// One argument of a function call, classified at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// Quoted text, a `$var` substitution or a nested call result.
    /// Already expanded; never looked up again.
    Literal(String),
    /// A bare token. Depending on the parameter kind this names a
    /// variable or stands for itself.
    VariableRef(String),
}

impl Param {
    /// The text as written (the token, or the literal's content).
    pub fn raw(&self) -> &str {
        match self {
            Param::Literal(s) | Param::VariableRef(s) => s,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Param::Literal(_))
    }
}

/// What a function accepts at one parameter position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Bare name of a variable that must exist.
    Var,
    /// Bare name of a variable that may not exist yet.
    VarName,
    /// Existing variable or quoted text.
    VarOrText,
    /// Bare name (not checked) or quoted text.
    NameOrText,
    /// Bare token taken as is.
    Literal,
    /// Bare token or quoted text, taken as is.
    LiteralOrText,
    /// Bare token: the variable's value if it exists, else the token.
    ValueOrLiteral,
    /// As `ValueOrLiteral`, or quoted text.
    ValueOrLiteralOrText,
}

impl ParamKind {
    /// Check one parameter against this kind. Returns the problem text
    /// when the parameter does not fit.
    pub fn check(self, param: &Param, vars: &Variables) -> Result<(), String> {
        match (self, param) {
            (ParamKind::Var, Param::VariableRef(name))
            | (ParamKind::VarOrText, Param::VariableRef(name)) => {
                if vars.exists(name) {
                    Ok(())
                } else {
                    Err(format!("variable '{}' does not exist", name))
                }
            }
            (ParamKind::Var, Param::Literal(_))
            | (ParamKind::VarName, Param::Literal(_))
            | (ParamKind::Literal, Param::Literal(_))
            | (ParamKind::ValueOrLiteral, Param::Literal(_)) => {
                Err(format!("expected {}, not a string", self.describe()))
            }
            _ => Ok(()),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ParamKind::Var => "an existing variable name",
            ParamKind::VarName => "a variable name",
            ParamKind::VarOrText => "an existing variable or a string",
            ParamKind::NameOrText => "a name or a string",
            ParamKind::Literal => "a literal",
            ParamKind::LiteralOrText => "a literal or a string",
            ParamKind::ValueOrLiteral => "a variable or a literal",
            ParamKind::ValueOrLiteralOrText => "a variable, a literal or a string",
        }
    }
}
