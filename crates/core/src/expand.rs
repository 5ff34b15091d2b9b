//! The expansion engine.
//!
//! Text is scanned left to right. `$name` / `$(name)` insert a
//! variable, `%func(...)` calls a built-in, `$$` and `%%` escape the
//! markers. Function parameters are classified here into
//! [`Param::Literal`] (quoted text, `$var`, nested call results) and
//! [`Param::VariableRef`] (bare tokens), then checked against the
//! function's declared kinds before its handler runs.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::error::MacroError;
use crate::function::{FuncDef, FunctionTable};
use crate::host::{AccessPolicy, PersistentData, Permissive};
use crate::param::Param;
use crate::variables::Variables;

/// Nested expansions requested deeper than this fail.
pub const MAX_RECURSION_DEPTH: usize = 9;

/// Function calls nested inside one another's parameters beyond this
/// fail with a syntax error.
pub const MAX_CALL_NESTING: usize = 64;

/// Host-facing result of expanding a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandResult {
    /// At least one macro or `$$`/`%%` escape was replaced.
    Expansion(String),
    /// The text contained no macros or escapes and is returned unchanged.
    NoExpansion(String),
    /// Expansion failed; carries the diagnostic.
    Failed(String),
}

impl ExpandResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, ExpandResult::Failed(_))
    }

    pub fn text(&self) -> &str {
        match self {
            ExpandResult::Expansion(s) | ExpandResult::NoExpansion(s) | ExpandResult::Failed(s) => {
                s
            }
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ExpandResult::Expansion(s) | ExpandResult::NoExpansion(s) | ExpandResult::Failed(s) => {
                s
            }
        }
    }
}

// ──────────────────────────────────────────────
// Expander
// ──────────────────────────────────────────────

/// One expansion session: owns the variable store for an action
/// program run and borrows the shared function table.
pub struct Expander<'f> {
    functions: &'f FunctionTable,
    vars: Variables,
    host: Option<Box<dyn PersistentData>>,
    policy: Box<dyn AccessPolicy>,
    rng: StdRng,
    started: Instant,
    nesting: usize,
}

impl<'f> Expander<'f> {
    pub fn new(functions: &'f FunctionTable, vars: Variables) -> Self {
        Expander {
            functions,
            vars,
            host: None,
            policy: Box::new(Permissive),
            rng: StdRng::from_entropy(),
            started: Instant::now(),
            nesting: 0,
        }
    }

    /// Enable the file and process built-ins.
    pub fn with_host(mut self, host: Box<dyn PersistentData>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Make `random` and `phrase` reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn functions(&self) -> &'f FunctionTable {
        self.functions
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut Variables {
        &mut self.vars
    }

    pub fn into_variables(self) -> Variables {
        self.vars
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Expand every macro in `text`.
    pub fn expand(&mut self, text: &str) -> Result<String, MacroError> {
        self.expand_at(text, 0)
    }

    /// Expand `text`, reporting the outcome the way the host expects.
    pub fn expand_string(&mut self, text: &str) -> ExpandResult {
        let mut replaced = 0;
        match self.expand_counted(text, 0, &mut replaced) {
            Ok(out) if replaced == 0 => ExpandResult::NoExpansion(out),
            Ok(out) => ExpandResult::Expansion(out),
            Err(err) => ExpandResult::Failed(err.to_string()),
        }
    }

    /// Call a function directly with already classified parameters.
    pub fn call(&mut self, name: &str, params: Vec<Param>) -> Result<String, MacroError> {
        self.invoke(name, params, 0)
    }

    pub(crate) fn expand_at(&mut self, text: &str, depth: usize) -> Result<String, MacroError> {
        let mut replaced = 0;
        self.expand_counted(text, depth, &mut replaced)
    }

    fn expand_counted(
        &mut self,
        text: &str,
        depth: usize,
        replaced: &mut usize,
    ) -> Result<String, MacroError> {
        let mut out = String::with_capacity(text.len());
        let mut sc = Scanner::new(text);

        while let Some(c) = sc.peek() {
            match c {
                '$' => {
                    sc.bump();
                    if sc.peek() == Some('$') {
                        sc.bump();
                        out.push('$');
                        *replaced += 1;
                    } else if let Some(name) = sc.var_name()? {
                        out.push_str(self.lookup(name)?);
                        *replaced += 1;
                    } else {
                        out.push('$');
                    }
                }
                '%' => {
                    sc.bump();
                    if sc.peek() == Some('%') {
                        sc.bump();
                        out.push('%');
                        *replaced += 1;
                    } else if let Some(result) = self.try_call(&mut sc, depth)? {
                        out.push_str(&result);
                        *replaced += 1;
                    } else {
                        out.push('%');
                    }
                }
                _ => {
                    sc.bump();
                    out.push(c);
                }
            }
        }

        Ok(out)
    }

    fn lookup(&self, name: &str) -> Result<&str, MacroError> {
        self.vars.get(name).ok_or_else(|| MacroError::missing(name))
    }

    /// Positioned just after a `%`. Runs the call if one follows,
    /// otherwise restores the position and returns `None`.
    fn try_call(&mut self, sc: &mut Scanner<'_>, depth: usize) -> Result<Option<String>, MacroError> {
        let mark = sc.pos;
        let name = sc.take_while(|c| c.is_ascii_alphanumeric());
        if name.is_empty() || sc.peek() != Some('(') {
            sc.pos = mark;
            return Ok(None);
        }
        sc.bump();

        if self.nesting >= MAX_CALL_NESTING {
            warn!(function = name, nesting = self.nesting, "call nesting limit reached");
            return Err(MacroError::syntax(format!(
                "calls nested more than {} deep in {}",
                MAX_CALL_NESTING, name
            )));
        }
        self.nesting += 1;
        let result = self
            .parse_params(sc, name, depth)
            .and_then(|params| self.invoke(name, params, depth));
        self.nesting -= 1;
        result.map(Some)
    }

    /// Positioned just after the opening parenthesis.
    fn parse_params(
        &mut self,
        sc: &mut Scanner<'_>,
        function: &str,
        depth: usize,
    ) -> Result<Vec<Param>, MacroError> {
        let mut params = Vec::new();

        sc.skip_ws();
        if sc.peek() == Some(')') {
            sc.bump();
            return Ok(params);
        }

        loop {
            sc.skip_ws();
            let param = match sc.peek() {
                Some('"') => {
                    sc.bump();
                    let content = sc.quoted().ok_or_else(|| {
                        MacroError::syntax(format!("unterminated string in call to {}", function))
                    })?;
                    Param::Literal(self.expand_at(&content, depth)?)
                }
                Some('%') => {
                    let mark = sc.pos;
                    sc.bump();
                    match self.try_call(sc, depth)? {
                        Some(result) => Param::Literal(result),
                        None => {
                            sc.pos = mark;
                            Param::VariableRef(sc.bare_token().to_string())
                        }
                    }
                }
                Some('$') => {
                    let mark = sc.pos;
                    sc.bump();
                    match sc.var_name()? {
                        Some(name) => Param::Literal(self.lookup(name)?.to_string()),
                        None => {
                            sc.pos = mark;
                            Param::VariableRef(sc.bare_token().to_string())
                        }
                    }
                }
                _ => Param::VariableRef(sc.bare_token().to_string()),
            };
            params.push(param);

            sc.skip_ws();
            match sc.bump() {
                Some(',') | Some(';') => continue,
                Some(')') => return Ok(params),
                Some(c) => {
                    return Err(MacroError::syntax(format!(
                        "unexpected '{}' in call to {}",
                        c, function
                    )))
                }
                None => {
                    return Err(MacroError::syntax(format!(
                        "missing ) in call to {}",
                        function
                    )))
                }
            }
        }
    }

    fn invoke(&mut self, name: &str, params: Vec<Param>, depth: usize) -> Result<String, MacroError> {
        let def = self
            .functions
            .find(name)
            .ok_or_else(|| MacroError::UnknownFunction {
                name: name.to_string(),
            })?;

        if params.len() < def.min || params.len() > def.max {
            return Err(MacroError::Arity {
                function: def.name.to_string(),
                min: def.min,
                max: def.max,
                got: params.len(),
            });
        }

        for (i, param) in params.iter().enumerate() {
            def.kind_at(i)
                .check(param, &self.vars)
                .map_err(|problem| MacroError::ParamKind {
                    function: def.name.to_string(),
                    position: i + 1,
                    problem,
                })?;
        }

        debug!(function = def.name, depth, params = params.len(), "calling macro function");

        let mut call = Call {
            ex: self,
            def,
            params,
            depth,
        };
        let result = (def.handler)(&mut call);
        if let Err(err) = &result {
            debug!(function = def.name, error = %err, "macro function failed");
        }
        result
    }
}

// ──────────────────────────────────────────────
// Call context handed to handlers
// ──────────────────────────────────────────────

/// A single function invocation: its checked parameters plus access to
/// the session that made it.
pub struct Call<'c, 'f> {
    ex: &'c mut Expander<'f>,
    def: &'static FuncDef,
    params: Vec<Param>,
    depth: usize,
}

impl<'c, 'f> Call<'c, 'f> {
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param(&self, i: usize) -> &Param {
        &self.params[i]
    }

    pub fn insert_param(&mut self, i: usize, param: Param) {
        self.params.insert(i, param);
    }

    /// The parameter as written.
    pub fn raw(&self, i: usize) -> &str {
        self.params[i].raw()
    }

    /// Literal text, or the value of the named variable.
    pub fn value(&self, i: usize) -> Result<String, MacroError> {
        match &self.params[i] {
            Param::Literal(s) => Ok(s.clone()),
            Param::VariableRef(name) => self
                .ex
                .vars
                .get(name)
                .map(str::to_string)
                .ok_or_else(|| MacroError::missing(name.as_str())),
        }
    }

    /// `value(i)` for an optional trailing parameter.
    pub fn opt_value(&self, i: usize) -> Result<Option<String>, MacroError> {
        if i < self.params.len() {
            self.value(i).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Literal text; for a bare token the variable's value when it
    /// exists, else the token itself.
    pub fn value_or_literal(&self, i: usize) -> String {
        match &self.params[i] {
            Param::Literal(s) => s.clone(),
            Param::VariableRef(token) => self
                .ex
                .vars
                .get(token)
                .unwrap_or(token.as_str())
                .to_string(),
        }
    }

    /// `value_or_literal(i)` for an optional trailing parameter.
    pub fn opt_value_or_literal(&self, i: usize) -> Option<String> {
        (i < self.params.len()).then(|| self.value_or_literal(i))
    }

    pub fn vars(&self) -> &Variables {
        &self.ex.vars
    }

    pub fn vars_mut(&mut self) -> &mut Variables {
        &mut self.ex.vars
    }

    /// Expand `text` one level deeper than this call.
    pub fn expand_nested(&mut self, text: &str) -> Result<String, MacroError> {
        if self.depth > MAX_RECURSION_DEPTH {
            warn!(function = self.def.name, depth = self.depth, "macro recursion limit reached");
            return Err(MacroError::Recursion);
        }
        self.ex.expand_at(text, self.depth + 1)
    }

    /// The persistent data host, or `Unsupported` when none is attached.
    pub fn host(&mut self) -> Result<&mut (dyn PersistentData + 'static), MacroError> {
        let function = self.def.name;
        self.ex
            .host
            .as_deref_mut()
            .ok_or_else(|| MacroError::Unsupported {
                function: function.to_string(),
            })
    }

    pub fn has_host(&self) -> bool {
        self.ex.host.is_some()
    }

    pub fn policy(&self) -> &dyn AccessPolicy {
        self.ex.policy.as_ref()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.ex.rng
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.ex.started.elapsed()
    }
}

// ──────────────────────────────────────────────
// Scanner
// ──────────────────────────────────────────────

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '[' || c == ']'
}

struct Scanner<'t> {
    src: &'t str,
    pos: usize,
}

impl<'t> Scanner<'t> {
    fn new(src: &'t str) -> Self {
        Scanner { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'t str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Positioned just after a `$`: a plain or `(`-delimited name.
    fn var_name(&mut self) -> Result<Option<&'t str>, MacroError> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let name = self.take_while(|c| c != ')');
                if self.bump() != Some(')') {
                    return Err(MacroError::syntax("missing ) after $("));
                }
                Ok(Some(name.trim()))
            }
            Some(c) if is_var_char(c) => Ok(Some(self.take_while(is_var_char))),
            _ => Ok(None),
        }
    }

    /// Positioned just after an opening quote. `None` if unterminated.
    fn quoted(&mut self) -> Option<String> {
        let mut out = String::new();
        loop {
            match self.bump()? {
                '"' => return Some(out),
                '\\' => match self.bump()? {
                    c @ ('"' | '\\') => out.push(c),
                    c => {
                        out.push('\\');
                        out.push(c);
                    }
                },
                c => out.push(c),
            }
        }
    }

    /// Up to the next top-level `,`, `;` or `)`; balanced parentheses
    /// are part of the token.
    fn bare_token(&mut self) -> &'t str {
        let start = self.pos;
        let mut nesting = 0usize;
        while let Some(c) = self.peek() {
            match c {
                ',' | ';' if nesting == 0 => break,
                ')' if nesting == 0 => break,
                ')' => nesting -= 1,
                '(' => nesting += 1,
                _ => {}
            }
            self.bump();
        }
        self.src[start..self.pos].trim()
    }
}
