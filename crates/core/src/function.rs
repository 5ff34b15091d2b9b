//! Function definitions and the read-only function table.
//!
//! Each built-in module exports a `const FUNCTIONS: &[FuncDef]` table.
//! [`FunctionTable::builtin`] indexes every table once at startup; the
//! result is shared by reference with each expansion session.

use std::collections::HashMap;
use std::fmt;

use crate::error::MacroError;
use crate::expand::Call;
use crate::param::ParamKind;

/// Upper bound used for variadic functions.
pub const MAX_PARAMS: usize = 20;

/// A built-in implementation.
pub type Handler = fn(&mut Call<'_, '_>) -> Result<String, MacroError>;

/// Function grouping, used for listings and host gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Variables,
    Numbers,
    Strings,
    Conditionals,
    Arrays,
    Dates,
    Files,
    Processes,
    Misc,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Variables,
        Category::Numbers,
        Category::Strings,
        Category::Conditionals,
        Category::Arrays,
        Category::Dates,
        Category::Files,
        Category::Processes,
        Category::Misc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Variables => "variables",
            Category::Numbers => "numbers",
            Category::Strings => "strings",
            Category::Conditionals => "conditionals",
            Category::Arrays => "arrays",
            Category::Dates => "dates",
            Category::Files => "files",
            Category::Processes => "processes",
            Category::Misc => "misc",
        }
    }

    pub fn from_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative definition of one built-in.
pub struct FuncDef {
    /// Lowercase name used in `%name(...)`.
    pub name: &'static str,
    pub handler: Handler,
    pub min: usize,
    pub max: usize,
    /// Kind per position; the last entry covers any further positions.
    pub kinds: &'static [ParamKind],
    pub category: Category,
    /// One-line description for listings.
    pub doc: &'static str,
    /// Additional names resolving to the same definition.
    pub aliases: &'static [&'static str],
}

impl FuncDef {
    pub const fn new(
        name: &'static str,
        handler: Handler,
        min: usize,
        max: usize,
        kinds: &'static [ParamKind],
        category: Category,
        doc: &'static str,
    ) -> Self {
        FuncDef {
            name,
            handler,
            min,
            max,
            kinds,
            category,
            doc,
            aliases: &[],
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn kind_at(&self, position: usize) -> ParamKind {
        match self.kinds.get(position) {
            Some(kind) => *kind,
            None => self.kinds.last().copied().unwrap_or(ParamKind::Literal),
        }
    }

    /// Signature line, e.g. `substring(p1, p2, p3)` or `join(p1 .. p20)`.
    pub fn signature(&self) -> String {
        let params = match (self.min, self.max) {
            (_, 0) => String::new(),
            (min, max) if max > self.kinds.len().max(min) => {
                format!("p1 .. p{}", max)
            }
            (min, max) => (1..=max)
                .map(|i| {
                    if i > min {
                        format!("[p{}]", i)
                    } else {
                        format!("p{}", i)
                    }
                })
                .collect::<Vec<_>>()
                .join(", "),
        };
        format!("{}({})", self.name, params)
    }
}

impl fmt::Debug for FuncDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncDef")
            .field("name", &self.name)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("category", &self.category)
            .finish()
    }
}

/// Case-insensitive name → definition index. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    by_name: HashMap<String, &'static FuncDef>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable {
            by_name: HashMap::new(),
        }
    }

    /// Every built-in function.
    pub fn builtin() -> Self {
        let mut table = FunctionTable::new();
        for defs in crate::builtins::ALL_TABLES {
            table = table.with_all(defs);
        }
        table
    }

    /// Add one definition (and its aliases). A later definition with the
    /// same name replaces the earlier one.
    pub fn with(mut self, def: &'static FuncDef) -> Self {
        self.by_name.insert(def.name.to_ascii_lowercase(), def);
        for alias in def.aliases {
            self.by_name.insert(alias.to_ascii_lowercase(), def);
        }
        self
    }

    pub fn with_all(self, defs: &'static [FuncDef]) -> Self {
        defs.iter().fold(self, FunctionTable::with)
    }

    pub fn find(&self, name: &str) -> Option<&'static FuncDef> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Distinct definitions sorted by category, then name.
    pub fn definitions(&self) -> Vec<&'static FuncDef> {
        let mut defs: Vec<&'static FuncDef> = Vec::new();
        for def in self.by_name.values() {
            if !defs.iter().any(|d| std::ptr::eq(*d, *def)) {
                defs.push(def);
            }
        }
        defs.sort_by(|a, b| (a.category, a.name).cmp(&(b.category, b.name)));
        defs
    }
}
