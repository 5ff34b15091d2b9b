//! condmacro-core: condition/macro expansion engine.
//!
//! Expands `$variable` references and `%function(...)` calls in text
//! against a per-session variable store, using a read-only table of
//! built-in functions.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`FunctionTable`] -- the function registry; [`FunctionTable::builtin`]
//!   builds the standard library
//! - [`Expander`] -- one expansion session owning a [`Variables`] store
//! - [`ExpandResult`] -- host-facing outcome of [`Expander::expand_string`]
//! - [`MacroError`] -- expansion error type
//! - [`PersistentData`], [`FileTable`], [`ProcessTable`], [`AccessPolicy`]
//!   -- the host seams used by the file and process built-ins
//!
//! Hosts add their own functions by building [`FuncDef`]s whose
//! [`Handler`] receives a [`Call`].

pub mod dates;
pub mod error;
pub mod eval;
pub mod expand;
pub mod function;
pub mod host;
pub mod numeric;
pub mod param;
pub mod text;
pub mod variables;

mod builtins;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{HostError, MacroError};
pub use expand::{Call, ExpandResult, Expander, MAX_CALL_NESTING, MAX_RECURSION_DEPTH};
pub use function::{Category, FuncDef, FunctionTable, Handler, MAX_PARAMS};
pub use host::{AccessPolicy, FileMode, FileTable, PersistentData, Permissive, ProcessTable};
pub use param::{Param, ParamKind};
pub use variables::Variables;
