//! Error types for macro expansion and host services.
//!
//! `MacroError` is what every handler and the expander return. Its
//! `Display` output is the user-facing diagnostic that replaces the
//! expansion output when a call fails.

/// All errors that can terminate a macro expansion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MacroError {
    /// A variable referenced by name does not exist.
    #[error("Variable '{name}' does not exist")]
    MissingVariable { name: String },

    /// The computed target of an indirect lookup does not exist.
    #[error("Indirect variable '{name}' does not exist")]
    MissingIndirect { name: String },

    /// Malformed numeric or date input, or an unusable format string.
    #[error("{message}")]
    InvalidValue { message: String },

    /// Parameter count outside the function's declared range.
    #[error("Function {function} takes {} parameters, got {got}", arity_text(.min, .max))]
    Arity {
        function: String,
        min: usize,
        max: usize,
        got: usize,
    },

    /// A parameter does not satisfy its declared kind.
    #[error("Function {function} parameter {position}: {problem}")]
    ParamKind {
        function: String,
        position: usize,
        problem: String,
    },

    /// Nested expansion exceeded the depth ceiling.
    #[error("Recursion detected - aborting expansion")]
    Recursion,

    /// A file/process built-in was called without a persistent data host.
    #[error("Function {function} not supported without a persistent data host")]
    Unsupported { function: String },

    /// The access policy refused a file or process operation.
    #[error("Permission denied access to {target}")]
    PermissionDenied { target: String },

    /// No function with this name is registered.
    #[error("Function '{name}' does not exist")]
    UnknownFunction { name: String },

    /// Malformed macro syntax.
    #[error("Syntax error: {message}")]
    Syntax { message: String },

    /// A host service reported a failure.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Any other handler failure, carried as its diagnostic text.
    #[error("{message}")]
    Failed { message: String },
}

impl MacroError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MacroError::InvalidValue {
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        MacroError::Failed {
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        MacroError::Syntax {
            message: message.into(),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        MacroError::MissingVariable { name: name.into() }
    }
}

fn arity_text(min: &usize, max: &usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{} to {}", min, max)
    }
}

/// Errors reported by `FileTable` and `ProcessTable` implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The handle is not open in the file table.
    #[error("File handle not found or invalid")]
    BadHandle,

    /// The operation does not apply to how the handle was opened.
    #[error("File handle {handle} is not open for {operation}")]
    WrongMode { handle: u32, operation: &'static str },

    /// No tracked process with this id.
    #[error("No such process found")]
    NoSuchProcess,

    /// The process could not be started.
    #[error("Process {program} did not start")]
    StartFailed { program: String },

    /// An underlying OS error, rendered as text.
    #[error("{0}")]
    Io(String),
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::Io(err.to_string())
    }
}
