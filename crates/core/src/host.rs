//! Host collaborators for the side-effecting built-ins.
//!
//! The engine performs no I/O. File and process built-ins reach the
//! outside world only through a [`PersistentData`] implementation
//! handed to the session, after the session's [`AccessPolicy`] has
//! approved the operation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::HostError;

// ──────────────────────────────────────────────
// File modes
// ──────────────────────────────────────────────

/// How `openfile` opens a file. Parsed case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    CreateNew,
    Create,
    Open,
    OpenOrCreate,
    Truncate,
    Append,
}

impl FileMode {
    /// `Open` reads; every other mode writes.
    pub fn is_read(self) -> bool {
        self == FileMode::Open
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileMode::CreateNew => "CreateNew",
            FileMode::Create => "Create",
            FileMode::Open => "Open",
            FileMode::OpenOrCreate => "OpenOrCreate",
            FileMode::Truncate => "Truncate",
            FileMode::Append => "Append",
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "createnew" => Ok(FileMode::CreateNew),
            "create" => Ok(FileMode::Create),
            "open" => Ok(FileMode::Open),
            "openorcreate" => Ok(FileMode::OpenOrCreate),
            "truncate" => Ok(FileMode::Truncate),
            "append" => Ok(FileMode::Append),
            _ => Err(()),
        }
    }
}

// ──────────────────────────────────────────────
// Service traits
// ──────────────────────────────────────────────

/// File handle table plus the stateless filesystem queries.
///
/// Handles are small positive integers owned by the table.
pub trait FileTable {
    fn open(&mut self, path: &Path, mode: FileMode) -> Result<u32, HostError>;
    fn close(&mut self, handle: u32) -> Result<(), HostError>;
    /// Next line without its terminator; `None` at end of file.
    fn read_line(&mut self, handle: u32) -> Result<Option<String>, HostError>;
    fn write(&mut self, handle: u32, text: &str, newline: bool) -> Result<(), HostError>;
    fn seek(&mut self, handle: u32, position: u64) -> Result<(), HostError>;
    fn tell(&mut self, handle: u32) -> Result<u64, HostError>;

    fn file_exists(&self, path: &Path) -> bool;
    fn dir_exists(&self, path: &Path) -> bool;
    /// Files directly inside `dir` whose name matches a `*`/`?` pattern.
    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, HostError>;
    fn file_length(&self, path: &Path) -> Result<u64, HostError>;
    fn create_dir(&self, path: &Path) -> Result<(), HostError>;
    fn read_to_string(&self, path: &Path) -> Result<String, HostError>;
    /// Resolve a well-known folder name (`Temp`, `UserProfile`, ...).
    fn system_path(&self, id: &str) -> Option<PathBuf>;
}

/// Table of processes started on behalf of scripts.
pub trait ProcessTable {
    /// Start `program` with a command line; returns its id.
    fn start(&mut self, program: &str, command_line: &str) -> Result<u32, HostError>;
    fn kill(&mut self, pid: u32) -> Result<(), HostError>;
    /// Stop tracking the process without terminating it.
    fn close(&mut self, pid: u32) -> Result<(), HostError>;
    /// `Some(code)` once exited, `None` while running.
    fn exit_status(&mut self, pid: u32) -> Result<Option<i32>, HostError>;
    /// `true` if the process exited within `timeout`.
    fn wait(&mut self, pid: u32, timeout: Duration) -> Result<bool, HostError>;
    /// Id of a running process with this name, if any.
    fn find(&self, name: &str) -> Option<u32>;
    /// Names of running processes.
    fn list(&self) -> Vec<String>;
}

/// The persistent data host: owns the file and process tables for the
/// lifetime of an action program.
pub trait PersistentData {
    fn files(&mut self) -> &mut dyn FileTable;
    fn processes(&mut self) -> &mut dyn ProcessTable;
}

// ──────────────────────────────────────────────
// Access policy
// ──────────────────────────────────────────────

/// Sandboxing hook consulted before any file or process operation.
pub trait AccessPolicy {
    fn verify_file_access(&self, _path: &Path, _mode: FileMode) -> bool {
        true
    }

    fn verify_process_allowed(&self, _program: &str, _command_line: &str) -> bool {
        true
    }
}

/// Allows everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissive;

impl AccessPolicy for Permissive {}
