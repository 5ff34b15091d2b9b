//! condmacro-host: std-backed services for the file and process built-ins.
//!
//! # Public API
//!
//! - [`StdHost`] -- a [`PersistentData`] backed by the real filesystem
//!   and child processes
//! - [`SandboxPolicy`] -- an [`AccessPolicy`](condmacro_core::AccessPolicy)
//!   restricting paths and programs
//! - [`HostConfig`] -- the TOML configuration that builds a policy

pub mod config;
pub mod files;
pub mod policy;
pub mod processes;

use condmacro_core::{FileTable, PersistentData, ProcessTable};

// ── Convenience re-exports: key types ────────────────────────────────

pub use config::{ConfigError, FilesSection, HostConfig, ProcessesSection};
pub use files::StdFileTable;
pub use policy::{wildcard, SandboxPolicy};
pub use processes::StdProcessTable;

/// File and process tables for one action program.
#[derive(Debug, Default)]
pub struct StdHost {
    files: StdFileTable,
    processes: StdProcessTable,
}

impl StdHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentData for StdHost {
    fn files(&mut self) -> &mut dyn FileTable {
        &mut self.files
    }

    fn processes(&mut self) -> &mut dyn ProcessTable {
        &mut self.processes
    }
}
