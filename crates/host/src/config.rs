//! Host configuration loaded from TOML.
//!
//! # Example
//!
//! ```toml
//! [files]
//! enabled = true
//! roots = ["./journal", "/tmp/condmacro"]
//! read_only = false
//!
//! [processes]
//! enabled = true
//! allow = ["notepad*", "espeak"]
//! ```
//!
//! Missing sections take their defaults: files enabled without
//! restrictions, processes disabled.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::policy::{wildcard, SandboxPolicy};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse host configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid program pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub files: FilesSection,
    pub processes: ProcessesSection,
}

/// `[files]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesSection {
    pub enabled: bool,
    /// Directories scripts may touch; empty means anywhere.
    pub roots: Vec<PathBuf>,
    /// Refuse every mode but `Open`, and `mkdir`.
    pub read_only: bool,
}

impl Default for FilesSection {
    fn default() -> Self {
        FilesSection {
            enabled: true,
            roots: Vec::new(),
            read_only: false,
        }
    }
}

/// `[processes]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessesSection {
    pub enabled: bool,
    /// Wildcards matched against the program path or its file name.
    pub allow: Vec<String>,
}

impl HostConfig {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Build the access policy this configuration describes.
    pub fn policy(&self) -> Result<SandboxPolicy, ConfigError> {
        let mut policy = SandboxPolicy::new()
            .files_enabled(self.files.enabled)
            .read_only(self.files.read_only)
            .processes_enabled(self.processes.enabled);
        for root in &self.files.roots {
            policy = policy.root(root);
        }
        for pattern in &self.processes.allow {
            let re = wildcard(pattern).map_err(|source| ConfigError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            policy = policy.allow(re);
        }
        Ok(policy)
    }
}
