//! Sandboxing policy for file paths and started programs.

use std::fs;
use std::path::{Component, Path, PathBuf};

use condmacro_core::{AccessPolicy, FileMode};
use regex::Regex;
use tracing::debug;

/// Compile a `*`/`?` wildcard into an anchored, case-insensitive regex.
pub fn wildcard(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::from("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re)
}

/// The absolute, symlink-free location `path` refers to. The longest
/// existing prefix is canonicalized; the missing tail is appended with
/// `.` and `..` folded.
pub(crate) fn resolve(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let components: Vec<Component<'_>> = absolute.components().collect();
    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        if let Ok(real) = fs::canonicalize(&prefix) {
            return fold(real, &components[split..]);
        }
    }
    fold(PathBuf::new(), &components)
}

fn fold(mut base: PathBuf, tail: &[Component<'_>]) -> PathBuf {
    for component in tail {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                base.pop();
            }
            other => base.push(other),
        }
    }
    base
}

/// Access policy built from [`HostConfig`](crate::HostConfig).
///
/// With no roots every path is reachable; otherwise a path must lie
/// under one of them. An empty allow list admits any program once
/// processes are enabled.
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    files_enabled: bool,
    read_only: bool,
    roots: Vec<PathBuf>,
    processes_enabled: bool,
    allow: Vec<Regex>,
}

impl Default for SandboxPolicy {
    fn default() -> Self {
        SandboxPolicy {
            files_enabled: true,
            read_only: false,
            roots: Vec::new(),
            processes_enabled: false,
            allow: Vec::new(),
        }
    }
}

impl SandboxPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files_enabled(mut self, enabled: bool) -> Self {
        self.files_enabled = enabled;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.roots.push(resolve(root.as_ref()));
        self
    }

    pub fn processes_enabled(mut self, enabled: bool) -> Self {
        self.processes_enabled = enabled;
        self
    }

    pub fn allow(mut self, program: Regex) -> Self {
        self.allow.push(program);
        self
    }

    fn inside_roots(&self, path: &Path) -> bool {
        if self.roots.is_empty() {
            return true;
        }
        let path = resolve(path);
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

impl AccessPolicy for SandboxPolicy {
    fn verify_file_access(&self, path: &Path, mode: FileMode) -> bool {
        let allowed = self.files_enabled
            && (mode.is_read() || !self.read_only)
            && self.inside_roots(path);
        if !allowed {
            debug!(path = %path.display(), mode = %mode, "file access refused");
        }
        allowed
    }

    fn verify_process_allowed(&self, program: &str, _command_line: &str) -> bool {
        if !self.processes_enabled {
            debug!(program, "processes disabled");
            return false;
        }
        if self.allow.is_empty() {
            return true;
        }
        let file_name = Path::new(program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let allowed = self
            .allow
            .iter()
            .any(|re| re.is_match(program) || re.is_match(&file_name));
        if !allowed {
            debug!(program, "program not on the allow list");
        }
        allowed
    }
}
