//! Process table over `std::process`.
//!
//! Only processes started through the table are visible to it; `find`
//! and `list` report those still believed to be running.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use condmacro_core::{HostError, ProcessTable};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct Tracked {
    name: String,
    child: Child,
    exit: Option<i32>,
}

impl Tracked {
    fn poll(&mut self) -> Result<Option<i32>, HostError> {
        if self.exit.is_none() {
            if let Some(status) = self.child.try_wait()? {
                self.exit = Some(status.code().unwrap_or(-1));
            }
        }
        Ok(self.exit)
    }
}

/// Children started on behalf of scripts, keyed by OS process id.
///
/// Closing a child that is still running moves it to a reap list, which
/// is polled on every later start and close until the child exits.
#[derive(Debug, Default)]
pub struct StdProcessTable {
    tracked: BTreeMap<u32, Tracked>,
    closed: Vec<Child>,
}

/// Split a command line on whitespace, keeping double-quoted runs together.
pub(crate) fn split_command_line(command_line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;
    for c in command_line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    if pending {
        args.push(current);
    }
    args
}

fn program_name(program: &str) -> String {
    Path::new(program)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

impl StdProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, pid: u32) -> Result<&mut Tracked, HostError> {
        self.tracked.get_mut(&pid).ok_or(HostError::NoSuchProcess)
    }

    /// Collect closed children that have exited since the last pass.
    fn reap(&mut self) {
        self.closed.retain_mut(|child| match child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(err) => {
                warn!(pid = child.id(), error = %err, "could not reap closed process");
                false
            }
        });
    }
}

impl ProcessTable for StdProcessTable {
    fn start(&mut self, program: &str, command_line: &str) -> Result<u32, HostError> {
        self.reap();
        let child = Command::new(program)
            .args(split_command_line(command_line))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| {
                warn!(program, error = %err, "process did not start");
                HostError::StartFailed {
                    program: program.to_string(),
                }
            })?;
        let pid = child.id();
        debug!(program, pid, "process started");
        self.tracked.insert(
            pid,
            Tracked {
                name: program_name(program),
                child,
                exit: None,
            },
        );
        Ok(pid)
    }

    fn kill(&mut self, pid: u32) -> Result<(), HostError> {
        let tracked = self.entry(pid)?;
        if tracked.poll()?.is_none() {
            tracked.child.kill()?;
            let status = tracked.child.wait()?;
            tracked.exit = Some(status.code().unwrap_or(-1));
        }
        Ok(())
    }

    fn close(&mut self, pid: u32) -> Result<(), HostError> {
        let mut tracked = self.tracked.remove(&pid).ok_or(HostError::NoSuchProcess)?;
        if tracked.poll()?.is_none() {
            debug!(pid, "closed while running");
            self.closed.push(tracked.child);
        }
        self.reap();
        Ok(())
    }

    fn exit_status(&mut self, pid: u32) -> Result<Option<i32>, HostError> {
        self.entry(pid)?.poll()
    }

    fn wait(&mut self, pid: u32, timeout: Duration) -> Result<bool, HostError> {
        let tracked = self.entry(pid)?;
        let deadline = Instant::now() + timeout;
        loop {
            if tracked.poll()?.is_some() {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn find(&self, name: &str) -> Option<u32> {
        let wanted = program_name(name);
        self.tracked
            .iter()
            .find(|(_, t)| t.exit.is_none() && t.name.eq_ignore_ascii_case(&wanted))
            .map(|(pid, _)| *pid)
    }

    fn list(&self) -> Vec<String> {
        self.tracked
            .values()
            .filter(|t| t.exit.is_none())
            .map(|t| t.name.clone())
            .collect()
    }
}
