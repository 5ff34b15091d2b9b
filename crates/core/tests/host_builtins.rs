//! File and process built-ins against an in-memory host.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use condmacro_core::{
    AccessPolicy, Expander, FileMode, FileTable, FunctionTable, HostError, MacroError,
    PersistentData, ProcessTable, Variables,
};

// ──────────────────────────────────────────────
// In-memory host
// ──────────────────────────────────────────────

#[derive(Default)]
struct Disk {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
}

struct Handle {
    path: PathBuf,
    pos: usize,
    writable: bool,
}

struct MemFiles {
    disk: Rc<RefCell<Disk>>,
    open: HashMap<u32, Handle>,
    next: u32,
}

impl FileTable for MemFiles {
    fn open(&mut self, path: &Path, mode: FileMode) -> Result<u32, HostError> {
        let mut disk = self.disk.borrow_mut();
        let exists = disk.files.contains_key(path);
        match mode {
            FileMode::Open if !exists => return Err(HostError::Io("not found".into())),
            FileMode::CreateNew if exists => return Err(HostError::Io("exists".into())),
            FileMode::Open | FileMode::Append | FileMode::OpenOrCreate => {
                disk.files.entry(path.to_path_buf()).or_default();
            }
            FileMode::CreateNew | FileMode::Create | FileMode::Truncate => {
                disk.files.insert(path.to_path_buf(), String::new());
            }
        }
        let pos = if mode == FileMode::Append {
            disk.files[path].len()
        } else {
            0
        };
        self.next += 1;
        self.open.insert(
            self.next,
            Handle {
                path: path.to_path_buf(),
                pos,
                writable: !mode.is_read(),
            },
        );
        Ok(self.next)
    }

    fn close(&mut self, handle: u32) -> Result<(), HostError> {
        self.open.remove(&handle).map(|_| ()).ok_or(HostError::BadHandle)
    }

    fn read_line(&mut self, handle: u32) -> Result<Option<String>, HostError> {
        let h = self.open.get_mut(&handle).ok_or(HostError::BadHandle)?;
        if h.writable {
            return Err(HostError::WrongMode {
                handle,
                operation: "reading",
            });
        }
        let disk = self.disk.borrow();
        let content = &disk.files[&h.path];
        if h.pos >= content.len() {
            return Ok(None);
        }
        let rest = &content[h.pos..];
        let end = rest.find('\n').unwrap_or(rest.len());
        h.pos += (end + 1).min(rest.len());
        Ok(Some(rest[..end].to_string()))
    }

    fn write(&mut self, handle: u32, text: &str, newline: bool) -> Result<(), HostError> {
        let h = self.open.get_mut(&handle).ok_or(HostError::BadHandle)?;
        if !h.writable {
            return Err(HostError::WrongMode {
                handle,
                operation: "writing",
            });
        }
        let mut disk = self.disk.borrow_mut();
        let content = disk.files.entry(h.path.clone()).or_default();
        let text = if newline {
            format!("{}\n", text)
        } else {
            text.to_string()
        };
        let end = (h.pos + text.len()).min(content.len());
        content.replace_range(h.pos..end, &text);
        h.pos += text.len();
        Ok(())
    }

    fn seek(&mut self, handle: u32, position: u64) -> Result<(), HostError> {
        let h = self.open.get_mut(&handle).ok_or(HostError::BadHandle)?;
        h.pos = position as usize;
        Ok(())
    }

    fn tell(&mut self, handle: u32) -> Result<u64, HostError> {
        let h = self.open.get(&handle).ok_or(HostError::BadHandle)?;
        Ok(h.pos as u64)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.disk.borrow().files.contains_key(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.disk.borrow().dirs.contains(path)
    }

    fn list_files(&self, dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, HostError> {
        let disk = self.disk.borrow();
        if !disk.dirs.contains(dir) {
            return Err(HostError::Io("no such directory".into()));
        }
        let suffix = pattern.trim_start_matches('*');
        Ok(disk
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter(|p| p.to_string_lossy().ends_with(suffix))
            .cloned()
            .collect())
    }

    fn file_length(&self, path: &Path) -> Result<u64, HostError> {
        self.disk
            .borrow()
            .files
            .get(path)
            .map(|c| c.len() as u64)
            .ok_or(HostError::Io("not found".into()))
    }

    fn create_dir(&self, path: &Path) -> Result<(), HostError> {
        let mut disk = self.disk.borrow_mut();
        if disk.files.contains_key(path) {
            return Err(HostError::Io("a file is in the way".into()));
        }
        disk.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> Result<String, HostError> {
        self.disk
            .borrow()
            .files
            .get(path)
            .cloned()
            .ok_or(HostError::Io("not found".into()))
    }

    fn system_path(&self, id: &str) -> Option<PathBuf> {
        id.eq_ignore_ascii_case("temp").then(|| PathBuf::from("/tmp"))
    }
}

#[derive(Default)]
struct MemProcesses {
    running: BTreeMap<u32, (String, Option<i32>)>,
}

impl ProcessTable for MemProcesses {
    fn start(&mut self, program: &str, _command_line: &str) -> Result<u32, HostError> {
        if program == "missing" {
            return Err(HostError::StartFailed {
                program: program.to_string(),
            });
        }
        let pid = 100 + self.running.len() as u32;
        self.running.insert(pid, (program.to_string(), None));
        Ok(pid)
    }

    fn kill(&mut self, pid: u32) -> Result<(), HostError> {
        let entry = self.running.get_mut(&pid).ok_or(HostError::NoSuchProcess)?;
        entry.1 = Some(-1);
        Ok(())
    }

    fn close(&mut self, pid: u32) -> Result<(), HostError> {
        self.running.remove(&pid).map(|_| ()).ok_or(HostError::NoSuchProcess)
    }

    fn exit_status(&mut self, pid: u32) -> Result<Option<i32>, HostError> {
        self.running
            .get(&pid)
            .map(|(_, code)| *code)
            .ok_or(HostError::NoSuchProcess)
    }

    fn wait(&mut self, pid: u32, _timeout: Duration) -> Result<bool, HostError> {
        Ok(self.exit_status(pid)?.is_some())
    }

    fn find(&self, name: &str) -> Option<u32> {
        self.running
            .iter()
            .find(|(_, (program, code))| program == name && code.is_none())
            .map(|(pid, _)| *pid)
    }

    fn list(&self) -> Vec<String> {
        self.running.values().map(|(name, _)| name.clone()).collect()
    }
}

struct MemHost {
    files: MemFiles,
    processes: MemProcesses,
}

impl PersistentData for MemHost {
    fn files(&mut self) -> &mut dyn FileTable {
        &mut self.files
    }

    fn processes(&mut self) -> &mut dyn ProcessTable {
        &mut self.processes
    }
}

fn mem_host(disk: &Rc<RefCell<Disk>>) -> Box<dyn PersistentData> {
    Box::new(MemHost {
        files: MemFiles {
            disk: Rc::clone(disk),
            open: HashMap::new(),
            next: 0,
        },
        processes: MemProcesses::default(),
    })
}

/// Read-only file access; `rm` may not be started.
struct ReadOnly;

impl AccessPolicy for ReadOnly {
    fn verify_file_access(&self, _path: &Path, mode: FileMode) -> bool {
        mode.is_read()
    }

    fn verify_process_allowed(&self, program: &str, _command_line: &str) -> bool {
        program != "rm"
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

const HOST_CALLS: &[(&str, &str)] = &[
    ("openfile", "%openfile(fh, \"a.txt\", Open)"),
    ("closefile", "%closefile(h)"),
    ("readline", "%readline(h, line)"),
    ("write", "%write(h, \"x\")"),
    ("writeline", "%writeline(h, \"x\")"),
    ("seek", "%seek(h, 0)"),
    ("tell", "%tell(h)"),
    ("fileexists", "%fileexists(\"a.txt\")"),
    ("direxists", "%direxists(\"logs\")"),
    ("filelist", "%filelist(\"logs\", \"*.txt\")"),
    ("filelength", "%filelength(\"a.txt\")"),
    ("mkdir", "%mkdir(\"logs\")"),
    ("readalltext", "%readalltext(\"a.txt\")"),
    ("systempath", "%systempath(Temp)"),
    ("startprocess", "%startprocess(\"notepad\", \"\")"),
    ("killprocess", "%killprocess(h)"),
    ("closeprocess", "%closeprocess(h)"),
    ("hasprocessexited", "%hasprocessexited(h)"),
    ("waitforprocess", "%waitforprocess(h, 10)"),
    ("findprocess", "%findprocess(\"notepad\")"),
    ("listprocesses", "%listprocesses(procs)"),
];

fn session_vars() -> Variables {
    [("h", "1")].into_iter().collect()
}

#[test]
fn every_host_builtin_is_unsupported_without_a_host() {
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, session_vars());
    for (name, text) in HOST_CALLS {
        let err = ex.expand(text).unwrap_err();
        assert_eq!(
            err,
            MacroError::Unsupported {
                function: name.to_string()
            },
            "{}",
            text
        );
        assert_eq!(
            err.to_string(),
            format!("Function {} not supported without a persistent data host", name)
        );
    }
}

#[test]
fn file_round_trip_through_the_host() {
    let disk = Rc::new(RefCell::new(Disk::default()));
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, Variables::new()).with_host(mem_host(&disk));

    assert_eq!(ex.expand("%openfile(out, \"log.txt\", Create)").unwrap(), "1");
    assert_eq!(ex.vars().get("out"), Some("1"));
    assert_eq!(ex.expand("%writeline(out, \"hello\")").unwrap(), "1");
    assert_eq!(ex.expand("%write(out, \"world\")").unwrap(), "1");
    assert_eq!(ex.expand("%tell(out)").unwrap(), "11");
    assert_eq!(ex.expand("%closefile(out)").unwrap(), "1");
    assert_eq!(
        ex.expand("%closefile(out)").unwrap_err(),
        MacroError::Host(HostError::BadHandle)
    );

    assert_eq!(ex.expand("%openfile(in, \"log.txt\", open)").unwrap(), "1");
    assert_eq!(ex.expand("%readline(in, line)").unwrap(), "1");
    assert_eq!(ex.vars().get("line"), Some("hello"));
    assert_eq!(ex.expand("%readline(in, line)").unwrap(), "1");
    assert_eq!(ex.vars().get("line"), Some("world"));
    assert_eq!(ex.expand("%readline(in, line)").unwrap(), "0");
    assert_eq!(ex.expand("%seek(in, 6)").unwrap(), "1");
    assert_eq!(ex.expand("%readline(in, line) $line").unwrap(), "1 world");
    assert!(matches!(
        ex.expand("%write(in, \"x\")").unwrap_err(),
        MacroError::Host(HostError::WrongMode { .. })
    ));

    assert_eq!(ex.expand("%fileexists(\"log.txt\")").unwrap(), "1");
    assert_eq!(ex.expand("%fileexists(\"log.txt\", \"nope.txt\")").unwrap(), "0");
    assert_eq!(ex.expand("%filelength(\"log.txt\")").unwrap(), "11");
    assert_eq!(ex.expand("%filelength(\"nope.txt\")").unwrap(), "-1");
    assert_eq!(ex.expand("%readalltext(\"log.txt\")").unwrap(), "hello\nworld");
    assert_eq!(
        ex.expand("%readalltext(\"nope.txt\")").unwrap_err().to_string(),
        "File not found: nope.txt"
    );
    assert_eq!(ex.expand("%openfile(x, \"nope.txt\", Open)").unwrap(), "0");
    assert!(!ex.vars().exists("x"));
    assert_eq!(
        ex.expand("%openfile(x, \"a.txt\", Sideways)").unwrap_err().to_string(),
        "Unknown File Mode"
    );
}

#[test]
fn directories_and_listings() {
    let disk = Rc::new(RefCell::new(Disk::default()));
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, Variables::new()).with_host(mem_host(&disk));

    assert_eq!(ex.expand("%direxists(\"logs\")").unwrap(), "0");
    assert_eq!(ex.expand("%mkdir(\"logs\")").unwrap(), "1");
    assert_eq!(ex.expand("%direxists(\"logs\")").unwrap(), "1");
    ex.expand("%openfile(a, \"logs/a.txt\", Create)").unwrap();
    ex.expand("%openfile(b, \"logs/b.log\", Create)").unwrap();
    assert_eq!(
        ex.expand("%filelist(\"logs\", \"*.txt\")").unwrap(),
        "\"logs/a.txt\""
    );
    assert_eq!(
        ex.expand("%filelist(\"nowhere\", \"*\")").unwrap_err().to_string(),
        "Directory not found"
    );
    assert_eq!(ex.expand("%mkdir(\"logs/a.txt\")").unwrap(), "0");
    assert_eq!(ex.expand("%systempath(Temp)").unwrap(), "/tmp");
    assert!(ex.expand("%systempath(Nowhere)").is_err());
}

#[test]
fn processes_through_the_host() {
    let disk = Rc::new(RefCell::new(Disk::default()));
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, Variables::new()).with_host(mem_host(&disk));

    assert_eq!(ex.expand("%startprocess(\"notepad\", \"log.txt\")").unwrap(), "100");
    ex.vars_mut().set("pid", "100");
    assert_eq!(ex.expand("%findprocess(\"notepad\")").unwrap(), "100");
    assert_eq!(ex.expand("%findprocess(\"calc\")").unwrap(), "0");
    assert_eq!(ex.expand("%hasprocessexited(pid)").unwrap(), "NOTEXITED");
    assert_eq!(ex.expand("%waitforprocess(pid, 10)").unwrap(), "0");
    assert_eq!(ex.expand("%killprocess(pid)").unwrap(), "1");
    assert_eq!(ex.expand("%hasprocessexited(pid)").unwrap(), "-1");
    assert_eq!(ex.expand("%waitforprocess(pid, 10)").unwrap(), "1");
    assert_eq!(ex.expand("%listprocesses(p)").unwrap(), "1");
    assert_eq!(ex.vars().get("p[1]"), Some("notepad"));
    assert_eq!(ex.expand("%closeprocess(pid)").unwrap(), "1");
    assert_eq!(
        ex.expand("%killprocess(pid)").unwrap_err().to_string(),
        "No such process found"
    );
    assert_eq!(
        ex.expand("%startprocess(\"missing\", \"\")").unwrap_err().to_string(),
        "Process missing did not start"
    );
}

#[test]
fn policy_is_consulted_before_the_host() {
    let disk = Rc::new(RefCell::new(Disk::default()));
    disk.borrow_mut()
        .files
        .insert(PathBuf::from("notes.txt"), "entry".into());
    let table = FunctionTable::builtin();
    let mut ex = Expander::new(&table, Variables::new())
        .with_host(mem_host(&disk))
        .with_policy(Box::new(ReadOnly));

    assert_eq!(ex.expand("%openfile(r, \"notes.txt\", Open)").unwrap(), "1");
    assert_eq!(
        ex.expand("%openfile(w, \"notes.txt\", Append)").unwrap_err(),
        MacroError::PermissionDenied {
            target: "notes.txt".into()
        }
    );
    assert_eq!(
        ex.expand("%mkdir(\"out\")").unwrap_err().to_string(),
        "Permission denied access to out"
    );
    assert!(!disk.borrow().dirs.contains(Path::new("out")));
    assert_eq!(ex.expand("%readalltext(\"notes.txt\")").unwrap(), "entry");
    assert!(matches!(
        ex.expand("%startprocess(\"rm\", \"-rf /\")").unwrap_err(),
        MacroError::PermissionDenied { .. }
    ));
}
