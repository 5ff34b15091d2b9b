//! Expansion sessions running against the real filesystem.

use std::fs;

use condmacro_core::{Expander, FunctionTable, MacroError, Variables};
use condmacro_host::{HostConfig, SandboxPolicy, StdHost};
use tempfile::TempDir;

fn session<'f>(table: &'f FunctionTable, dir: &TempDir, policy: SandboxPolicy) -> Expander<'f> {
    let mut vars = Variables::new();
    vars.set("Dir", dir.path().display().to_string());
    Expander::new(table, vars)
        .with_host(Box::new(StdHost::new()))
        .with_policy(Box::new(policy))
}

#[test]
fn script_writes_and_reads_a_journal_file() {
    let dir = tempfile::tempdir().unwrap();
    let table = FunctionTable::builtin();
    let mut ex = session(&table, &dir, SandboxPolicy::new().root(dir.path()));

    let script = concat!(
        "%mkdir(\"$Dir/logs\")",
        "%openfile(fh, \"$Dir/logs/jump.log\", Create)",
        "%writeline(fh, \"Sol\")",
        "%writeline(fh, \"Achenar\")",
        "%closefile(fh)",
    );
    assert_eq!(ex.expand(script).unwrap(), "11111");

    let path = dir.path().join("logs").join("jump.log");
    assert_eq!(fs::read_to_string(&path).unwrap(), "Sol\nAchenar\n");
    assert_eq!(
        ex.expand("%filelength(\"$Dir/logs/jump.log\")").unwrap(),
        "12"
    );
    assert_eq!(ex.expand("%fileexists(\"$Dir/logs/jump.log\")").unwrap(), "1");
    assert_eq!(ex.expand("%direxists(\"$Dir/logs\")").unwrap(), "1");

    ex.expand("%openfile(in, \"$Dir/logs/jump.log\", Open)").unwrap();
    assert_eq!(ex.expand("%readline(in, sys)$sys").unwrap(), "1Sol");
    assert_eq!(ex.expand("%readline(in, sys)$sys").unwrap(), "1Achenar");
    assert_eq!(ex.expand("%readline(in, sys)").unwrap(), "0");

    let listed = ex.expand("%filelist(\"$Dir/logs\", \"*.log\")").unwrap();
    assert_eq!(listed, format!("\"{}\"", path.display()));
}

#[test]
fn paths_outside_the_roots_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "x").unwrap();

    let table = FunctionTable::builtin();
    let mut ex = session(&table, &dir, SandboxPolicy::new().root(dir.path()));
    ex.vars_mut()
        .set("Outside", outside.path().display().to_string());

    assert!(matches!(
        ex.expand("%readalltext(\"$Outside/secret.txt\")").unwrap_err(),
        MacroError::PermissionDenied { .. }
    ));
    assert!(matches!(
        ex.expand("%readalltext(\"$Dir/../secret.txt\")").unwrap_err(),
        MacroError::PermissionDenied { .. }
    ));
}

#[cfg(unix)]
#[test]
fn symlinks_cannot_leave_the_roots() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "TOP SECRET").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
    fs::write(dir.path().join("note.txt"), "hello").unwrap();

    let table = FunctionTable::builtin();
    let mut ex = session(&table, &dir, SandboxPolicy::new().root(dir.path()));

    assert!(matches!(
        ex.expand("%readalltext(\"$Dir/link/secret.txt\")").unwrap_err(),
        MacroError::PermissionDenied { .. }
    ));
    assert!(matches!(
        ex.expand("%openfile(fh, \"$Dir/link/new.txt\", Create)").unwrap_err(),
        MacroError::PermissionDenied { .. }
    ));
    assert!(!outside.path().join("new.txt").exists());
    assert_eq!(ex.expand("%readalltext(\"$Dir/note.txt\")").unwrap(), "hello");
}

#[test]
fn configured_read_only_host() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "entry").unwrap();
    let config = HostConfig::from_toml("[files]\nread_only = true\n").unwrap();

    let table = FunctionTable::builtin();
    let mut ex = session(&table, &dir, config.policy().unwrap());
    assert_eq!(ex.expand("%readalltext(\"$Dir/notes.txt\")").unwrap(), "entry");
    assert!(ex.expand("%mkdir(\"$Dir/new\")").is_err());
    assert!(!dir.path().join("new").exists());
    assert!(matches!(
        ex.expand("%startprocess(\"notepad\", \"\")").unwrap_err(),
        MacroError::PermissionDenied { .. }
    ));
}

#[test]
fn failed_opens_and_missing_files_are_domain_results() {
    let dir = tempfile::tempdir().unwrap();
    let table = FunctionTable::builtin();
    let mut ex = session(&table, &dir, SandboxPolicy::new());

    assert_eq!(ex.expand("%openfile(fh, \"$Dir/none.txt\", Open)").unwrap(), "0");
    assert_eq!(ex.expand("%filelength(\"$Dir/none.txt\")").unwrap(), "-1");
    assert_eq!(
        ex.expand("%readalltext(\"$Dir/none.txt\")").unwrap_err().to_string(),
        format!("File not found: {}/none.txt", dir.path().display())
    );
}
