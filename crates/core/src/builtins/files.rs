//! File built-ins. Every one of them goes through the session's
//! persistent data host and, for anything naming a path, the access
//! policy.

use std::path::Path;

use tracing::warn;

use crate::builtins::{flag, int_arg};
use crate::error::{HostError, MacroError};
use crate::expand::Call;
use crate::function::{Category, FuncDef, MAX_PARAMS};
use crate::host::FileMode;
use crate::param::ParamKind::*;

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "openfile",
        open_file,
        3,
        3,
        &[VarName, VarOrText, ValueOrLiteral],
        Category::Files,
        "Open a file, storing its handle in the named variable; 1 on success",
    ),
    FuncDef::new("closefile", close_file, 1, 1, &[Var], Category::Files, "Close a file handle"),
    FuncDef::new(
        "readline",
        read_line,
        2,
        2,
        &[Var, VarName],
        Category::Files,
        "Read the next line into a variable; 0 at end of file",
    ),
    FuncDef::new(
        "write",
        write,
        2,
        2,
        &[Var, VarOrText],
        Category::Files,
        "Write text to a file handle",
    ),
    FuncDef::new(
        "writeline",
        write_line,
        2,
        2,
        &[Var, VarOrText],
        Category::Files,
        "Write text and a line break to a file handle",
    ),
    FuncDef::new(
        "seek",
        seek,
        2,
        2,
        &[Var, ValueOrLiteralOrText],
        Category::Files,
        "Move a file handle to a byte position",
    ),
    FuncDef::new("tell", tell, 1, 1, &[Var], Category::Files, "Byte position of a file handle"),
    FuncDef::new(
        "fileexists",
        file_exists,
        1,
        MAX_PARAMS,
        &[VarOrText],
        Category::Files,
        "1 if every path is an existing file",
    ),
    FuncDef::new(
        "direxists",
        dir_exists,
        1,
        MAX_PARAMS,
        &[VarOrText],
        Category::Files,
        "1 if every path is an existing directory",
    ),
    FuncDef::new(
        "filelist",
        file_list,
        2,
        2,
        &[VarOrText],
        Category::Files,
        "Quoted, comma separated files in a directory matching a wildcard",
    ),
    FuncDef::new(
        "filelength",
        file_length,
        1,
        1,
        &[VarOrText],
        Category::Files,
        "Length of a file in bytes, -1 if it cannot be read",
    ),
    FuncDef::new(
        "mkdir",
        make_dir,
        1,
        1,
        &[VarOrText],
        Category::Files,
        "Create a directory and its parents; 1 on success",
    ),
    FuncDef::new(
        "readalltext",
        read_all_text,
        1,
        1,
        &[VarOrText],
        Category::Files,
        "Entire contents of a text file",
    ),
    FuncDef::new(
        "systempath",
        system_path,
        1,
        1,
        &[Literal],
        Category::Files,
        "Path of a well-known folder such as Temp or UserProfile",
    ),
];

/// The handle stored in variable parameter `i`.
fn handle(call: &Call<'_, '_>, i: usize) -> Result<u32, MacroError> {
    call.value(i)?
        .trim()
        .parse::<u32>()
        .map_err(|_| HostError::BadHandle.into())
}

fn check_access(call: &Call<'_, '_>, path: &str, mode: FileMode) -> Result<(), MacroError> {
    if call.policy().verify_file_access(Path::new(path), mode) {
        Ok(())
    } else {
        Err(MacroError::PermissionDenied {
            target: path.to_string(),
        })
    }
}

fn open_file(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let target = call.raw(0).to_string();
    let path = call.value(1)?;
    let mode: FileMode = call
        .value_or_literal(2)
        .parse()
        .map_err(|_| MacroError::invalid("Unknown File Mode"))?;
    check_access(call, &path, mode)?;

    match call.host()?.files().open(Path::new(&path), mode) {
        Ok(id) => {
            call.vars_mut().set(target, id.to_string());
            Ok(flag(true))
        }
        Err(err) => {
            warn!(path = %path, mode = %mode, error = %err, "openfile failed");
            Ok(flag(false))
        }
    }
}

fn close_file(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let h = handle(call, 0)?;
    call.host()?.files().close(h)?;
    Ok(flag(true))
}

fn read_line(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let h = handle(call, 0)?;
    let target = call.raw(1).to_string();
    match call.host()?.files().read_line(h)? {
        Some(line) => {
            call.vars_mut().set(target, line);
            Ok(flag(true))
        }
        None => Ok(flag(false)),
    }
}

fn write_common(call: &mut Call<'_, '_>, newline: bool) -> Result<String, MacroError> {
    call.host()?;
    let h = handle(call, 0)?;
    let text = call.value(1)?;
    call.host()?.files().write(h, &text, newline)?;
    Ok(flag(true))
}

fn write(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    write_common(call, false)
}

fn write_line(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    write_common(call, true)
}

fn seek(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let h = handle(call, 0)?;
    let position = int_arg(call, 1, "Seek position must be an integer")?;
    let position = u64::try_from(position)
        .map_err(|_| MacroError::invalid("Seek position must not be negative"))?;
    call.host()?.files().seek(h, position)?;
    Ok(flag(true))
}

fn tell(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let h = handle(call, 0)?;
    Ok(call.host()?.files().tell(h)?.to_string())
}

fn all_paths(call: &mut Call<'_, '_>, dirs: bool) -> Result<String, MacroError> {
    call.host()?;
    let paths = (0..call.len())
        .map(|i| call.value(i))
        .collect::<Result<Vec<_>, _>>()?;
    for path in &paths {
        check_access(call, path, FileMode::Open)?;
    }

    let files = call.host()?.files();
    let all = paths.iter().all(|p| {
        if dirs {
            files.dir_exists(Path::new(p))
        } else {
            files.file_exists(Path::new(p))
        }
    });
    Ok(flag(all))
}

fn file_exists(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    all_paths(call, false)
}

fn dir_exists(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    all_paths(call, true)
}

fn file_list(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let dir = call.value(0)?;
    let pattern = call.value(1)?;
    check_access(call, &dir, FileMode::Open)?;

    let files = call
        .host()?
        .files()
        .list_files(Path::new(&dir), &pattern)
        .map_err(|err| {
            warn!(dir = %dir, error = %err, "filelist failed");
            MacroError::failed("Directory not found")
        })?;
    Ok(files
        .iter()
        .map(|p| format!("\"{}\"", p.display()))
        .collect::<Vec<_>>()
        .join(","))
}

fn file_length(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let path = call.value(0)?;
    check_access(call, &path, FileMode::Open)?;
    match call.host()?.files().file_length(Path::new(&path)) {
        Ok(len) => Ok(len.to_string()),
        Err(_) => Ok("-1".to_string()),
    }
}

fn make_dir(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let path = call.value(0)?;
    check_access(call, &path, FileMode::Create)?;
    match call.host()?.files().create_dir(Path::new(&path)) {
        Ok(()) => Ok(flag(true)),
        Err(err) => {
            warn!(path = %path, error = %err, "mkdir failed");
            Ok(flag(false))
        }
    }
}

fn read_all_text(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let path = call.value(0)?;
    check_access(call, &path, FileMode::Open)?;
    call.host()?
        .files()
        .read_to_string(Path::new(&path))
        .map_err(|_| MacroError::failed(format!("File not found: {}", path)))
}

fn system_path(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let id = call.raw(0).to_string();
    match call.host()?.files().system_path(&id) {
        Some(path) => Ok(path.display().to_string()),
        None => Err(MacroError::invalid(format!("Unknown system path {}", id))),
    }
}
