//! Process built-ins, routed through the persistent data host.

use std::time::Duration;

use crate::builtins::{flag, int_arg};
use crate::error::MacroError;
use crate::expand::Call;
use crate::function::{Category, FuncDef};
use crate::param::ParamKind::*;

pub(crate) const FUNCTIONS: &[FuncDef] = &[
    FuncDef::new(
        "startprocess",
        start_process,
        2,
        2,
        &[VarOrText],
        Category::Processes,
        "Start a program with a command line; returns its id",
    ),
    FuncDef::new(
        "killprocess",
        kill_process,
        1,
        1,
        &[Var],
        Category::Processes,
        "Terminate a started process",
    ),
    FuncDef::new(
        "closeprocess",
        close_process,
        1,
        1,
        &[Var],
        Category::Processes,
        "Stop tracking a started process without terminating it",
    ),
    FuncDef::new(
        "hasprocessexited",
        has_process_exited,
        1,
        1,
        &[Var],
        Category::Processes,
        "Exit code of a process, or NOTEXITED while it runs",
    ),
    FuncDef::new(
        "waitforprocess",
        wait_for_process,
        2,
        2,
        &[Var, ValueOrLiteralOrText],
        Category::Processes,
        "Wait up to a timeout in milliseconds; 1 if the process exited",
    ),
    FuncDef::new(
        "findprocess",
        find_process,
        1,
        1,
        &[VarOrText],
        Category::Processes,
        "Id of a running process with this name, or 0",
    ),
    FuncDef::new(
        "listprocesses",
        list_processes,
        1,
        1,
        &[Literal],
        Category::Processes,
        "Store running process names in root[1], root[2], ...",
    ),
];

fn pid(call: &Call<'_, '_>, i: usize) -> Result<u32, MacroError> {
    call.value(i)?
        .trim()
        .parse::<u32>()
        .map_err(|_| MacroError::invalid("Missing PID"))
}

fn start_process(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let program = call.value(0)?;
    let command_line = call.value(1)?;
    if !call.policy().verify_process_allowed(&program, &command_line) {
        return Err(MacroError::PermissionDenied { target: program });
    }
    let id = call.host()?.processes().start(&program, &command_line)?;
    Ok(id.to_string())
}

fn kill_process(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let id = pid(call, 0)?;
    call.host()?.processes().kill(id)?;
    Ok(flag(true))
}

fn close_process(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let id = pid(call, 0)?;
    call.host()?.processes().close(id)?;
    Ok(flag(true))
}

fn has_process_exited(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let id = pid(call, 0)?;
    match call.host()?.processes().exit_status(id)? {
        Some(code) => Ok(code.to_string()),
        None => Ok("NOTEXITED".to_string()),
    }
}

fn wait_for_process(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let id = pid(call, 0)?;
    let timeout = int_arg(call, 1, "Missing PID or timeout value")?;
    let timeout = Duration::from_millis(timeout.max(0) as u64);
    let exited = call.host()?.processes().wait(id, timeout)?;
    Ok(flag(exited))
}

fn find_process(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    call.host()?;
    let name = call.value(0)?;
    Ok(call.host()?.processes().find(&name).unwrap_or(0).to_string())
}

fn list_processes(call: &mut Call<'_, '_>) -> Result<String, MacroError> {
    let root = call.raw(0).to_string();
    let names = call.host()?.processes().list();
    for (i, name) in names.into_iter().enumerate() {
        call.vars_mut().set(format!("{}[{}]", root, i + 1), name);
    }
    Ok(flag(true))
}
