//! `condmacro expand`: run one expansion session over a piece of text.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use condmacro_core::{ExpandResult, Expander, FunctionTable, Variables};
use condmacro_host::{HostConfig, SandboxPolicy, StdHost};
use serde::Serialize;
use tracing::debug;

use crate::{report_error, OutputFormat, EXIT_FAILED, EXIT_USAGE};

pub(crate) struct ExpandArgs {
    pub text: Option<String>,
    pub file: Option<PathBuf>,
    pub vars: Option<PathBuf>,
    pub assignments: Vec<(String, String)>,
    pub host: bool,
    pub config: Option<PathBuf>,
    pub show_vars: bool,
    pub seed: Option<u64>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    success: bool,
    expanded: bool,
    result: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<BTreeMap<&'a str, &'a str>>,
}

fn read_text(args: &ExpandArgs) -> Result<String, String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .map_err(|e| format!("error: could not read '{}': {}", path.display(), e));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|e| format!("error: could not read stdin: {}", e))?;
    Ok(text)
}

/// Load a JSON object of variables; nested values are flattened the
/// same way `%jsonparse` does.
fn read_vars(path: &Path) -> Result<Variables, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("error: could not read '{}': {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("error: invalid JSON in {}: {}", path.display(), e))?;
    if !value.is_object() {
        return Err(format!(
            "error: {} must contain a JSON object of variables",
            path.display()
        ));
    }
    let mut vars = Variables::new();
    vars.add_json(&value, "");
    Ok(vars)
}

fn build_policy(config: Option<&Path>) -> Result<SandboxPolicy, String> {
    let Some(path) = config else {
        return Ok(SandboxPolicy::new().processes_enabled(true));
    };
    let config = HostConfig::load(path).map_err(|e| format!("error: {}", e))?;
    config.policy().map_err(|e| format!("error: {}", e))
}

fn prepare<'f>(table: &'f FunctionTable, args: &ExpandArgs) -> Result<Expander<'f>, String> {
    let mut vars = match &args.vars {
        Some(path) => read_vars(path)?,
        None => Variables::new(),
    };
    vars.extend(args.assignments.iter().cloned());

    let mut ex = Expander::new(table, vars);
    if let Some(seed) = args.seed {
        ex = ex.with_seed(seed);
    }
    if args.host {
        let policy = build_policy(args.config.as_deref())?;
        debug!(?policy, "host enabled");
        ex = ex
            .with_host(Box::new(StdHost::new()))
            .with_policy(Box::new(policy));
    }
    Ok(ex)
}

pub(crate) fn cmd_expand(args: ExpandArgs, output: OutputFormat, quiet: bool) -> i32 {
    let table = FunctionTable::builtin();
    let (text, mut ex) = match read_text(&args).and_then(|t| Ok((t, prepare(&table, &args)?))) {
        Ok(ready) => ready,
        Err(msg) => {
            report_error(&msg, output, quiet);
            return EXIT_USAGE;
        }
    };

    let result = ex.expand_string(&text);
    let vars = ex.into_variables();

    match output {
        OutputFormat::Json => {
            let report = JsonReport {
                success: !result.is_failed(),
                expanded: matches!(result, ExpandResult::Expansion(_)),
                result: result.text(),
                variables: args.show_vars.then(|| vars.iter().collect()),
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    report_error(&format!("error: {}", e), output, quiet);
                    return EXIT_USAGE;
                }
            }
        }
        OutputFormat::Text => {
            if let ExpandResult::Failed(msg) = &result {
                report_error(&format!("error: {}", msg), output, quiet);
            } else {
                println!("{}", result.text());
            }
            if args.show_vars && !quiet {
                for (name, value) in vars.iter() {
                    println!("{} = {}", name, value);
                }
            }
        }
    }

    if result.is_failed() {
        EXIT_FAILED
    } else {
        0
    }
}
