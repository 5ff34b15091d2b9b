//! `condmacro functions`: list the built-in function table.

use condmacro_core::{Category, FunctionTable};
use serde::Serialize;

use crate::{report_error, OutputFormat, EXIT_USAGE};

#[derive(Serialize)]
struct FunctionInfo {
    name: &'static str,
    category: &'static str,
    signature: String,
    min: usize,
    max: usize,
    aliases: &'static [&'static str],
    doc: &'static str,
}

pub(crate) fn cmd_functions(category: Option<&str>, output: OutputFormat, quiet: bool) -> i32 {
    let filter = match category.map(|name| (name, Category::from_name(name))) {
        None => None,
        Some((_, Some(c))) => Some(c),
        Some((name, None)) => {
            let known: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
            report_error(
                &format!(
                    "error: unknown category '{}' (expected one of: {})",
                    name,
                    known.join(", ")
                ),
                output,
                quiet,
            );
            return EXIT_USAGE;
        }
    };

    let table = FunctionTable::builtin();
    let defs: Vec<_> = table
        .definitions()
        .into_iter()
        .filter(|d| filter.map_or(true, |c| d.category == c))
        .collect();

    match output {
        OutputFormat::Json => {
            let infos: Vec<FunctionInfo> = defs
                .iter()
                .map(|d| FunctionInfo {
                    name: d.name,
                    category: d.category.as_str(),
                    signature: d.signature(),
                    min: d.min,
                    max: d.max,
                    aliases: d.aliases,
                    doc: d.doc,
                })
                .collect();
            match serde_json::to_string_pretty(&infos) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    report_error(&format!("error: {}", e), output, quiet);
                    return EXIT_USAGE;
                }
            }
        }
        OutputFormat::Text => {
            let mut current = None;
            for def in &defs {
                if current != Some(def.category) {
                    if current.is_some() {
                        println!();
                    }
                    println!("[{}]", def.category);
                    current = Some(def.category);
                }
                let mut line = format!("  {:<40} {}", def.signature(), def.doc);
                if !def.aliases.is_empty() {
                    line.push_str(&format!(" (alias: {})", def.aliases.join(", ")));
                }
                println!("{}", line);
            }
        }
    }
    0
}
