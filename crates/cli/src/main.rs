mod expand;
mod functions;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::expand::{cmd_expand, ExpandArgs};
use crate::functions::cmd_functions;

/// Exit code for a failed expansion.
pub(crate) const EXIT_FAILED: i32 = 1;
/// Exit code for unreadable inputs and bad arguments.
pub(crate) const EXIT_USAGE: i32 = 2;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Condition/macro expansion engine.
#[derive(Parser)]
#[command(name = "condmacro", version, about = "Condition/macro expansion engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log engine activity to stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand $variables and %functions() in text
    Expand {
        /// Text to expand; read from --file or stdin when absent
        text: Option<String>,
        /// Read the text from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// JSON object of initial variables
        #[arg(long)]
        vars: Option<PathBuf>,
        /// Set a variable (repeatable)
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        var: Vec<(String, String)>,
        /// Enable the file and process functions
        #[arg(long)]
        host: bool,
        /// Host configuration (TOML) restricting files and processes
        #[arg(long, requires = "host")]
        config: Option<PathBuf>,
        /// Print the variable store after expanding
        #[arg(long)]
        show_vars: bool,
        /// Seed for random and phrase
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the available functions
    Functions {
        /// Only list one category (variables, numbers, strings, ...)
        #[arg(long)]
        category: Option<String>,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Expand {
            text,
            file,
            vars,
            var,
            host,
            config,
            show_vars,
            seed,
        } => cmd_expand(
            ExpandArgs {
                text,
                file,
                vars,
                assignments: var,
                host,
                config,
                show_vars,
                seed,
            },
            cli.output,
            cli.quiet,
        ),
        Commands::Functions { category } => {
            cmd_functions(category.as_deref(), cli.output, cli.quiet)
        }
    };
    std::process::exit(code);
}

/// Report an error message to stderr in the requested format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
