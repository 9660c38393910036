//! Command line interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Help text for the configuration file, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (TOML):
  Pass --config to override the built-in analyzer and source tables.

  [analyzers.<name>]
  doc = \"...\"               # What the analyzer reports
  message = \"...\"           # Message attached to findings
  [analyzers.<name>.vuln_calls]
  \"pkg/path\" = [\"Func\"]     # Sink functions; every argument is checked

  [sources.variables]        # Tainted package-level variables
  os = [\"Args\"]
  [sources.functions]        # Functions returning tainted data
  bufio = [\"ReadString\"]
  [sources.types]            # Types whose instances are tainted
  \"net/http\" = [\"Request\"]
";

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = CONFIG_HELP)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scans serialized SSA modules for taint-reachable sinks.
    Scan(ScanArgs),
}

/// Arguments of the `scan` subcommand.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are legitimately booleans
pub struct ScanArgs {
    /// SSA module files to scan.
    #[arg(required = true)]
    pub modules: Vec<PathBuf>,

    /// Marks package-level variables as dangerous.
    #[arg(short = 'g', long)]
    pub globals_tainted: bool,

    /// Outputs the full trace of the taint analysis for each finding.
    #[arg(short, long)]
    pub verbose: bool,

    /// Outputs engine debug logs to stderr.
    #[arg(short, long)]
    pub debug: bool,

    /// Outputs findings as JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to a custom scan configuration file.
    #[arg(short = 'i', long)]
    pub config: Option<PathBuf>,

    /// Writes findings to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exits with code 1 when findings remain.
    #[arg(long)]
    pub exit_code: bool,
}
