//! Binary entry point: parse the command line, run the scan, emit findings.

use anyhow::{Context, Result};
use clap::Parser;
use sinkscan::cli::{Cli, Commands, ScanArgs};
use sinkscan::config::{Policy, ScanConfig};
use sinkscan::report::{findings_to_json, print_finding, print_summary};
use sinkscan::scan::scan;
use std::fs;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("sinkscan: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Scan(args) => run_scan(&args),
    }
}

fn run_scan(args: &ScanArgs) -> Result<ExitCode> {
    let policy = Policy {
        globals_safe: !args.globals_tainted,
        verbose: args.verbose,
        debug: args.debug,
        json: args.json,
        exit_code: args.exit_code,
        output_path: args.output.clone(),
    };
    let config = ScanConfig::load(args.config.as_deref())?;

    if !policy.json {
        match &args.config {
            Some(path) => println!("Using config found at {}", path.display()),
            None => println!("Using built-in scan config"),
        }
    }

    let started = Instant::now();
    let outcome = scan(&args.modules, &config, &policy)?;
    let elapsed = started.elapsed();

    if policy.json {
        let rendered = findings_to_json(&outcome.findings).context("serializing findings")?;
        match &policy.output_path {
            Some(path) => fs::write(path, rendered)
                .with_context(|| format!("writing findings to {}", path.display()))?,
            None => println!("{rendered}"),
        }
    } else {
        let color = std::io::stdout().is_terminal();
        for finding in &outcome.findings {
            print_finding(finding, color, policy.verbose);
        }
        print_summary(&outcome.findings, color);
        println!(
            "\nScan complete! Analysis took {elapsed:?} over {} module(s)",
            outcome.modules_scanned
        );
        println!(
            "sinkscan found {} potentially vulnerable function(s)",
            outcome.findings.len()
        );
    }

    if policy.exit_code && !outcome.findings.is_empty() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
