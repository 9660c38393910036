//! Scan driver.
//!
//! Loads serialized SSA modules, builds a call graph per module, runs every
//! analyzer over it, and collects the surviving findings. Analyzers run in
//! parallel: each owns its own taint state, while the module and call graph
//! are shared read-only.

use crate::analyzers::{self, generic, Analyzer};
use crate::config::{ConfigError, Policy, ScanConfig};
use crate::report::Finding;
use crate::ssa::{Module, ModuleError};
use crate::taint::{CallGraph, TaintPolicy};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to complete a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A module file could not be loaded.
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// The scan configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a scan produced.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Findings that survived the validity filter, in analyzer order.
    pub findings: Vec<Finding>,
    /// How many modules were scanned.
    pub modules_scanned: usize,
}

/// The analyzer set for a configuration: built-ins plus config-declared
/// analyzers.
#[must_use]
pub fn analyzer_set(config: &ScanConfig) -> Vec<Analyzer> {
    let mut set = analyzers::builtin();
    for (name, spec) in &config.analyzers {
        set.push(generic::from_spec(name, spec));
    }
    set
}

/// Scans each module file with the full analyzer set.
pub fn scan(
    paths: &[PathBuf],
    config: &ScanConfig,
    policy: &Policy,
) -> Result<ScanOutcome, ScanError> {
    let set = analyzer_set(config);
    let taint_policy = TaintPolicy {
        globals_safe: policy.globals_safe,
        debug: policy.debug,
    };

    let mut findings = Vec::new();
    for path in paths {
        let module = Module::from_json_file(path)?;
        let cg = CallGraph::build(&module);
        let mut module_findings: Vec<Finding> = set
            .par_iter()
            .flat_map_iter(|analyzer| analyzer.run(&module, &cg, &config.sources, taint_policy))
            .collect();
        findings.append(&mut module_findings);
    }

    if let Ok(cwd) = std::env::current_dir() {
        trim_path_prefix(&mut findings, &cwd);
    }

    Ok(ScanOutcome {
        findings,
        modules_scanned: paths.len(),
    })
}

/// Scans a module already in memory; the library-level entry point.
#[must_use]
pub fn scan_module(module: &Module, config: &ScanConfig, policy: &Policy) -> Vec<Finding> {
    let set = analyzer_set(config);
    let taint_policy = TaintPolicy {
        globals_safe: policy.globals_safe,
        debug: policy.debug,
    };
    let cg = CallGraph::build(module);
    set.par_iter()
        .flat_map_iter(|analyzer| analyzer.run(module, &cg, &config.sources, taint_policy))
        .collect()
}

/// Rewrites finding filenames relative to `prefix` for display.
pub fn trim_path_prefix(findings: &mut [Finding], prefix: &Path) {
    let prefix = format!("{}/", prefix.display());
    let trim = |name: &mut String| {
        if let Some(rest) = name.strip_prefix(&prefix) {
            *name = rest.to_owned();
        }
    };
    for finding in findings {
        trim(&mut finding.vulnerable_function.source_filename);
        for source in &mut finding.untrusted_source {
            trim(&mut source.source_filename);
        }
    }
}
