//! Per-vulnerability analyzers.
//!
//! Each analyzer pairs a sink catalog (`package -> [function]`) with an
//! argument-selection rule and a finding category. Running an analyzer
//! enumerates the call graph's sites for each sink and judges the selected
//! arguments with a fresh [`TaintAnalyzer`] per call site.

/// Command injection sinks.
pub mod cmdi;
/// Analyzers declared in the scan configuration.
pub mod generic;
/// RSA key length checking.
pub mod rsa;
/// SQL injection sinks.
pub mod sqli;
/// Server-side request forgery sinks.
pub mod ssrf;
/// Path traversal sinks.
pub mod traversal;

use crate::report::{is_valid_finding, Finding};
use crate::ssa::{Module, ValueKind};
use crate::taint::{keylen_check, CallGraph, SourceCatalog, TaintAnalyzer, TaintPolicy};
use crate::utils::tainted_code;
use std::collections::BTreeMap;

/// How an analyzer selects and judges the arguments of a sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkRule {
    /// Taint-check every argument.
    AllArgs,
    /// Taint-check only the first argument.
    FirstArg,
    /// Taint-check the query string: argument 1, or 2 for `*Context`
    /// variants.
    QueryArg,
    /// Method calls on an HTTP client: skip the receiver, and skip the call
    /// entirely when the client's transport installs a connection-control
    /// callback.
    HttpClient,
    /// Fold argument 1 to a constant and compare it against the
    /// recommended key length; no taint walk.
    RsaKeylen,
}

/// A configured sink analyzer.
#[derive(Debug, Clone)]
pub struct Analyzer {
    /// Identifier, e.g. `command_injection`.
    pub name: String,
    /// Short description of what the analyzer reports.
    pub doc: String,
    /// Message attached to each finding.
    pub message: String,
    /// Finding category, e.g. `CWE-78: OS Command Injection`.
    pub kind: String,
    /// Argument-selection rule.
    pub rule: SinkRule,
    /// Sink functions, `package -> [function]`.
    pub vuln_calls: BTreeMap<String, Vec<String>>,
}

impl Analyzer {
    /// Runs this analyzer over one module and its call graph, returning the
    /// findings that survive the validity filter.
    #[must_use]
    pub fn run(
        &self,
        module: &Module,
        cg: &CallGraph,
        sources: &SourceCatalog,
        policy: TaintPolicy,
    ) -> Vec<Finding> {
        let mut results = Vec::new();
        for (pkg, funcs) in &self.vuln_calls {
            for func in funcs {
                let qualified = format!("{pkg}.{func}");
                for site in cg.callers_of(&qualified) {
                    let ValueKind::Call(common) = &module[site.call].kind else {
                        continue;
                    };
                    let target = || {
                        tainted_code(module, Some(site.caller), &module[site.call].pos)
                    };

                    if self.rule == SinkRule::RsaKeylen {
                        if let Some(&arg) = common.args.get(1) {
                            if keylen_check(module, arg, cg) {
                                results.push(Finding::new(
                                    &self.message,
                                    target(),
                                    Vec::new(),
                                    &self.kind,
                                ));
                            }
                        }
                        continue;
                    }

                    let indices: Vec<usize> = match self.rule {
                        SinkRule::AllArgs => (0..common.args.len()).collect(),
                        SinkRule::FirstArg => vec![0],
                        SinkRule::QueryArg => {
                            vec![if func.contains("Context") { 2 } else { 1 }]
                        }
                        SinkRule::HttpClient => {
                            if pkg.starts_with("(*") {
                                // The receiver is not part of the request;
                                // a client with a custom connection-control
                                // callback is considered safe outright.
                                let guarded = common.args.first().is_some_and(|&recv| {
                                    !ssrf::transport_unguarded(module, recv)
                                });
                                if guarded {
                                    continue;
                                }
                                (1..common.args.len()).collect()
                            } else {
                                (0..common.args.len()).collect()
                            }
                        }
                        SinkRule::RsaKeylen => continue,
                    };

                    let mut ta = TaintAnalyzer::new(
                        module,
                        sources,
                        policy,
                        module.func(site.caller).pos.clone(),
                    );
                    for i in indices {
                        let Some(&arg) = common.args.get(i) else {
                            continue;
                        };
                        if ta.contains_taint(site.call, arg, cg) {
                            let finding = Finding::new(
                                &self.message,
                                target(),
                                ta.taint_source.clone(),
                                &self.kind,
                            );
                            if is_valid_finding(&finding) {
                                results.push(finding);
                            }
                        }
                    }
                    if policy.debug {
                        for note in &ta.notes {
                            eprintln!("warning: {note}");
                        }
                    }
                }
            }
        }
        results
    }
}

/// The built-in analyzer catalog.
#[must_use]
pub fn builtin() -> Vec<Analyzer> {
    vec![
        rsa::analyzer(),
        traversal::analyzer(),
        sqli::analyzer(),
        cmdi::analyzer(),
        ssrf::analyzer(),
    ]
}

/// Builds one `package -> [function]` catalog entry.
fn sinks(pkg: &str, funcs: &[&str]) -> (String, Vec<String>) {
    (
        pkg.to_owned(),
        funcs.iter().map(|f| (*f).to_owned()).collect(),
    )
}
