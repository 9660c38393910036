//! Finding records and their rendering.
//!
//! A [`Finding`] ties a vulnerable sink line to the untrusted-input lines
//! that reach it. Rendering is plain text with optional color, or JSON for
//! machine consumption.

use crate::taint::types::TaintedCode;
use crate::utils::grab_source_code;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;

/// A single reported vulnerability.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    /// Human-readable description of the risk.
    pub message: String,
    /// The sink line and its enclosing function.
    pub vulnerable_function: TaintedCode,
    /// Untrusted-input lines contributing to the result, most relevant
    /// first. Empty for findings that are not taint-based.
    pub untrusted_source: Vec<TaintedCode>,
    /// Finding category, e.g. `CWE-89: SQL Injection`.
    pub kind: String,
}

impl Finding {
    /// Creates a finding record.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        vulnerable_function: TaintedCode,
        untrusted_source: Vec<TaintedCode>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            vulnerable_function,
            untrusted_source,
            kind: kind.into(),
        }
    }
}

/// Whether a taint finding should be reported. Discards findings with no
/// untrusted source, findings whose source and sink are the same line of
/// code, and channel-origin false positives.
#[must_use]
pub fn is_valid_finding(finding: &Finding) -> bool {
    let Some(first) = finding.untrusted_source.first() else {
        return false;
    };
    if finding.vulnerable_function.source_code == first.source_code {
        return false;
    }
    if first.source_code.contains("make(chan") {
        return false;
    }
    true
}

/// Reduces `name (args) results` to `name(...) results` for display.
#[must_use]
pub fn strip_arguments(parent_function: &str) -> String {
    let name = parent_function.split('(').next().unwrap_or("").trim();
    let results = parent_function
        .split_once(')')
        .map(|(_, rest)| rest)
        .unwrap_or("");
    format!("{name}(...){results}")
}

fn context(filename: &str, line: u32) {
    if line > 1 {
        println!("      {}:\t{}", line - 1, grab_source_code(filename, line - 1));
    }
}

fn print_located(code: &TaintedCode, label: &str) {
    println!("\n{}:{}", code.source_filename, code.source_line);
    println!("{label}: [ {} ]", strip_arguments(&code.parent_function));
    context(&code.source_filename, code.source_line);
    println!("    > {}:\t{}", code.source_line, code.source_code);
    println!(
        "      {}:\t{}",
        code.source_line + 1,
        grab_source_code(&code.source_filename, code.source_line + 1)
    );
}

/// Prints one finding: the categorized message, the sink with surrounding
/// context, the primary untrusted source, and (verbose) the full trace.
pub fn print_finding(finding: &Finding, color: bool, verbose: bool) {
    if color {
        println!(
            "\n({}) {}",
            finding.kind.cyan(),
            finding.message.yellow()
        );
    } else {
        println!("\n({}) {}", finding.kind, finding.message);
    }
    print_located(&finding.vulnerable_function, "Vulnerable Function");

    if let Some(source) = finding.untrusted_source.first() {
        print_located(source, "Source of Untrusted Input");

        if verbose {
            let banner = "############################### FULL TRACE ###############################";
            if color {
                println!("\n{}", banner.green());
            } else {
                println!("\n{banner}");
            }
            println!("\nUntrusted Input Source:");
            for source in &finding.untrusted_source {
                println!(
                    "{}:{}:\n[ {} ]\n>>>\t{}",
                    source.source_filename,
                    source.source_line,
                    strip_arguments(&source.parent_function),
                    source.source_code.trim_start()
                );
            }
        }
    }
    println!("------------------------------------------------------------------------------");
}

/// Prints the per-category totals.
pub fn print_summary(findings: &[Finding], color: bool) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for finding in findings {
        *counts.entry(&finding.kind).or_default() += 1;
    }
    for (kind, count) in counts {
        if color {
            println!(
                "Identified {} potential {}",
                count.to_string().yellow(),
                kind.cyan()
            );
        } else {
            println!("Identified {count} potential {kind}");
        }
    }
}

/// Serializes findings as pretty JSON.
pub fn findings_to_json(findings: &[Finding]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(text: &str, line: u32) -> TaintedCode {
        TaintedCode {
            source_code: text.to_owned(),
            source_filename: "main.go".to_owned(),
            source_line: line,
            parent_function: "main ()".to_owned(),
        }
    }

    #[test]
    fn empty_source_list_is_invalid() {
        let f = Finding::new("m", code("sink", 4), vec![], "CWE-78");
        assert!(!is_valid_finding(&f));
    }

    #[test]
    fn identical_source_and_sink_is_invalid() {
        let f = Finding::new("m", code("x := y", 4), vec![code("x := y", 4)], "CWE-78");
        assert!(!is_valid_finding(&f));
    }

    #[test]
    fn channel_origin_is_invalid() {
        let f = Finding::new(
            "m",
            code("run(c)", 9),
            vec![code("c := make(chan string)", 2)],
            "CWE-78",
        );
        assert!(!is_valid_finding(&f));
    }

    #[test]
    fn distinct_lines_are_valid() {
        let f = Finding::new("m", code("run(x)", 9), vec![code("x := read()", 2)], "CWE-78");
        assert!(is_valid_finding(&f));
    }

    #[test]
    fn strip_arguments_keeps_name_and_results() {
        assert_eq!(
            strip_arguments("handler (w ResponseWriter, r *Request)"),
            "handler(...)"
        );
        assert_eq!(
            strip_arguments("load (path string) (string, error)"),
            "load(...) (string, error)"
        );
    }
}
