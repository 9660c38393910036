//! Core types shared across the taint analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about one line of code contributing to a finding, either the
/// vulnerable sink or an untrusted source feeding it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintedCode {
    /// The raw source text of the line.
    pub source_code: String,
    /// File the line came from.
    pub source_filename: String,
    /// 1-based line number, 0 when the value has no position.
    pub source_line: u32,
    /// Human-readable enclosing function, `name (args) results`.
    pub parent_function: String,
}

/// Memoization record for one hashed SSA value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapData {
    /// Whether a verdict has been recorded for the hash.
    pub mapped: bool,
    /// The recorded verdict; monotonic within an engine run.
    pub vulnerable: bool,
    /// How many times the hash has been entered.
    pub count: u32,
}

/// Untrusted-source symbol tables, keyed by short package name.
///
/// Mirrors the `[sources]` section of the scan configuration: package-level
/// variables, functions whose return values are attacker-controlled, and
/// types whose instances are attacker-controlled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceCatalog {
    /// Package-level variables treated as tainted, `pkg -> [names]`.
    #[serde(default)]
    pub variables: BTreeMap<String, Vec<String>>,
    /// Functions whose return values are tainted, `pkg -> [names]`.
    #[serde(default)]
    pub functions: BTreeMap<String, Vec<String>>,
    /// Types whose instances are tainted, `pkg -> [names]`.
    #[serde(default)]
    pub types: BTreeMap<String, Vec<String>>,
}

impl SourceCatalog {
    /// Whether `pkg` declares `name` in the given table.
    fn lists(table: &BTreeMap<String, Vec<String>>, pkg: &str, name: &str) -> bool {
        table
            .get(pkg)
            .is_some_and(|names| names.iter().any(|n| n == name))
    }

    /// Whether a function `pkg.name` is a declared untrusted source.
    #[must_use]
    pub fn is_source_function(&self, pkg: &str, name: &str) -> bool {
        Self::lists(&self.functions, pkg, name)
    }

    /// Whether a package-level variable `pkg.name` is declared untrusted.
    #[must_use]
    pub fn is_source_variable(&self, pkg: &str, name: &str) -> bool {
        Self::lists(&self.variables, pkg, name)
    }

    /// Whether a type string matches a declared untrusted type. A single
    /// leading `*` is stripped before comparing against `pkg.type`.
    #[must_use]
    pub fn is_source_type(&self, ty: &str) -> bool {
        let bare = ty.strip_prefix('*').unwrap_or(ty);
        self.types.iter().any(|(pkg, names)| {
            names.iter().any(|t| {
                bare.strip_prefix(pkg.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|rest| rest == t)
            })
        })
    }
}

/// Policy switches consumed by the engine, set once at startup.
#[derive(Debug, Clone, Copy)]
pub struct TaintPolicy {
    /// When false, every package-level variable starts out tainted.
    pub globals_safe: bool,
    /// Emit per-step engine traces to stderr.
    pub debug: bool,
}

impl Default for TaintPolicy {
    fn default() -> Self {
        Self {
            globals_safe: true,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SourceCatalog {
        let mut c = SourceCatalog::default();
        c.functions
            .insert("bufio".into(), vec!["ReadString".into()]);
        c.variables.insert("os".into(), vec!["Args".into()]);
        c.types.insert("net/http".into(), vec!["Request".into()]);
        c
    }

    #[test]
    fn function_and_variable_lookup() {
        let c = catalog();
        assert!(c.is_source_function("bufio", "ReadString"));
        assert!(!c.is_source_function("bufio", "ReadRune"));
        assert!(c.is_source_variable("os", "Args"));
        assert!(!c.is_source_variable("os", "Getenv"));
    }

    #[test]
    fn type_lookup_strips_one_pointer() {
        let c = catalog();
        assert!(c.is_source_type("net/http.Request"));
        assert!(c.is_source_type("*net/http.Request"));
        assert!(!c.is_source_type("**net/http.Request"));
        assert!(!c.is_source_type("net/http.Client"));
    }
}
