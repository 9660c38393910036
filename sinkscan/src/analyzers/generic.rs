//! Analyzers declared in the scan configuration.
//!
//! A config-declared analyzer is a plain taint analyzer over custom sinks:
//! every argument of each listed call is checked against the configured
//! untrusted sources.

use super::{Analyzer, SinkRule};
use crate::config::AnalyzerSpec;

/// Builds an analyzer from a `[analyzers.<name>]` config entry. The entry
/// name doubles as the finding category.
#[must_use]
pub fn from_spec(name: &str, spec: &AnalyzerSpec) -> Analyzer {
    Analyzer {
        name: name.to_owned(),
        doc: spec.doc.clone(),
        message: spec.message.clone(),
        kind: name.to_owned(),
        rule: SinkRule::AllArgs,
        vuln_calls: spec.vuln_calls.clone(),
    }
}
