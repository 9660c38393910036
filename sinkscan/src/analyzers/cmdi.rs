//! Command injection analyzer.

use super::{sinks, Analyzer, SinkRule};
use std::collections::BTreeMap;

/// Process-spawning functions that interpret their arguments.
fn vuln_cmd_injection_funcs() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([sinks("os/exec", &["Command", "CommandContext"])])
}

/// Reports when user-controlled input can reach a process-spawning call.
#[must_use]
pub fn analyzer() -> Analyzer {
    Analyzer {
        name: "command_injection".to_owned(),
        doc: "reports when command injection can occur".to_owned(),
        message: "Danger: possible command injection detected".to_owned(),
        kind: "CWE-78: OS Command Injection".to_owned(),
        rule: SinkRule::AllArgs,
        vuln_calls: vuln_cmd_injection_funcs(),
    }
}
