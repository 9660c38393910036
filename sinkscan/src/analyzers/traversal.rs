//! Path traversal analyzer.

use super::{sinks, Analyzer, SinkRule};
use std::collections::BTreeMap;

/// File-opening functions whose first argument is a path.
fn vuln_traversal_funcs() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        sinks("os", &["Create", "Open", "OpenFile"]),
        sinks("io/ioutil", &["ReadFile", "WriteFile"]),
    ])
}

/// Reports when user-controlled input can reach a filesystem path.
#[must_use]
pub fn analyzer() -> Analyzer {
    Analyzer {
        name: "path_traversal".to_owned(),
        doc: "reports when path traversal can occur".to_owned(),
        message: "Danger: possible path traversal detected".to_owned(),
        kind: "CWE-22: Path Traversal".to_owned(),
        rule: SinkRule::FirstArg,
        vuln_calls: vuln_traversal_funcs(),
    }
}
