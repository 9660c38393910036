//! SQL injection analyzer.

use super::{sinks, Analyzer, SinkRule};
use std::collections::BTreeMap;

/// Query-submitting methods. Only the query-string argument matters:
/// index 1 for the plain variants, index 2 for the `*Context` variants.
fn vuln_sql_funcs() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([sinks(
        "(*database/sql.DB)",
        &[
            "Exec",
            "ExecContext",
            "Query",
            "QueryContext",
            "QueryRow",
            "QueryRowContext",
        ],
    )])
}

/// Reports when user-controlled input can reach a SQL query string.
#[must_use]
pub fn analyzer() -> Analyzer {
    Analyzer {
        name: "sql_injection".to_owned(),
        doc: "reports when SQL injection can occur".to_owned(),
        message: "Danger: possible SQL injection detected".to_owned(),
        kind: "CWE-89: SQL Injection".to_owned(),
        rule: SinkRule::QueryArg,
        vuln_calls: vuln_sql_funcs(),
    }
}
