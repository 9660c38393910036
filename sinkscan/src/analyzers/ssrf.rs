//! Server-side request forgery analyzer.

use super::{sinks, Analyzer, SinkRule};
use crate::ssa::{ConstValue, Module, ValueId, ValueKind};
use std::collections::BTreeMap;

/// Type of the transport's dial callback field.
const DIAL_CONTEXT_TYPE: &str =
    "*func(ctx context.Context, network string, addr string) (net.Conn, error)";

/// Type of the dialer's connection-control callback field.
const CONTROL_TYPE: &str = "*func(network string, address string, c syscall.RawConn) error";

/// Request-issuing functions. The package-level helpers are checked on
/// every argument; client methods skip the receiver.
fn vuln_ssrf_funcs() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        sinks("net/http", &["Do", "Get", "Head", "Post", "PostForm"]),
        sinks("(*net/http.Client)", &["Do", "Get", "Head", "Post", "PostForm"]),
    ])
}

/// Whether a client receiver lacks a connection-control callback.
///
/// Structural recognizer, not a taint walk: descends from the client
/// allocation through its transport field into the dialer, and reports
/// `false` as soon as a non-nil `Control` callback is stored. Such a client
/// vets every outgoing connection and is treated as safe regardless of its
/// request arguments.
#[must_use]
pub fn transport_unguarded(module: &Module, receiver: ValueId) -> bool {
    let ValueKind::Alloc = module[receiver].kind else {
        return true;
    };
    for &field in &module[receiver].referrers {
        if !matches!(module[field].kind, ValueKind::FieldAddr { .. }) {
            continue;
        }
        for &store in &module[field].referrers {
            let ValueKind::Store { val, .. } = module[store].kind else {
                continue;
            };
            let ValueKind::MakeInterface { x } = module[val].kind else {
                continue;
            };
            if !matches!(module[x].kind, ValueKind::Alloc) {
                continue;
            }
            // x is the transport allocation; look for its dial callback.
            for &dial_field in &module[x].referrers {
                if !matches!(module[dial_field].kind, ValueKind::FieldAddr { .. })
                    || module[dial_field].ty != DIAL_CONTEXT_TYPE
                {
                    continue;
                }
                for &dial_store in &module[dial_field].referrers {
                    let ValueKind::Store { val: dial_val, .. } = module[dial_store].kind else {
                        continue;
                    };
                    let ValueKind::MakeClosure { ref bindings, .. } = module[dial_val].kind
                    else {
                        continue;
                    };
                    for &binding in bindings {
                        if !matches!(module[binding].kind, ValueKind::Alloc) {
                            continue;
                        }
                        for &control_field in &module[binding].referrers {
                            if !matches!(module[control_field].kind, ValueKind::FieldAddr { .. })
                                || module[control_field].ty != CONTROL_TYPE
                            {
                                continue;
                            }
                            for &control_store in &module[control_field].referrers {
                                let ValueKind::Store {
                                    val: control_val, ..
                                } = module[control_store].kind
                                else {
                                    continue;
                                };
                                if !matches!(
                                    module[control_val].kind,
                                    ValueKind::Const(ConstValue::Nil)
                                ) {
                                    return false;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    true
}

/// Reports when user-controlled input can reach an outgoing HTTP request.
#[must_use]
pub fn analyzer() -> Analyzer {
    Analyzer {
        name: "ssrf".to_owned(),
        doc: "reports when SSRF vulnerabilities can occur".to_owned(),
        message: "Danger: possible SSRF detected".to_owned(),
        kind: "CWE-918: Server-Side Request Forgery".to_owned(),
        rule: SinkRule::HttpClient,
        vuln_calls: vuln_ssrf_funcs(),
    }
}
