//! Tests for scan configuration parsing and the analyzer set.
#![allow(clippy::unwrap_used)]

use sinkscan::analyzers::SinkRule;
use sinkscan::config::{Policy, ScanConfig};
use sinkscan::scan::analyzer_set;
use std::io::Write;

#[test]
fn parses_analyzers_and_sources() {
    let text = r#"
[analyzers.log_forgery]
doc = "reports when log entries can be forged"
message = "Danger: possible log forgery detected"

[analyzers.log_forgery.vuln_calls]
log = ["Printf", "Println"]
"log/syslog" = ["Info"]

[sources.variables]
os = ["Args"]

[sources.functions]
bufio = ["ReadString"]

[sources.types]
"net/http" = ["Request"]
"#;
    let config = ScanConfig::from_toml_str(text).unwrap();
    let spec = &config.analyzers["log_forgery"];
    assert_eq!(spec.message, "Danger: possible log forgery detected");
    assert_eq!(spec.vuln_calls["log"], vec!["Printf", "Println"]);
    assert_eq!(spec.vuln_calls["log/syslog"], vec!["Info"]);
    assert!(config.sources.is_source_function("bufio", "ReadString"));
    assert!(config.sources.is_source_type("*net/http.Request"));
}

#[test]
fn missing_sections_default_to_empty() {
    let config = ScanConfig::from_toml_str("").unwrap();
    assert!(config.analyzers.is_empty());
    assert!(config.sources.functions.is_empty());
    assert!(config.sources.variables.is_empty());
    assert!(config.sources.types.is_empty());
}

#[test]
fn malformed_config_is_an_error() {
    assert!(ScanConfig::from_toml_str("analyzers = 3").is_err());
}

#[test]
fn load_prefers_the_given_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sources.functions]\nfmt = [\"Sscanf\"]").unwrap();
    file.flush().unwrap();
    let config = ScanConfig::load(Some(file.path())).unwrap();
    assert!(config.sources.is_source_function("fmt", "Sscanf"));
    // The embedded defaults are not merged in.
    assert!(!config.sources.is_source_function("bufio", "ReadString"));
}

#[test]
fn load_missing_file_is_an_error() {
    assert!(ScanConfig::load(Some(std::path::Path::new("/no/such/config.toml"))).is_err());
}

#[test]
fn analyzer_set_appends_config_declared_analyzers() {
    let text = r#"
[analyzers.log_forgery]
message = "Danger"

[analyzers.log_forgery.vuln_calls]
log = ["Printf"]
"#;
    let config = ScanConfig::from_toml_str(text).unwrap();
    let set = analyzer_set(&config);
    let builtin_count = sinkscan::analyzers::builtin().len();
    assert_eq!(set.len(), builtin_count + 1);
    let generic = set.last().unwrap();
    assert_eq!(generic.name, "log_forgery");
    assert_eq!(generic.rule, SinkRule::AllArgs);
    assert_eq!(generic.kind, "log_forgery");
}

#[test]
fn default_policy_is_conservative() {
    let policy = Policy::default();
    assert!(policy.globals_safe);
    assert!(!policy.verbose);
    assert!(!policy.debug);
    assert!(!policy.json);
    assert!(!policy.exit_code);
    assert!(policy.output_path.is_none());
}
