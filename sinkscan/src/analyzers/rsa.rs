//! RSA key length analyzer.
//!
//! Resolves the bit-length argument of key generation down to a constant
//! via the folding sub-engine, so lengths computed across call hops and
//! branches are still caught.

use super::{sinks, Analyzer, SinkRule};
use crate::taint::RECOMMENDED_KEYLEN;
use std::collections::BTreeMap;

/// Key generation functions whose second argument is the modulus length.
fn vuln_rsa_funcs() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([sinks("crypto/rsa", &["GenerateKey"])])
}

/// Reports RSA keys generated with fewer than [`RECOMMENDED_KEYLEN`] bits.
#[must_use]
pub fn analyzer() -> Analyzer {
    Analyzer {
        name: "rsa_keylen".to_owned(),
        doc: "reports when rsa keys are too short".to_owned(),
        message: format!(
            "Danger: RSA key length is too short, recommend {RECOMMENDED_KEYLEN}"
        ),
        kind: "CWE-326: Inadequate Encryption Strength".to_owned(),
        rule: SinkRule::RsaKeylen,
        vuln_calls: vuln_rsa_funcs(),
    }
}
