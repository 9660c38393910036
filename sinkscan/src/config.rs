//! Scan configuration.
//!
//! Two layers: [`Policy`], the per-run switches set from the command line,
//! and [`ScanConfig`], the TOML file declaring config-driven analyzers and
//! the untrusted-source tables. A default configuration is embedded in the
//! binary and used when no file is supplied.

use crate::taint::types::SourceCatalog;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The default scan configuration shipped with the tool.
pub const DEFAULT_CONFIG: &str = include_str!("../analyzers.toml");

/// Per-run switches, set once at startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct Policy {
    /// When false, package-level variables start out tainted.
    pub globals_safe: bool,
    /// Print the full taint trace for each finding.
    pub verbose: bool,
    /// Print engine debug traces to stderr.
    pub debug: bool,
    /// Emit findings as JSON instead of text.
    pub json: bool,
    /// Exit non-zero when findings remain after filtering.
    pub exit_code: bool,
    /// Write findings to this file instead of stdout.
    pub output_path: Option<PathBuf>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            globals_safe: true,
            verbose: false,
            debug: false,
            json: false,
            exit_code: false,
            output_path: None,
        }
    }
}

/// One config-declared analyzer: documentation, the finding message, and
/// the sink functions to inspect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzerSpec {
    /// Short description of what the analyzer reports.
    #[serde(default)]
    pub doc: String,
    /// Message attached to each finding.
    #[serde(default)]
    pub message: String,
    /// Sink functions, `package -> [function]`. Every argument of a
    /// matching call is taint-checked.
    #[serde(default)]
    pub vuln_calls: BTreeMap<String, Vec<String>>,
}

/// The parsed scan configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanConfig {
    /// Config-declared analyzers by name.
    #[serde(default)]
    pub analyzers: BTreeMap<String, AnalyzerSpec>,
    /// Untrusted-source tables fed to the engine.
    #[serde(default)]
    pub sources: SourceCatalog,
}

/// Failure to load or parse a scan configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The configuration was not valid TOML.
    #[error("invalid scan config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ScanConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The embedded default configuration.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Loads the configuration from `path`, or the embedded default when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml_str(&text)
            }
            None => Self::embedded(),
        }
    }
}
