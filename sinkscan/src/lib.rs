//! sinkscan: a demand-driven static taint analyzer over SSA.
//!
//! Traces whether untrusted inputs (standard input readers, request
//! objects, declared variables) can reach dangerous operations (process
//! spawning, SQL query submission, file opens, outgoing HTTP requests) in
//! a program already lowered to Static Single Assignment form, and reports
//! inadequate RSA key lengths via constant folding.
//!
//! The SSA itself is produced by an external loading layer and consumed
//! here either in serialized form ([`ssa::Module::from_json_file`]) or
//! through the in-process builder ([`ssa::builder::ModuleBuilder`]).

/// Per-vulnerability analyzers and the sink catalog.
pub mod analyzers;
/// Command line interface definitions.
pub mod cli;
/// Policy flags and the TOML scan configuration.
pub mod config;
/// Finding records and rendering.
pub mod report;
/// The scan driver.
pub mod scan;
/// The SSA value model and builder.
pub mod ssa;
/// Taint propagation: call graph, engine, constant folding.
pub mod taint;
/// Source-line retrieval helpers.
pub mod utils;

pub use report::Finding;
pub use scan::{scan, scan_module, ScanError, ScanOutcome};
pub use taint::{CallGraph, SourceCatalog, TaintAnalyzer, TaintPolicy};
