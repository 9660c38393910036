//! Taint Analysis Module
//!
//! Demand-driven, backward taint propagation over the SSA model: given an
//! argument reaching a dangerous sink, decides whether the value can derive
//! from a declared untrusted source.
//!
//! # Components
//! - **Call graph**: callee name to call sites, for inter-procedural flow
//! - **Engine**: the memoized recursive walker
//! - **Folding**: constant evaluation for the key-length analyzer

/// Call graph construction and parameter/return resolution.
pub mod call_graph;
/// The taint propagation engine.
pub mod engine;
/// Constant folding sub-engine.
pub mod folding;
/// Common types used throughout taint analysis.
pub mod types;

pub use call_graph::{return_values, CallGraph, CallSite};
pub use engine::TaintAnalyzer;
pub use folding::{eval_const, keylen_check, RECOMMENDED_KEYLEN};
pub use types::{SourceCatalog, TaintPolicy, TaintedCode};
