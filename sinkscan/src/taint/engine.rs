//! Taint propagation engine.
//!
//! The memoized, recursive backward walker at the heart of the scanner.
//! Given a sink call and one of its argument values, [`TaintAnalyzer`]
//! walks the value's predecessors in the SSA (operands, phi edges, call
//! returns, referenced allocations, resolved parameters) until it either
//! reaches a declared untrusted source, bottoms out on trivially safe
//! nodes, or exhausts the per-value visit budget.
//!
//! Analyzer state (the taint map and collected sources) is per instance;
//! the module and call graph are shared, read-only references, so distinct
//! analyzers may run in parallel over the same SSA.

use super::call_graph::{return_values, CallGraph};
use super::types::{MapData, SourceCatalog, TaintPolicy, TaintedCode};
use crate::ssa::{Module, Position, ValueId, ValueKind};
use crate::utils::tainted_code;
use rustc_hash::FxHashMap;
use std::hash::Hasher;

/// How many times a single hashed value may be entered before the walk
/// concludes it is looping and gives up on that value.
const VISIT_LIMIT: u32 = 20;

/// Per-sink-call taint analysis state.
pub struct TaintAnalyzer<'a> {
    module: &'a Module,
    sources: &'a SourceCatalog,
    policy: TaintPolicy,
    location: Position,
    taint_map: FxHashMap<u64, MapData>,
    /// Untrusted-input lines contributing to a positive result, deduplicated
    /// by line number.
    pub taint_source: Vec<TaintedCode>,
    /// Advisory diagnostics collected during the walk.
    pub notes: Vec<String>,
}

impl<'a> TaintAnalyzer<'a> {
    /// Creates an analyzer for one sink location. `location` is only used
    /// to anchor advisory diagnostics.
    #[must_use]
    pub fn new(
        module: &'a Module,
        sources: &'a SourceCatalog,
        policy: TaintPolicy,
        location: Position,
    ) -> Self {
        Self {
            module,
            sources,
            policy,
            location,
            taint_map: FxHashMap::default(),
            taint_source: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Recursively traces `val` to all reachable predecessors and reports
    /// whether any of them is a declared untrusted source. `start_call` is
    /// the sink call whose argument is being judged; the sink itself never
    /// taints its own arguments.
    pub fn contains_taint(&mut self, start_call: ValueId, val: ValueId, cg: &CallGraph) -> bool {
        self.recurse(start_call, val, cg, 0, &[])
    }

    #[allow(clippy::too_many_lines)]
    fn recurse(
        &mut self,
        start_call: ValueId,
        vid: ValueId,
        cg: &CallGraph,
        depth: usize,
        visited_mutable: &[ValueId],
    ) -> bool {
        let module = self.module;
        let value = &module[vid];

        if self.policy.debug {
            eprintln!(
                "{:indent$}{} ({})",
                "",
                module.display_value(vid),
                value.kind.tag(),
                indent = depth * 2
            );
        }

        // The sink call cannot become tainted from itself; without this a
        // tainted argument would infect its sibling arguments through the
        // call's referrer edges and duplicate findings.
        if vid == start_call {
            return false;
        }

        // A mutable buffer already entered on this path is assumed fine.
        if visited_mutable.contains(&vid) {
            return false;
        }

        let hash = self.value_hash(vid);
        let status = {
            let entry = self.taint_map.entry(hash).or_default();
            entry.count += 1;
            *entry
        };
        if status.count > VISIT_LIMIT {
            if self.policy.debug {
                eprintln!("visit budget exhausted, breaking the loop");
            }
            return false;
        }
        if status.mapped {
            return status.vulnerable;
        }

        let mut vulnerable = false;

        match &value.kind {
            ValueKind::Const(_)
            | ValueKind::FreeVar
            | ValueKind::Function(_)
            | ValueKind::MakeSlice
            | ValueKind::MakeMap => {}
            ValueKind::Parameter => {
                if let Some(parent) = value.parent {
                    let pkg = module.func(parent).package_name();
                    if self.sources.is_source_function(pkg, &value.name) {
                        vulnerable = true;
                    }
                }
                if self.sources.is_source_type(&value.ty) {
                    vulnerable = true;
                }
                // Only the first caller is explored from here.
                let callers = cg.resolve_param(module, vid);
                if let Some(&first) = callers.first() {
                    vulnerable = vulnerable
                        || self.recurse(start_call, first, cg, depth + 1, visited_mutable);
                }
            }
            ValueKind::UnOp { x, .. }
            | ValueKind::Convert { x }
            | ValueKind::ChangeType { x }
            | ValueKind::ChangeInterface { x }
            | ValueKind::MakeInterface { x }
            | ValueKind::Field { x, .. }
            | ValueKind::FieldAddr { x, .. }
            | ValueKind::IndexAddr { x, .. }
            | ValueKind::Range { x }
            | ValueKind::TypeAssert { x } => {
                vulnerable = self.recurse(start_call, *x, cg, depth + 1, visited_mutable);
            }
            ValueKind::Next { iter } => {
                vulnerable = self.recurse(start_call, *iter, cg, depth + 1, visited_mutable);
            }
            ValueKind::BinOp { x, y, .. } => {
                vulnerable = self.recurse(start_call, *x, cg, depth + 1, visited_mutable)
                    || self.recurse(start_call, *y, cg, depth + 1, visited_mutable);
            }
            // An indexed read is tainted through the collection or the index.
            ValueKind::Index { x, index } | ValueKind::Lookup { x, index } => {
                vulnerable = self.recurse(start_call, *x, cg, depth + 1, visited_mutable)
                    || self.recurse(start_call, *index, cg, depth + 1, visited_mutable);
            }
            ValueKind::Extract { tuple, .. } => {
                vulnerable = self.recurse(start_call, *tuple, cg, depth + 1, visited_mutable);
            }
            ValueKind::Phi { edges } => {
                // Provisional verdict breaks phi cycles; cleared again after
                // the walk so another entry re-checks every edge.
                self.taint_map.insert(
                    hash,
                    MapData {
                        mapped: true,
                        vulnerable: false,
                        count: status.count,
                    },
                );
                for &edge in edges {
                    if edge != vid {
                        vulnerable = vulnerable
                            || self.recurse(start_call, edge, cg, depth + 1, visited_mutable);
                    }
                }
            }
            ValueKind::MakeClosure { func, bindings } => {
                vulnerable = self.recurse(start_call, *func, cg, depth + 1, visited_mutable);
                for &binding in bindings {
                    vulnerable = vulnerable
                        || self.recurse(start_call, binding, cg, depth + 1, visited_mutable);
                }
            }
            ValueKind::Call(common) => {
                if let ValueKind::Function(fid) = module[common.value].kind {
                    let callee = module.func(fid);
                    if self
                        .sources
                        .is_source_function(callee.package_name(), &callee.name)
                    {
                        vulnerable = true;
                    }
                }
                if let Some(dest) = module.static_callee(common) {
                    let returns = return_values(module, dest);
                    if returns.is_empty() {
                        // No analyzable returns: trusting every argument
                        // implies trusting the return value.
                        for &arg in &common.args {
                            vulnerable = vulnerable
                                || self.recurse(start_call, arg, cg, depth + 1, visited_mutable);
                        }
                    } else {
                        for tuple in &returns {
                            if let Some(&first) = tuple.first() {
                                vulnerable = vulnerable
                                    || self.recurse(
                                        start_call,
                                        first,
                                        cg,
                                        depth + 1,
                                        visited_mutable,
                                    );
                            }
                        }
                    }
                } else {
                    for &arg in &common.args {
                        vulnerable = vulnerable
                            || self.recurse(start_call, arg, cg, depth + 1, visited_mutable);
                    }
                    self.notes.push(format!(
                        "{}: couldn't evaluate function statically",
                        self.location
                    ));
                }
            }
            ValueKind::Slice { x } => {
                vulnerable = self.recurse(start_call, *x, cg, depth + 1, visited_mutable);
                // Writes into the slice after its creation reach the sink
                // through the backing buffer; walk every value referrer with
                // this slice marked as entered.
                for &referrer in &value.referrers {
                    if module[referrer].kind.is_value() {
                        let mut entered = visited_mutable.to_vec();
                        entered.push(vid);
                        vulnerable = vulnerable
                            || self.recurse(start_call, referrer, cg, depth + 1, &entered);
                    }
                }
            }
            ValueKind::Alloc => {
                // Provisional verdict breaks referrer cycles through the
                // allocation itself.
                self.taint_map.insert(
                    hash,
                    MapData {
                        mapped: true,
                        vulnerable: false,
                        count: status.count,
                    },
                );
                for &referrer in &value.referrers {
                    match &module[referrer].kind {
                        ValueKind::IndexAddr { .. } => {
                            for &ref2 in &module[referrer].referrers {
                                if let ValueKind::Store { val: stored, .. } = module[ref2].kind {
                                    if self.recurse(
                                        start_call,
                                        stored,
                                        cg,
                                        depth + 1,
                                        visited_mutable,
                                    ) {
                                        vulnerable = true;
                                    }
                                }
                            }
                        }
                        ValueKind::FieldAddr { .. } => {
                            for &ref2 in &module[referrer].referrers {
                                if let ValueKind::Store { val: stored, .. } = module[ref2].kind {
                                    let mut entered = visited_mutable.to_vec();
                                    entered.push(vid);
                                    vulnerable = vulnerable
                                        || self.recurse(start_call, stored, cg, depth + 1, &entered);
                                }
                            }
                        }
                        _ => {}
                    }
                    // Escape through any other instruction reading the
                    // allocation: check each of its operands.
                    for op in module[referrer].kind.operands() {
                        if self.recurse(start_call, op, cg, depth + 1, visited_mutable) {
                            vulnerable = true;
                        }
                    }
                }
            }
            ValueKind::Global { package } => {
                vulnerable = !self.policy.globals_safe;
                let pkg = package.rsplit('/').next().unwrap_or(package);
                if self.sources.is_source_variable(pkg, &value.name) {
                    vulnerable = true;
                }
            }
            ValueKind::Store { .. } | ValueKind::Return { .. } | ValueKind::Opaque { .. } => {
                vulnerable = true;
                if self.policy.debug {
                    eprintln!("unknown SSA value kind: {}", value.kind.tag());
                }
            }
        }

        match &value.kind {
            // Not finally memoized: a later entry from a different path must
            // re-check every edge the provisional verdict short-circuited.
            ValueKind::Phi { .. } => {
                if let Some(entry) = self.taint_map.get_mut(&hash) {
                    entry.mapped = false;
                }
            }
            _ => {
                let entry = self.taint_map.entry(hash).or_default();
                entry.mapped = true;
                entry.vulnerable = entry.vulnerable || vulnerable;
            }
        }

        if vulnerable {
            let code = tainted_code(module, value.parent, &value.pos);
            if code.source_line > 0
                && !self
                    .taint_source
                    .iter()
                    .any(|existing| existing.source_line == code.source_line)
            {
                self.taint_source.push(code);
            }
        }

        vulnerable
    }

    /// FNV-1a 64 hash of the value's canonical textualization together with
    /// its parent function, so that identical locals in different functions
    /// do not alias in the taint map.
    fn value_hash(&self, vid: ValueId) -> u64 {
        let mut hasher = fnv::FnvHasher::default();
        hasher.write(self.module.display_value(vid).as_bytes());
        if let Some(parent) = self.module[vid].parent {
            hasher.write(self.module.func(parent).display().as_bytes());
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssa::builder::ModuleBuilder;

    #[test]
    fn hash_separates_parents() {
        let mut mb = ModuleBuilder::new("m", "main.go");
        let f = mb.function("main", "f", "()", 1);
        let g = mb.function("main", "g", "()", 5);
        let a = mb.push(f, 0, ValueKind::Alloc, "*string", 2);
        let b = mb.push(g, 0, ValueKind::Alloc, "*string", 6);
        let mut module = mb.finish();
        // Force identical registers so only the parent distinguishes them.
        module.values[a.0 as usize].name = "t0".into();
        module.values[b.0 as usize].name = "t0".into();
        let sources = SourceCatalog::default();
        let ta = TaintAnalyzer::new(&module, &sources, TaintPolicy::default(), Position::none());
        assert_ne!(ta.value_hash(a), ta.value_hash(b));
    }
}
