//! Call graph construction.
//!
//! A per-module index from fully qualified callee name to the static call
//! sites invoking it, used to resolve parameters back to caller arguments
//! and to enumerate sink invocations. Built once per module by a single
//! dominator-preorder walk of every function; read-only afterwards.

use crate::ssa::{FuncId, Module, ValueId, ValueKind};
use rustc_hash::FxHashMap;

/// One static call of a function: the call instruction and the function it
/// appears in.
#[derive(Debug, Clone, Copy)]
pub struct CallSite {
    /// The `Call` value.
    pub call: ValueId,
    /// The enclosing caller.
    pub caller: FuncId,
}

/// Index from fully qualified callee name to its call sites, in caller
/// walk order.
#[derive(Debug, Default)]
pub struct CallGraph {
    sites: FxHashMap<String, Vec<CallSite>>,
}

impl CallGraph {
    /// Builds the index over every function of `module`.
    #[must_use]
    pub fn build(module: &Module) -> Self {
        let mut cg = Self::default();
        for (fid, _) in module.functions() {
            cg.add_function(module, fid);
        }
        cg
    }

    /// Records every statically resolved call inside `fid`. Indirect and
    /// interface calls have no static callee and are skipped; the engine
    /// handles them through its argument fallback.
    pub fn add_function(&mut self, module: &Module, fid: FuncId) {
        for block in &module.func(fid).blocks {
            for &instr in &block.instrs {
                if let ValueKind::Call(common) = &module[instr].kind {
                    if let Some(callee) = module.static_callee(common) {
                        self.sites
                            .entry(module.func(callee).qualified_name())
                            .or_default()
                            .push(CallSite {
                                call: instr,
                                caller: fid,
                            });
                    }
                }
            }
        }
    }

    /// The recorded call sites of a fully qualified function name.
    #[must_use]
    pub fn callers_of(&self, name: &str) -> &[CallSite] {
        self.sites.get(name).map_or(&[], Vec::as_slice)
    }

    /// Resolves a parameter to the actual argument supplied at each
    /// recorded call site of its function, in call-site order.
    ///
    /// The parameter's index is determined by source-position equality
    /// against the parent's parameter list. Entry points, library exports
    /// and dead code have no recorded callers and resolve to an empty list.
    #[must_use]
    pub fn resolve_param(&self, module: &Module, p: ValueId) -> Vec<ValueId> {
        let Some(fid) = module[p].parent else {
            return Vec::new();
        };
        let func = module.func(fid);
        let Some(idx) = func
            .params
            .iter()
            .position(|&q| module[q].pos == module[p].pos)
        else {
            return Vec::new();
        };
        self.callers_of(&func.qualified_name())
            .iter()
            .filter_map(|site| match &module[site.call].kind {
                ValueKind::Call(common) => common.args.get(idx).copied(),
                _ => None,
            })
            .collect()
    }
}

/// Collects the result tuple of every returning block of `fid`: a block
/// with no successors whose terminator is a `Return`. A function has one
/// entry per early-return path; external declarations have none.
#[must_use]
pub fn return_values(module: &Module, fid: FuncId) -> Vec<Vec<ValueId>> {
    module
        .func(fid)
        .blocks
        .iter()
        .filter(|block| block.succs.is_empty())
        .filter_map(|block| {
            block.instrs.last().and_then(|&last| {
                if let ValueKind::Return { results } = &module[last].kind {
                    Some(results.clone())
                } else {
                    None
                }
            })
        })
        .collect()
}
