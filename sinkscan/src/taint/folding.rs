//! Constant folding sub-engine.
//!
//! A recursive evaluator that tries to reduce an SSA value to a single
//! numeric constant, used by the RSA key-length analyzer. Folding is
//! deliberately pessimistic at control-flow merges: a `Phi` folds to the
//! numerically smallest branch value, so that any path able to produce an
//! unsafe length is reported.

use super::call_graph::{return_values, CallGraph};
use crate::ssa::{BinOpKind, ConstValue, Module, ValueId, ValueKind};

/// Minimum acceptable RSA modulus length in bits. The single policy knob
/// of the key-length analyzer.
pub const RECOMMENDED_KEYLEN: i64 = 2048;

/// Attempts to reduce `v` to a single constant.
///
/// Folds literals, the four arithmetic operators (integer division
/// truncates), calls whose static callee has exactly one single-value
/// return, parameters through the first recorded caller, and `Phi` merges
/// to the smallest edge. Anything else fails to fold.
#[must_use]
pub fn eval_const(module: &Module, v: ValueId, cg: &CallGraph) -> Option<ConstValue> {
    match &module[v].kind {
        ValueKind::Const(c) => Some(c.clone()),
        ValueKind::BinOp { op, x, y } => {
            let x = eval_const(module, *x, cg)?;
            let y = eval_const(module, *y, cg)?;
            merge(&x, &y, *op)
        }
        ValueKind::Call(common) => {
            let dest = module.static_callee(common)?;
            let rets = return_values(module, dest);
            match rets.as_slice() {
                [tuple] if tuple.len() == 1 => eval_const(module, tuple[0], cg),
                _ => None,
            }
        }
        // Only the first caller is explored; callers beyond it may disagree.
        ValueKind::Parameter => {
            let callers = cg.resolve_param(module, v);
            let first = callers.first().copied()?;
            eval_const(module, first, cg)
        }
        ValueKind::Phi { edges } => edges
            .iter()
            .filter(|&&edge| edge != v)
            .map(|&edge| match eval_const(module, edge, cg)? {
                ConstValue::Int(n) => Some(n),
                _ => None,
            })
            .collect::<Option<Vec<i64>>>()?
            .into_iter()
            .min()
            .map(ConstValue::Int),
        _ => None,
    }
}

/// Evaluates `x op y` exactly for the foldable operators.
fn merge(x: &ConstValue, y: &ConstValue, op: BinOpKind) -> Option<ConstValue> {
    let (ConstValue::Int(x), ConstValue::Int(y)) = (x, y) else {
        return None;
    };
    let folded = match op {
        BinOpKind::Add => x.wrapping_add(*y),
        BinOpKind::Sub => x.wrapping_sub(*y),
        BinOpKind::Mul => x.wrapping_mul(*y),
        BinOpKind::Div => {
            if *y == 0 {
                return None;
            }
            x.wrapping_div(*y)
        }
        _ => return None,
    };
    Some(ConstValue::Int(folded))
}

/// Recursively checks whether a value used as an RSA bit length can be
/// smaller than [`RECOMMENDED_KEYLEN`] on some path.
#[must_use]
pub fn keylen_check(module: &Module, keylen: ValueId, cg: &CallGraph) -> bool {
    match &module[keylen].kind {
        ValueKind::Const(ConstValue::Int(n)) => *n < RECOMMENDED_KEYLEN,
        ValueKind::Phi { edges } => edges
            .iter()
            .any(|&edge| edge != keylen && keylen_check(module, edge, cg)),
        ValueKind::BinOp { .. } => matches!(
            eval_const(module, keylen, cg),
            Some(ConstValue::Int(n)) if n < RECOMMENDED_KEYLEN
        ),
        ValueKind::Call(common) => module.static_callee(common).is_some_and(|dest| {
            return_values(module, dest).iter().any(|tuple| {
                tuple
                    .first()
                    .is_some_and(|&r| keylen_check(module, r, cg))
            })
        }),
        ValueKind::Parameter => cg
            .resolve_param(module, keylen)
            .first()
            .is_some_and(|&arg| keylen_check(module, arg, cg)),
        _ => false,
    }
}
