//! Tests for the constant folding sub-engine and the RSA analyzer.
#![allow(clippy::unwrap_used)]

use sinkscan::analyzers::rsa;
use sinkscan::ssa::builder::ModuleBuilder;
use sinkscan::ssa::{BinOpKind, ConstValue, FuncId, ValueId, ValueKind};
use sinkscan::taint::{eval_const, keylen_check, CallGraph, SourceCatalog, TaintPolicy};

fn binop(mb: &mut ModuleBuilder, f: FuncId, op: BinOpKind, x: ValueId, y: ValueId) -> ValueId {
    mb.push(f, 0, ValueKind::BinOp { op, x, y }, "int", 2)
}

fn int_of(folded: Option<ConstValue>) -> i64 {
    match folded {
        Some(ConstValue::Int(n)) => n,
        other => panic!("expected integer constant, got {other:?}"),
    }
}

// ============================================================================
// eval_const
// ============================================================================

#[test]
fn folds_arithmetic_exactly() {
    let mut mb = ModuleBuilder::new("m", "main.go");
    let f = mb.function("m", "main", "()", 1);
    let a = mb.const_int(500, "int");
    let b = mb.const_int(1000, "int");
    let sum = binop(&mut mb, f, BinOpKind::Add, a, b);
    let seven = mb.const_int(7, "int");
    let two = mb.const_int(2, "int");
    let quot = binop(&mut mb, f, BinOpKind::Div, seven, two);
    let diff = binop(&mut mb, f, BinOpKind::Sub, a, b);
    let prod = binop(&mut mb, f, BinOpKind::Mul, a, two);
    mb.ret(f, 0, vec![], 3);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert_eq!(int_of(eval_const(&module, sum, &cg)), 1500);
    // Integer division truncates.
    assert_eq!(int_of(eval_const(&module, quot, &cg)), 3);
    assert_eq!(int_of(eval_const(&module, diff, &cg)), -500);
    assert_eq!(int_of(eval_const(&module, prod, &cg)), 1000);
}

#[test]
fn unfoldable_operators_and_kinds_fail() {
    let mut mb = ModuleBuilder::new("m", "main.go");
    let f = mb.function("m", "main", "()", 1);
    let a = mb.const_int(8, "int");
    let b = mb.const_int(3, "int");
    let rem = binop(&mut mb, f, BinOpKind::Rem, a, b);
    let zero = mb.const_int(0, "int");
    let div0 = binop(&mut mb, f, BinOpKind::Div, a, zero);
    let alloc = mb.push(f, 0, ValueKind::Alloc, "*int", 2);
    mb.ret(f, 0, vec![], 3);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert!(eval_const(&module, rem, &cg).is_none());
    assert!(eval_const(&module, div0, &cg).is_none());
    assert!(eval_const(&module, alloc, &cg).is_none());
}

#[test]
fn phi_folds_to_smallest_edge() {
    let mut mb = ModuleBuilder::new("m", "main.go");
    let f = mb.function("m", "main", "()", 1);
    let big = mb.const_int(4096, "int");
    let small = mb.const_int(1024, "int");
    let phi = mb.push(
        f,
        0,
        ValueKind::Phi {
            edges: vec![big, small],
        },
        "int",
        2,
    );
    mb.ret(f, 0, vec![], 3);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert_eq!(int_of(eval_const(&module, phi, &cg)), 1024);
}

#[test]
fn phi_with_unfoldable_edge_fails() {
    let mut mb = ModuleBuilder::new("m", "main.go");
    let f = mb.function("m", "main", "()", 1);
    let lit = mb.const_int(4096, "int");
    let alloc = mb.push(f, 0, ValueKind::Alloc, "*int", 2);
    let phi = mb.push(
        f,
        0,
        ValueKind::Phi {
            edges: vec![lit, alloc],
        },
        "int",
        2,
    );
    mb.ret(f, 0, vec![], 3);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert!(eval_const(&module, phi, &cg).is_none());
}

#[test]
fn folds_through_single_return_call_and_parameter() {
    // size() { return pick(1024) }; pick(n) { return n }
    let mut mb = ModuleBuilder::new("m", "main.go");
    let pick = mb.function("m", "pick", "(n int) int", 1);
    let n = mb.param(pick, "n", "int", 1);
    mb.ret(pick, 0, vec![n], 2);

    let size = mb.function("m", "size", "() int", 4);
    let lit = mb.const_int(1024, "int");
    let call_pick = mb.call(size, 0, pick, vec![lit], "int", 5);
    mb.ret(size, 0, vec![call_pick], 5);

    let main_fn = mb.function("m", "main", "()", 7);
    let call_size = mb.call(main_fn, 0, size, vec![], "int", 8);
    mb.ret(main_fn, 0, vec![], 9);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert_eq!(int_of(eval_const(&module, call_size, &cg)), 1024);
}

// ============================================================================
// keylen_check
// ============================================================================

#[test]
fn constant_round_trip_against_threshold() {
    let mut mb = ModuleBuilder::new("m", "main.go");
    let f = mb.function("m", "main", "()", 1);
    let short = mb.const_int(2047, "int");
    let exact = mb.const_int(2048, "int");
    let long = mb.const_int(4096, "int");
    mb.ret(f, 0, vec![], 2);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert!(keylen_check(&module, short, &cg));
    assert!(!keylen_check(&module, exact, &cg));
    assert!(!keylen_check(&module, long, &cg));
}

#[test]
fn any_short_phi_edge_is_reported() {
    let mut mb = ModuleBuilder::new("m", "main.go");
    let f = mb.function("m", "main", "()", 1);
    let ok = mb.const_int(4096, "int");
    let bad = mb.const_int(1024, "int");
    let phi = mb.push(
        f,
        0,
        ValueKind::Phi {
            edges: vec![ok, bad],
        },
        "int",
        2,
    );
    mb.ret(f, 0, vec![], 3);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    assert!(keylen_check(&module, phi, &cg));
}

// ============================================================================
// RSA analyzer scenarios
// ============================================================================

#[test]
fn short_literal_keylen_is_reported() {
    // rsa.GenerateKey(rand.Reader, 1024)
    let mut mb = ModuleBuilder::new("m", "main.go");
    let generate = mb.external_function(
        "crypto/rsa",
        "GenerateKey",
        "(random io.Reader, bits int) (*PrivateKey, error)",
    );
    let main_fn = mb.function("m", "main", "()", 1);
    let rand_reader = mb.global("crypto/rand", "Reader", "io.Reader", 0);
    let bits = mb.const_int(1024, "int");
    mb.call(main_fn, 0, generate, vec![rand_reader, bits], "(*PrivateKey, error)", 3);
    mb.ret(main_fn, 0, vec![], 4);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    let findings = rsa::analyzer().run(
        &module,
        &cg,
        &SourceCatalog::default(),
        TaintPolicy::default(),
    );
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, "CWE-326: Inadequate Encryption Strength");
}

#[test]
fn summed_keylen_folds_through_two_call_hops() {
    // rsa.GenerateKey(rand.Reader, bits()) with bits() { return calc() }
    // and calc() { return 500 + 1000 }
    let mut mb = ModuleBuilder::new("m", "main.go");
    let generate = mb.external_function(
        "crypto/rsa",
        "GenerateKey",
        "(random io.Reader, bits int) (*PrivateKey, error)",
    );
    let calc = mb.function("m", "calc", "() int", 1);
    let a = mb.const_int(500, "int");
    let b = mb.const_int(1000, "int");
    let sum = mb.push(
        calc,
        0,
        ValueKind::BinOp {
            op: BinOpKind::Add,
            x: a,
            y: b,
        },
        "int",
        2,
    );
    mb.ret(calc, 0, vec![sum], 2);

    let bits = mb.function("m", "bits", "() int", 4);
    let call_calc = mb.call(bits, 0, calc, vec![], "int", 5);
    mb.ret(bits, 0, vec![call_calc], 5);

    let main_fn = mb.function("m", "main", "()", 7);
    let rand_reader = mb.global("crypto/rand", "Reader", "io.Reader", 0);
    let call_bits = mb.call(main_fn, 0, bits, vec![], "int", 8);
    mb.call(
        main_fn,
        0,
        generate,
        vec![rand_reader, call_bits],
        "(*PrivateKey, error)",
        8,
    );
    mb.ret(main_fn, 0, vec![], 9);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    let findings = rsa::analyzer().run(
        &module,
        &cg,
        &SourceCatalog::default(),
        TaintPolicy::default(),
    );
    assert_eq!(findings.len(), 1, "1500 < 2048 must be reported");
}

#[test]
fn long_computed_keylen_is_clean() {
    // rsa.GenerateKey(rand.Reader, 2048+2048)
    let mut mb = ModuleBuilder::new("m", "main.go");
    let generate = mb.external_function(
        "crypto/rsa",
        "GenerateKey",
        "(random io.Reader, bits int) (*PrivateKey, error)",
    );
    let main_fn = mb.function("m", "main", "()", 1);
    let rand_reader = mb.global("crypto/rand", "Reader", "io.Reader", 0);
    let a = mb.const_int(2048, "int");
    let sum = mb.push(
        main_fn,
        0,
        ValueKind::BinOp {
            op: BinOpKind::Add,
            x: a,
            y: a,
        },
        "int",
        2,
    );
    mb.call(main_fn, 0, generate, vec![rand_reader, sum], "(*PrivateKey, error)", 3);
    mb.ret(main_fn, 0, vec![], 4);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    let findings = rsa::analyzer().run(
        &module,
        &cg,
        &SourceCatalog::default(),
        TaintPolicy::default(),
    );
    assert!(findings.is_empty());
}

#[test]
fn keylen_through_parameter_uses_first_caller() {
    // makeKey(bits) { rsa.GenerateKey(rand.Reader, bits) }; main: makeKey(512)
    let mut mb = ModuleBuilder::new("m", "main.go");
    let generate = mb.external_function(
        "crypto/rsa",
        "GenerateKey",
        "(random io.Reader, bits int) (*PrivateKey, error)",
    );
    let make_key = mb.function("m", "makeKey", "(bits int)", 1);
    let bits = mb.param(make_key, "bits", "int", 1);
    let rand_reader = mb.global("crypto/rand", "Reader", "io.Reader", 0);
    mb.call(
        make_key,
        0,
        generate,
        vec![rand_reader, bits],
        "(*PrivateKey, error)",
        2,
    );
    mb.ret(make_key, 0, vec![], 3);

    let main_fn = mb.function("m", "main", "()", 5);
    let lit = mb.const_int(512, "int");
    mb.call(main_fn, 0, make_key, vec![lit], "", 6);
    mb.ret(main_fn, 0, vec![], 7);
    let module = mb.finish();
    let cg = CallGraph::build(&module);

    let findings = rsa::analyzer().run(
        &module,
        &cg,
        &SourceCatalog::default(),
        TaintPolicy::default(),
    );
    assert_eq!(findings.len(), 1);
}
