//! Programmatic construction of SSA modules.
//!
//! The external loading layer ships modules in serialized form; this
//! builder is the in-process equivalent, used by loaders that lower IR
//! directly and by the test corpus. It maintains the operand/referrer
//! inverse relation and auto-assigns register names.

use super::{
    Block, CallCommon, ConstValue, FuncId, Function, Module, Position, Value, ValueId, ValueKind,
};
use compact_str::{format_compact, CompactString};

/// Incrementally builds a [`Module`], wiring referrer lists as values are
/// appended.
#[derive(Debug)]
pub struct ModuleBuilder {
    module: Module,
    file: String,
}

impl ModuleBuilder {
    /// Starts a module named `name` whose positions refer to `file`.
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            module: Module {
                name: name.into(),
                functions: Vec::new(),
                values: Vec::new(),
            },
            file: file.into(),
        }
    }

    fn pos(&self, line: u32) -> Position {
        if line == 0 {
            Position::none()
        } else {
            Position::new(self.file.clone(), line)
        }
    }

    fn alloc_value(&mut self, value: Value) -> ValueId {
        let id = ValueId(u32::try_from(self.module.values.len()).unwrap_or(u32::MAX));
        for op in value.kind.operands() {
            self.module.values[op.0 as usize].referrers.push(id);
        }
        self.module.values.push(value);
        id
    }

    /// Declares a function with an analyzable body and one entry block.
    pub fn function(
        &mut self,
        package: impl Into<String>,
        name: impl Into<CompactString>,
        signature: impl Into<String>,
        line: u32,
    ) -> FuncId {
        let fid = FuncId(u32::try_from(self.module.functions.len()).unwrap_or(u32::MAX));
        self.module.functions.push(Function {
            name: name.into(),
            package: package.into(),
            recv: None,
            signature: signature.into(),
            params: Vec::new(),
            blocks: vec![Block::default()],
            pos: self.pos(line),
        });
        fid
    }

    /// Declares an external (body-less) package function, e.g. `os/exec.Command`.
    pub fn external_function(
        &mut self,
        package: impl Into<String>,
        name: impl Into<CompactString>,
        signature: impl Into<String>,
    ) -> FuncId {
        let fid = FuncId(u32::try_from(self.module.functions.len()).unwrap_or(u32::MAX));
        self.module.functions.push(Function {
            name: name.into(),
            package: package.into(),
            recv: None,
            signature: signature.into(),
            params: Vec::new(),
            blocks: Vec::new(),
            pos: Position::none(),
        });
        fid
    }

    /// Declares an external method, e.g. receiver `(*database/sql.DB)`,
    /// package `database/sql`, name `Query`.
    pub fn external_method(
        &mut self,
        recv: impl Into<String>,
        package: impl Into<String>,
        name: impl Into<CompactString>,
        signature: impl Into<String>,
    ) -> FuncId {
        let fid = self.external_function(package, name, signature);
        self.module.functions[fid.0 as usize].recv = Some(recv.into());
        fid
    }

    /// Appends an empty block to `fid` and returns its index.
    pub fn block(&mut self, fid: FuncId) -> u32 {
        let f = &mut self.module.functions[fid.0 as usize];
        f.blocks.push(Block::default());
        u32::try_from(f.blocks.len() - 1).unwrap_or(u32::MAX)
    }

    /// Sets the successor indices of a block.
    pub fn set_succs(&mut self, fid: FuncId, block: u32, succs: &[u32]) {
        self.module.functions[fid.0 as usize].blocks[block as usize].succs = succs.to_vec();
    }

    /// Appends a parameter to `fid`. Parameters live outside blocks; the
    /// column is derived from the parameter index so that same-line
    /// parameters keep distinct positions.
    pub fn param(
        &mut self,
        fid: FuncId,
        name: impl Into<CompactString>,
        ty: impl Into<String>,
        line: u32,
    ) -> ValueId {
        let index = self.module.functions[fid.0 as usize].params.len();
        let mut pos = self.pos(line);
        pos.col = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let id = self.alloc_value(Value {
            name: name.into(),
            kind: ValueKind::Parameter,
            ty: ty.into(),
            parent: Some(fid),
            pos,
            referrers: Vec::new(),
        });
        self.module.functions[fid.0 as usize].params.push(id);
        id
    }

    /// Interns a constant. Constants have no parent function and belong to
    /// no block.
    pub fn constant(&mut self, value: ConstValue, ty: impl Into<String>) -> ValueId {
        let name = format_compact!("{value}");
        self.alloc_value(Value {
            name,
            kind: ValueKind::Const(value),
            ty: ty.into(),
            parent: None,
            pos: Position::none(),
            referrers: Vec::new(),
        })
    }

    /// Shorthand for an integer constant.
    pub fn const_int(&mut self, n: i64, ty: impl Into<String>) -> ValueId {
        self.constant(ConstValue::Int(n), ty)
    }

    /// Shorthand for a string constant.
    pub fn const_str(&mut self, s: impl Into<String>) -> ValueId {
        self.constant(ConstValue::Str(s.into()), "string")
    }

    /// Interns a package-level variable.
    pub fn global(
        &mut self,
        package: impl Into<String>,
        name: impl Into<CompactString>,
        ty: impl Into<String>,
        line: u32,
    ) -> ValueId {
        let pos = self.pos(line);
        self.alloc_value(Value {
            name: name.into(),
            kind: ValueKind::Global {
                package: package.into(),
            },
            ty: ty.into(),
            parent: None,
            pos,
            referrers: Vec::new(),
        })
    }

    /// Interns a `Function` value referring to `target`, usable as a call
    /// callee.
    pub fn func_value(&mut self, target: FuncId) -> ValueId {
        let (name, ty) = {
            let f = self.module.func(target);
            (
                CompactString::from(f.qualified_name()),
                format!("func{}", f.signature),
            )
        };
        self.alloc_value(Value {
            name,
            kind: ValueKind::Function(target),
            ty,
            parent: None,
            pos: Position::none(),
            referrers: Vec::new(),
        })
    }

    /// Appends an instruction/value of the given kind to `block` of `fid`,
    /// auto-naming its register.
    pub fn push(
        &mut self,
        fid: FuncId,
        block: u32,
        kind: ValueKind,
        ty: impl Into<String>,
        line: u32,
    ) -> ValueId {
        let name = format_compact!("t{}", self.module.values.len());
        let pos = self.pos(line);
        let id = self.alloc_value(Value {
            name,
            kind,
            ty: ty.into(),
            parent: Some(fid),
            pos,
            referrers: Vec::new(),
        });
        self.module.functions[fid.0 as usize].blocks[block as usize]
            .instrs
            .push(id);
        id
    }

    /// Appends a call to `callee` with `args`, interning the callee
    /// `Function` value.
    pub fn call(
        &mut self,
        fid: FuncId,
        block: u32,
        callee: FuncId,
        args: Vec<ValueId>,
        ty: impl Into<String>,
        line: u32,
    ) -> ValueId {
        let value = self.func_value(callee);
        self.push(
            fid,
            block,
            ValueKind::Call(CallCommon { value, args }),
            ty,
            line,
        )
    }

    /// Adds an incoming edge to an existing phi, wiring the referrer. Loop
    /// phis need this: their back edge refers to a value created after the
    /// phi itself.
    pub fn add_phi_edge(&mut self, phi: ValueId, edge: ValueId) {
        let ValueKind::Phi { edges } = &mut self.module.values[phi.0 as usize].kind else {
            return;
        };
        edges.push(edge);
        self.module.values[edge.0 as usize].referrers.push(phi);
    }

    /// Appends a `Return` terminator to `block`.
    pub fn ret(&mut self, fid: FuncId, block: u32, results: Vec<ValueId>, line: u32) -> ValueId {
        self.push(fid, block, ValueKind::Return { results }, "", line)
    }

    /// Finishes construction and yields the module.
    #[must_use]
    pub fn finish(self) -> Module {
        self.module
    }
}
