//! SSA value model.
//!
//! The analyzer consumes a program already lowered to Static Single
//! Assignment form by an external loading layer. This module defines the
//! value taxonomy the taint engine traverses: a [`Module`] owning an arena
//! of [`Value`] nodes, the [`Function`]/[`Block`] skeleton around them, and
//! the operand/referrer relations between them. Values are immutable once
//! the module is built; identity (`ValueId`) is stable for the lifetime of
//! an analysis.

/// Programmatic construction of SSA modules.
pub mod builder;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::fs;
use std::ops::Index;
use std::path::Path;
use thiserror::Error;

/// Stable handle to a value in a module's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

/// Stable handle to a function in a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuncId(pub u32);

/// Source position of a value or instruction. Line 0 means "no position".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Source file the value was lowered from.
    pub file: String,
    /// 1-based line number, 0 when unknown.
    pub line: u32,
    /// 1-based column, 0 when unknown. Distinguishes same-line parameters.
    #[serde(default)]
    pub col: u32,
}

impl Position {
    /// Creates a position at `file:line`.
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
            col: 0,
        }
    }

    /// The empty position used for synthesized or external values.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A literal constant carried by a `Const` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    /// Integer literal (covers all sized integer types of the source).
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal.
    Str(String),
    /// Boolean literal.
    Bool(bool),
    /// The typed nil / zero value.
    Nil,
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(n) => write!(f, "{n}"),
            ConstValue::Float(x) => write!(f, "{x}"),
            ConstValue::Str(s) => write!(f, "{s:?}"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Nil => write!(f, "nil"),
        }
    }
}

/// Binary operators recognized by the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOpKind {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (truncating on integers)
    Div,
    /// `%`
    Rem,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
}

/// Unary operators recognized by the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOpKind {
    /// Pointer load (`*x`).
    Load,
    /// Arithmetic negation.
    Neg,
    /// Logical / bitwise complement.
    Not,
    /// Channel receive.
    Recv,
}

/// The callee and argument tuple shared by call-like instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallCommon {
    /// The value being invoked (a `Function` reference, a closure, or an
    /// opaque indirect callee).
    pub value: ValueId,
    /// Actual arguments; for method calls the receiver is `args[0]`.
    pub args: Vec<ValueId>,
}

/// The discriminated value taxonomy the engine traverses.
///
/// `Store` and `Return` are instruction-only kinds: they appear in blocks
/// and referrer lists but are not themselves values
/// ([`ValueKind::is_value`] is false). `Opaque` stands for IR constructs
/// the loading layer does not model; the engine treats it conservatively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueKind {
    /// Literal constant.
    Const(ConstValue),
    /// Function parameter; resolved to caller arguments through the call graph.
    Parameter,
    /// Variable captured by a closure.
    FreeVar,
    /// Reference to a function.
    Function(FuncId),
    /// Package-level variable.
    Global {
        /// Import path of the owning package.
        package: String,
    },
    /// SSA φ-merge of the incoming edges.
    Phi {
        /// One incoming value per control-flow predecessor.
        edges: Vec<ValueId>,
    },
    /// Unary operation.
    UnOp {
        /// Operator.
        op: UnOpKind,
        /// Operand.
        x: ValueId,
    },
    /// Binary operation.
    BinOp {
        /// Operator.
        op: BinOpKind,
        /// Left operand.
        x: ValueId,
        /// Right operand.
        y: ValueId,
    },
    /// Value-preserving type conversion.
    Convert {
        /// Operand.
        x: ValueId,
    },
    /// Type change with identical underlying representation.
    ChangeType {
        /// Operand.
        x: ValueId,
    },
    /// Interface-to-interface conversion.
    ChangeInterface {
        /// Operand.
        x: ValueId,
    },
    /// Boxing of a concrete value into an interface.
    MakeInterface {
        /// Operand.
        x: ValueId,
    },
    /// Struct field read.
    Field {
        /// Struct operand.
        x: ValueId,
        /// Field index.
        field: u32,
    },
    /// Address of a struct field.
    FieldAddr {
        /// Struct address operand.
        x: ValueId,
        /// Field index.
        field: u32,
    },
    /// Address of an array/slice element.
    IndexAddr {
        /// Base operand.
        x: ValueId,
        /// Element index.
        index: ValueId,
    },
    /// Array element read.
    Index {
        /// Base operand.
        x: ValueId,
        /// Element index.
        index: ValueId,
    },
    /// Map or string indexed read.
    Lookup {
        /// Collection operand.
        x: ValueId,
        /// Key operand.
        index: ValueId,
    },
    /// Tuple component extraction.
    Extract {
        /// The tuple-typed operand.
        tuple: ValueId,
        /// Component index.
        index: u32,
    },
    /// Range iterator over a collection.
    Range {
        /// Collection operand.
        x: ValueId,
    },
    /// Next element of a range iterator.
    Next {
        /// Iterator operand.
        iter: ValueId,
    },
    /// Checked dynamic type assertion.
    TypeAssert {
        /// Operand.
        x: ValueId,
    },
    /// Sub-slice view of a backing array.
    Slice {
        /// Backing operand.
        x: ValueId,
    },
    /// Fresh allocation of a sized slice.
    MakeSlice,
    /// Fresh map allocation.
    MakeMap,
    /// Closure creation binding captured values.
    MakeClosure {
        /// The `Function` value being closed over.
        func: ValueId,
        /// Captured bindings, one per free variable.
        bindings: Vec<ValueId>,
    },
    /// Function call.
    Call(CallCommon),
    /// Stack or heap allocation of a local.
    Alloc,
    /// Store through an address (instruction only).
    Store {
        /// Destination address.
        addr: ValueId,
        /// Stored value.
        val: ValueId,
    },
    /// Function return (instruction only, block terminator).
    Return {
        /// Result tuple.
        results: Vec<ValueId>,
    },
    /// An IR construct outside the modeled taxonomy.
    Opaque {
        /// Loader-provided tag naming the construct.
        tag: CompactString,
    },
}

impl ValueKind {
    /// Whether this kind produces a value (as opposed to an
    /// instruction-only effect such as `Store` or `Return`).
    #[must_use]
    pub fn is_value(&self) -> bool {
        !matches!(self, ValueKind::Store { .. } | ValueKind::Return { .. })
    }

    /// Short mnemonic for the kind, used in textualization and debug logs.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            ValueKind::Const(_) => "const",
            ValueKind::Parameter => "parameter",
            ValueKind::FreeVar => "freevar",
            ValueKind::Function(_) => "function",
            ValueKind::Global { .. } => "global",
            ValueKind::Phi { .. } => "phi",
            ValueKind::UnOp { .. } => "unop",
            ValueKind::BinOp { .. } => "binop",
            ValueKind::Convert { .. } => "convert",
            ValueKind::ChangeType { .. } => "changetype",
            ValueKind::ChangeInterface { .. } => "changeinterface",
            ValueKind::MakeInterface { .. } => "makeinterface",
            ValueKind::Field { .. } => "field",
            ValueKind::FieldAddr { .. } => "fieldaddr",
            ValueKind::IndexAddr { .. } => "indexaddr",
            ValueKind::Index { .. } => "index",
            ValueKind::Lookup { .. } => "lookup",
            ValueKind::Extract { .. } => "extract",
            ValueKind::Range { .. } => "range",
            ValueKind::Next { .. } => "next",
            ValueKind::TypeAssert { .. } => "typeassert",
            ValueKind::Slice { .. } => "slice",
            ValueKind::MakeSlice => "makeslice",
            ValueKind::MakeMap => "makemap",
            ValueKind::MakeClosure { .. } => "makeclosure",
            ValueKind::Call(_) => "call",
            ValueKind::Alloc => "alloc",
            ValueKind::Store { .. } => "store",
            ValueKind::Return { .. } => "return",
            ValueKind::Opaque { .. } => "opaque",
        }
    }

    /// Ordered child values read by this node (the inverse of the referrer
    /// relation).
    #[must_use]
    pub fn operands(&self) -> SmallVec<[ValueId; 4]> {
        let mut ops = SmallVec::new();
        match self {
            ValueKind::Const(_)
            | ValueKind::Parameter
            | ValueKind::FreeVar
            | ValueKind::Function(_)
            | ValueKind::Global { .. }
            | ValueKind::MakeSlice
            | ValueKind::MakeMap
            | ValueKind::Alloc
            | ValueKind::Opaque { .. } => {}
            ValueKind::Phi { edges } => ops.extend(edges.iter().copied()),
            ValueKind::UnOp { x, .. }
            | ValueKind::Convert { x }
            | ValueKind::ChangeType { x }
            | ValueKind::ChangeInterface { x }
            | ValueKind::MakeInterface { x }
            | ValueKind::Field { x, .. }
            | ValueKind::FieldAddr { x, .. }
            | ValueKind::Range { x }
            | ValueKind::TypeAssert { x }
            | ValueKind::Slice { x } => ops.push(*x),
            ValueKind::BinOp { x, y, .. } => {
                ops.push(*x);
                ops.push(*y);
            }
            ValueKind::IndexAddr { x, index }
            | ValueKind::Index { x, index }
            | ValueKind::Lookup { x, index } => {
                ops.push(*x);
                ops.push(*index);
            }
            ValueKind::Extract { tuple, .. } => ops.push(*tuple),
            ValueKind::Next { iter } => ops.push(*iter),
            ValueKind::MakeClosure { func, bindings } => {
                ops.push(*func);
                ops.extend(bindings.iter().copied());
            }
            ValueKind::Call(common) => {
                ops.push(common.value);
                ops.extend(common.args.iter().copied());
            }
            ValueKind::Store { addr, val } => {
                ops.push(*addr);
                ops.push(*val);
            }
            ValueKind::Return { results } => ops.extend(results.iter().copied()),
        }
        ops
    }
}

/// A single node in the SSA arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    /// Register or symbol name (`t3`, a parameter name, a global name).
    pub name: CompactString,
    /// Discriminated node kind and child references.
    pub kind: ValueKind,
    /// Static type rendered as a string, e.g. `*net/http.Request`.
    pub ty: String,
    /// Enclosing function, absent for constants, globals and function refs.
    #[serde(default)]
    pub parent: Option<FuncId>,
    /// Source position.
    pub pos: Position,
    /// Instructions and values that read this node.
    #[serde(default)]
    pub referrers: Vec<ValueId>,
}

/// A basic block: an ordered instruction list plus successor indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    /// Instruction list in execution order.
    pub instrs: Vec<ValueId>,
    /// Successor block indices; empty for returning blocks.
    pub succs: Vec<u32>,
}

/// A function: named, package-qualified, owning blocks in dominator preorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    /// Unqualified name.
    pub name: CompactString,
    /// Import path of the owning package, e.g. `os/exec`.
    pub package: String,
    /// Receiver spelling for methods, e.g. `(*database/sql.DB)`.
    #[serde(default)]
    pub recv: Option<String>,
    /// Signature rendered as a string, e.g. `(query string) (*Rows, error)`.
    pub signature: String,
    /// Ordered parameter values.
    pub params: Vec<ValueId>,
    /// Basic blocks in dominator preorder. Empty for external declarations.
    pub blocks: Vec<Block>,
    /// Declaration position.
    pub pos: Position,
}

impl Function {
    /// Fully qualified name used to key the call graph: `pkg.Func` for
    /// package functions, `(recv).Method` for methods.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.recv {
            Some(recv) => format!("{recv}.{}", self.name),
            None => format!("{}.{}", self.package, self.name),
        }
    }

    /// Short package name, the last segment of the import path.
    #[must_use]
    pub fn package_name(&self) -> &str {
        self.package.rsplit('/').next().unwrap_or(&self.package)
    }

    /// Whether this is a declaration without an analyzable body.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Canonical textualization used when hashing child values.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} {}", self.qualified_name(), self.signature)
    }
}

/// A loaded SSA module: the unit the analyzers operate on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    /// Module (root package) path, for reporting.
    pub name: String,
    /// All functions, local and external.
    pub functions: Vec<Function>,
    /// The value arena.
    pub values: Vec<Value>,
}

/// Failure to load a serialized module.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module file could not be read.
    #[error("failed to read module {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The module file was not valid serialized SSA.
    #[error("invalid SSA module: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Module {
    /// Looks up a function by handle.
    #[must_use]
    pub fn func(&self, id: FuncId) -> &Function {
        &self.functions[id.0 as usize]
    }

    /// Iterates functions with their handles.
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FuncId(u32::try_from(i).unwrap_or(u32::MAX)), f))
    }

    /// Resolves the statically known callee of a call, if any. Indirect and
    /// interface calls resolve to `None`.
    #[must_use]
    pub fn static_callee(&self, call: &CallCommon) -> Option<FuncId> {
        match &self[call.value].kind {
            ValueKind::Function(fid) => Some(*fid),
            ValueKind::MakeClosure { func, .. } => match &self[*func].kind {
                ValueKind::Function(fid) => Some(*fid),
                _ => None,
            },
            _ => None,
        }
    }

    /// Deterministic textualization of a value, stable across runs for a
    /// given module. Feeds the taint map hash.
    #[must_use]
    pub fn display_value(&self, id: ValueId) -> String {
        let v = &self[id];
        match &v.kind {
            ValueKind::Const(c) => format!("{c}:{}", v.ty),
            ValueKind::Parameter => format!("parameter {} : {}", v.name, v.ty),
            ValueKind::FreeVar => format!("freevar {} : {}", v.name, v.ty),
            ValueKind::Global { package } => format!("global {package}.{} : {}", v.name, v.ty),
            ValueKind::Function(fid) => format!("function {}", self.func(*fid).qualified_name()),
            kind => {
                let mut out = format!("{} = {}", v.name, kind.tag());
                for op in kind.operands() {
                    out.push(' ');
                    out.push_str(&self[op].name);
                }
                out
            }
        }
    }

    /// Loads a module from its serialized JSON form, the interchange format
    /// produced by the external package-loading layer.
    pub fn from_json_str(text: &str) -> Result<Self, ModuleError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a module from a JSON file on disk.
    pub fn from_json_file(path: &Path) -> Result<Self, ModuleError> {
        let text = fs::read_to_string(path).map_err(|source| ModuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Serializes the module to JSON.
    pub fn to_json(&self) -> Result<String, ModuleError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Index<ValueId> for Module {
    type Output = Value;

    fn index(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_cover_call_and_store() {
        let call = ValueKind::Call(CallCommon {
            value: ValueId(0),
            args: vec![ValueId(1), ValueId(2)],
        });
        assert_eq!(
            call.operands().as_slice(),
            &[ValueId(0), ValueId(1), ValueId(2)][..]
        );

        let store = ValueKind::Store {
            addr: ValueId(3),
            val: ValueId(4),
        };
        assert!(!store.is_value());
        assert_eq!(store.operands().as_slice(), &[ValueId(3), ValueId(4)][..]);
    }

    #[test]
    fn qualified_names() {
        let f = Function {
            name: "Query".into(),
            package: "database/sql".into(),
            recv: Some("(*database/sql.DB)".into()),
            signature: "(query string) (*Rows, error)".into(),
            params: vec![],
            blocks: vec![],
            pos: Position::none(),
        };
        assert_eq!(f.qualified_name(), "(*database/sql.DB).Query");
        assert_eq!(f.package_name(), "sql");
        assert!(f.is_external());
    }
}
