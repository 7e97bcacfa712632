//! Abstract Syntax Tree for the Cadenza language.
//!
//! The parser produces one [`Program`] per source file; the semantic
//! analyzer annotates every expression with its [`Rate`] in place.

/// One of the four primitive types the grammar exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Str,
    Audio,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Str => write!(f, "String"),
            Type::Audio => write!(f, "Audio"),
        }
    }
}

/// Evaluation rate of an expression.
///
/// Control values are scalars, constant across one perf invocation; Audio
/// values are recomputed every output sample. The tag is assigned bottom-up
/// during semantic analysis: an expression is Audio-rate iff any operand is
/// Audio-typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rate {
    Control,
    Audio,
}

/// A complete program: optional instruments block, optional score block.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub instruments: Vec<InstrumentDef>,
    pub score: Vec<ScoreEvent>,
}

/// An instrument definition: persistent members plus init/perf functions.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentDef {
    pub name: String,
    pub members: Vec<MemberVar>,
    pub init: Option<FunctionDef>,
    pub perf: Option<FunctionDef>,
    pub line: usize,
    pub col: usize,
}

/// A member variable, visible to both functions of its instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberVar {
    pub name: String,
    pub ty: Type,
    pub line: usize,
    pub col: usize,
}

/// An `init` or `perf` function body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: usize,
    pub col: usize,
}

/// A function parameter. Parameters are always control-rate scalars or
/// strings; the parser rejects `Audio` here.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub line: usize,
    pub col: usize,
}

/// A statement inside a function body.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `local a, b: Type = expr;` — one declaration may bind several
    /// identifiers to the outputs of a multi-value component call.
    Local {
        names: Vec<String>,
        ty: Type,
        init: Expr,
        line: usize,
        col: usize,
    },
    /// `name = expr;`
    Assign {
        name: String,
        value: Expr,
        line: usize,
        col: usize,
    },
    /// `print(expr?);` / `println(expr?);`
    Print {
        arg: Option<Expr>,
        newline: bool,
        line: usize,
        col: usize,
    },
    /// `output(e1, ..., eN);` — adds each value into bus channel i-1.
    Output {
        args: Vec<Expr>,
        line: usize,
        col: usize,
    },
    /// A bare expression whose value(s) are discarded.
    Expr(Expr),
}

/// An expression node with its statically inferred rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub rate: Rate,
    pub line: usize,
    pub col: usize,
}

impl Expr {
    /// A fresh node; the analyzer overwrites the Control placeholder.
    pub fn new(kind: ExprKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            rate: Rate::Control,
            line,
            col,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Int(i64),
    Float(f32),
    Str(String),
    Var(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        /// Stable lexical call-site id, assigned during parsing. Keys the
        /// persistent generator state table per voice.
        site: CallSiteId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
        }
    }
}

/// Identifies one lexical component call site within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSiteId(pub u32);

/// A literal argument in a score event.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f32),
    Str(String),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Str(_) => Type::Str,
        }
    }
}

/// A score-event argument with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreArg {
    pub value: Literal,
    pub line: usize,
    pub col: usize,
}

/// One timeline event: instantiate an instrument with timing and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEvent {
    pub instrument: String,
    /// Start time in seconds, >= 0.
    pub start: f32,
    /// Duration in seconds, > 0.
    pub duration: f32,
    pub init_args: Vec<ScoreArg>,
    pub perf_args: Vec<ScoreArg>,
    pub line: usize,
    pub col: usize,
}
