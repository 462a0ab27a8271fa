//! Syntax tree for the snippet language.

use std::sync::Arc;

/// A parsed snippet: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Top-level statements in source order.
    pub body: Vec<Stmt>,
}

/// A statement with the source line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What the statement does.
    pub kind: StmtKind,
    /// 1-based source line.
    pub line: u32,
}

/// Statement forms.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Bare expression, evaluated for its side effects.
    Expr(Expr),
    /// `a = b = value`; targets are assigned left to right.
    Assign {
        /// One entry per `=` on the line.
        targets: Vec<Target>,
        /// Right-hand side.
        value: Expr,
    },
    /// `target op= value`.
    AugAssign {
        /// Place being updated.
        target: Target,
        /// Arithmetic operator applied.
        op: BinOp,
        /// Right-hand side.
        value: Expr,
    },
    /// `if` / `elif` chain with an optional `else`.
    If {
        /// `(condition, body)` per `if` and `elif`.
        branches: Vec<(Expr, Vec<Stmt>)>,
        /// `else` body, empty when absent.
        orelse: Vec<Stmt>,
    },
    /// `while test:` loop.
    While {
        /// Loop condition.
        test: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },
    /// `for target in iter:` loop.
    For {
        /// Loop variable(s).
        target: Target,
        /// Iterated expression.
        iter: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },
    /// `break`.
    Break,
    /// `continue`.
    Continue,
    /// `pass`.
    Pass,
    /// `def name(params): body`.
    FunctionDef(Arc<FunctionDef>),
    /// `return [value]`.
    Return(Option<Expr>),
    /// `del target, ...`.
    Delete(Vec<Target>),
    /// `import a, b.c as d`.
    Import {
        /// Dotted module names.
        modules: Vec<String>,
    },
    /// `from module import names`.
    ImportFrom {
        /// Dotted module name.
        module: String,
        /// Imported names (`*` included verbatim).
        names: Vec<String>,
    },
    /// `global a, b`.
    Global(Vec<String>),
    /// `nonlocal a, b`.
    Nonlocal(Vec<String>),
}

/// Assignment target.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Plain variable.
    Name(String),
    /// `object[index]`.
    Subscript {
        /// Container expression.
        object: Box<Expr>,
        /// Key or position.
        index: Box<Expr>,
    },
    /// `a, b` unpacking.
    Tuple(Vec<Target>),
}

/// A user-defined function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Function body.
    pub body: Vec<Stmt>,
}

/// A function parameter with an optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Default value expression, evaluated once at definition time.
    pub default: Option<Expr>,
}

/// Literal constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `None`.
    None,
    /// `True` / `False`.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal, escapes resolved.
    Str(String),
}

/// Expression forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Constant.
    Literal(Literal),
    /// Variable or capability reference.
    Name(String),
    /// `[a, b]`.
    List(Vec<Expr>),
    /// `(a, b)` or a bare `a, b`.
    Tuple(Vec<Expr>),
    /// `{k: v}`.
    Dict(Vec<(Expr, Expr)>),
    /// `[element for target in iter if cond ...]`.
    ListComp {
        /// Produced element.
        element: Box<Expr>,
        /// Loop variable(s).
        target: Target,
        /// Iterated expression.
        iter: Box<Expr>,
        /// Filters, all of which must hold.
        conditions: Vec<Expr>,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Arithmetic operator.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Short-circuit `and` / `or`.
    Logical {
        /// Operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand, evaluated only when needed.
        right: Box<Expr>,
    },
    /// Chained comparison `a < b <= c`.
    Compare {
        /// First operand.
        left: Box<Expr>,
        /// Remaining `(operator, operand)` pairs.
        rest: Vec<(CmpOp, Expr)>,
    },
    /// `body if test else orelse`.
    IfExpr {
        /// Condition.
        test: Box<Expr>,
        /// Value when true.
        body: Box<Expr>,
        /// Value when false.
        orelse: Box<Expr>,
    },
    /// Function or method call.
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Positional arguments.
        args: Vec<Expr>,
        /// Keyword arguments in source order.
        keywords: Vec<(String, Expr)>,
    },
    /// `object.name`.
    Attribute {
        /// Receiver.
        object: Box<Expr>,
        /// Attribute name.
        name: String,
    },
    /// `object[index]`.
    Subscript {
        /// Container.
        object: Box<Expr>,
        /// Key or position.
        index: Box<Expr>,
    },
    /// `object[lower:upper:step]`.
    Slice {
        /// Sequence.
        object: Box<Expr>,
        /// Start bound.
        lower: Option<Box<Expr>>,
        /// End bound.
        upper: Option<Box<Expr>>,
        /// Stride.
        step: Option<Box<Expr>>,
    },
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`.
    Neg,
    /// `+x`.
    Pos,
    /// `not x`.
    Not,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`.
    Add,
    /// `-`.
    Sub,
    /// `*`.
    Mul,
    /// `/`.
    Div,
    /// `//`.
    FloorDiv,
    /// `%`.
    Mod,
    /// `**`.
    Pow,
}

impl BinOp {
    /// Source spelling of the operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
        }
    }
}

/// Short-circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `and`.
    And,
    /// `or`.
    Or,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`.
    Eq,
    /// `!=`.
    NotEq,
    /// `<`.
    Lt,
    /// `<=`.
    LtE,
    /// `>`.
    Gt,
    /// `>=`.
    GtE,
    /// `in`.
    In,
    /// `not in`.
    NotIn,
    /// `is`.
    Is,
    /// `is not`.
    IsNot,
}

impl CmpOp {
    /// Source spelling of the operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtE => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtE => ">=",
            CmpOp::In => "in",
            CmpOp::NotIn => "not in",
            CmpOp::Is => "is",
            CmpOp::IsNot => "is not",
        }
    }
}
