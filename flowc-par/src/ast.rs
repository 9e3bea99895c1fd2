//! AST node definitions for the flowc source language.
//!
//! The grammar is deliberately small: top-level `func` items, a handful of
//! statement forms, and C-like expressions over `int` scalars and fixed-size
//! integer arrays. See the repository README for the full grammar; this
//! module only defines the tree shape the parser builds and the semantic
//! checker annotates.

use flowc_util::{Span, Symbol};

/// A full source file: an ordered list of function definitions.
pub type Ast = Vec<FnItem>;

/// `func name(params) -> ret_type { body }`
#[derive(Debug, Clone)]
pub struct FnItem {
    pub name: Symbol,
    pub params: Vec<Param>,
    /// `None` means the function returns `void`.
    pub ret_type: Option<Type>,
    pub body: Block,
    pub span: Span,
}

/// A single `name type` parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
    pub span: Span,
}

/// A source-level type: a scalar `int`, or a fixed-shape array of `int`.
///
/// Array dimensions are literal sizes known at parse time; `Array`'s boxed
/// element type is always `Type::Int` in this language (there is no nested
/// array-of-array syntax), but the shape mirrors the original grammar's
/// `[d1][d2]…int` reading of dimensions outside-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Array(Box<Type>, Vec<usize>),
}

impl Type {
    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(..))
    }

    /// The array's dimension sizes, outermost first; empty for scalars.
    pub fn shape(&self) -> &[usize] {
        match self {
            Type::Int => &[],
            Type::Array(_, dims) => dims,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Array(_, dims) => {
                for d in dims {
                    write!(f, "[{d}]")?;
                }
                write!(f, "int")
            }
        }
    }
}

/// An ordered sequence of statements.
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let name ty = init;` (init is required by the grammar; array types
    /// are initialized with the `{}` literal).
    Let {
        name: Symbol,
        ty: Type,
        init: Expr,
        span: Span,
    },
    /// `place = value;`
    Assign {
        place: Place,
        value: Expr,
        span: Span,
    },
    /// A bare expression statement, e.g. a call for its side effect.
    Expr(Expr),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    /// `for { body }` — the unconditional, while-style loop.
    Loop { body: Block, span: Span },
    /// `for (init; cond; step) body` — the counted loop.
    For {
        init: Box<Stmt>,
        cond: Expr,
        step: Box<Stmt>,
        body: Block,
        span: Span,
    },
    Break { span: Span },
    Continue { span: Span },
    Return { value: Option<Expr>, span: Span },
    /// A nested `{ ... }` block with its own lexical scope.
    Block(Block),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Loop { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Return { span, .. } => *span,
            Stmt::Expr(e) => e.span(),
            Stmt::Block(b) => b.first().map(Stmt::span).unwrap_or(Span::DUMMY),
        }
    }
}

/// An assignable location: a bare variable or an indexed array element.
#[derive(Debug, Clone)]
pub enum Place {
    Var { name: Symbol, span: Span },
    Index {
        name: Symbol,
        indices: Vec<Expr>,
        span: Span,
    },
}

impl Place {
    pub fn name(&self) -> Symbol {
        match self {
            Place::Var { name, .. } => *name,
            Place::Index { name, .. } => *name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Place::Var { span, .. } => *span,
            Place::Index { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: i64, span: Span },
    Var { name: Symbol, span: Span },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Symbol,
        args: Vec<Expr>,
        span: Span,
    },
    Index {
        name: Symbol,
        indices: Vec<Expr>,
        span: Span,
    },
    /// The `{}` array literal, legal only as a `let` initializer.
    ArrayLit { span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::Var { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. }
            | Expr::ArrayLit { span } => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// True for the comparison/equality/logical operators that always
    /// produce a 0/1 result rather than an arithmetic one.
    pub fn is_boolean(self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::Ne
                | BinOp::Lt
                | BinOp::Le
                | BinOp::Gt
                | BinOp::Ge
                | BinOp::And
                | BinOp::Or
        )
    }

    pub fn is_short_circuit(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}
