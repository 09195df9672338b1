//! Abstract syntax tree produced by the [`crate::parser::Parser`].
//!
//! The tree owns all of its data (names are copied out of the token
//! buffer) so that function declarations can outlive the source text of a
//! single interactive input.  Function bodies sit behind an `Rc` because
//! every closure created from a declaration shares it.
//!
//! Nodes that the resolver annotates (`Variable`, `Assign`, `This`,
//! `Super`) carry an [`ExprId`]; the resolution side table is keyed by it.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::token::Span;

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a resolvable expression node.
///
/// Ids are unique for the lifetime of the process, so resolutions recorded
/// for one input never collide with those of a later input in the same
/// interactive session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Lower bound for every id handed out from now on.
    pub fn watermark() -> Self {
        ExprId(NEXT_EXPR_ID.load(Ordering::Relaxed))
    }
}

/// A name as written in the source, plus where it was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new<S: Into<String>>(name: S, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    Bool(bool),

    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `-`
    Negate,
    /// `!`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

/// Parameters and body shared by named functions, methods and lambdas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    /// `None` for a lambda expression.
    pub name: Option<Ident>,
    pub params: Vec<Ident>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Every kind of *expression*.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal {
        value: LiteralValue,
        span: Span,
    },

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping {
        expr: Box<Expr>,
        span: Span,
    },

    /// Prefix unary operator expression: `!isReady`, `-42`.
    Unary {
        op: UnaryOp,
        op_span: Span,
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        op_span: Span,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        op_span: Span,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Ident,
    },

    /// `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Ident,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)`, used as the error location.
        paren: Span,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get {
        object: Box<Expr>,
        name: Ident,
    },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Ident,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        span: Span,
    },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Span,
        method: Ident,
    },

    /// `fun (params) { body }` used as a value.
    Lambda(Rc<FunctionDecl>),
}

impl Expr {
    /// Source range of the whole expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. } | Expr::Grouping { span, .. } | Expr::This { span, .. } => {
                *span
            }
            Expr::Unary { op_span, right, .. } => op_span.to(right.span()),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                left.span().to(right.span())
            }
            Expr::Variable { name, .. } => name.span,
            Expr::Assign { name, value, .. } => name.span.to(value.span()),
            Expr::Call { callee, paren, .. } => callee.span().to(*paren),
            Expr::Get { object, name } => object.span().to(name.span),
            Expr::Set { object, value, .. } => object.span().to(value.span()),
            Expr::Super {
                keyword, method, ..
            } => keyword.to(method.span),
            Expr::Lambda(decl) => decl.span,
        }
    }
}

/// Complete executable constructs.  A program is a sequence of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Ident,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// Also the target of `for` desugaring.
    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    Break(Span),

    Return {
        /// The `return` keyword, for error locations.
        keyword: Span,
        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Function(Rc<FunctionDecl>),

    Class {
        name: Ident,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
