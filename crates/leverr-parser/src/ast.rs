//! The Leverr expression and pattern tree.
//!
//! Every node carries a [`Span`] covering the source text it was parsed
//! from. Multi-parameter lambdas and multi-argument calls are desugared by
//! the parser into nested single-parameter/single-argument nodes before
//! this tree is ever built, so downstream stages only ever see the
//! single-param/single-arg shapes below.

use leverr_common::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64, Span),
    Float(f64, Span),
    Str(String, Span),
    Bool(bool, Span),
    Unit(Span),
    Ident(String, Span),
    Let {
        name: String,
        is_rec: bool,
        value: Box<Expr>,
        body: Box<Expr>,
        span: Span,
    },
    Lambda {
        param: String,
        body: Box<Expr>,
        span: Span,
    },
    App {
        func: Box<Expr>,
        arg: Box<Expr>,
        span: Span,
    },
    BinaryOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    /// `lhs |> rhs`. Kept distinct from [`Expr::BinaryOp`] because the rhs
    /// can carry special meaning (a bare `catch` or a postfix `?`).
    Pipe {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    /// Postfix `expr?`.
    Unwrap {
        inner: Box<Expr>,
        span: Span,
    },
    /// `catch err_name -> fallback`. `protected` is always `None` as
    /// produced by the parser; when this node is the rhs of a [`Expr::Pipe`],
    /// the pipe's lhs stands in for the protected expression at
    /// inference/evaluation time instead.
    RecoveryBinder {
        protected: Option<Box<Expr>>,
        err_name: String,
        fallback: Box<Expr>,
        span: Span,
    },
    Match {
        subject: Box<Expr>,
        cases: Vec<(Pattern, Expr)>,
        span: Span,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    List(Vec<Expr>, Span),
    Tuple(Vec<Expr>, Span),
    Record(Vec<(String, Expr)>, Span),
    FieldAccess {
        record: Box<Expr>,
        field: String,
        span: Span,
    },
    Tag {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int(_, s)
            | Expr::Float(_, s)
            | Expr::Str(_, s)
            | Expr::Bool(_, s)
            | Expr::Unit(s)
            | Expr::Ident(_, s)
            | Expr::List(_, s)
            | Expr::Tuple(_, s)
            | Expr::Record(_, s) => *s,
            Expr::Let { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::App { span, .. }
            | Expr::BinaryOp { span, .. }
            | Expr::UnaryOp { span, .. }
            | Expr::Pipe { span, .. }
            | Expr::Unwrap { span, .. }
            | Expr::RecoveryBinder { span, .. }
            | Expr::Match { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::FieldAccess { span, .. }
            | Expr::Tag { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Int(i64, Span),
    Float(f64, Span),
    Str(String, Span),
    Bool(bool, Span),
    Wildcard(Span),
    Ident(String, Span),
    Tag {
        name: String,
        subpatterns: Vec<Pattern>,
        span: Span,
    },
    Tuple(Vec<Pattern>, Span),
    Record(Vec<(String, Pattern)>, Span),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Int(_, s)
            | Pattern::Float(_, s)
            | Pattern::Str(_, s)
            | Pattern::Bool(_, s)
            | Pattern::Wildcard(s)
            | Pattern::Ident(_, s)
            | Pattern::Tuple(_, s)
            | Pattern::Record(_, s) => *s,
            Pattern::Tag { span, .. } => *span,
        }
    }
}
