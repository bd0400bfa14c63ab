//! Runtime errors and the non-local control-transfer signal.
//!
//! `Unwind` is the error type every `eval_expr` call threads through `?`
//! (spec.md §9's "explicit state-machine return from the walker" option):
//! `Unwind::Error` is a hard runtime error that always reaches the top,
//! and `Unwind::EarlyReturn` carries an `Err(...)` tag on its way to the
//! nearest enclosing recovery binder. Using `Result<_, Unwind>` means
//! ordinary `?` propagation through nested `eval_expr` calls already
//! implements the unwind; only the recovery binder needs to inspect and
//! possibly swallow it.

use std::fmt;

use leverr_common::diagnostic::Diagnostic;
use leverr_common::span::Span;

use crate::value::Value;

/// A runtime error raised by the evaluator (spec.md §7.4). The evaluator
/// assumes well-typed input but still performs shape checks, since the
/// inferencer deliberately admits programs with opaque tag matches and
/// loose row unification.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    UndefinedVariable { name: String, span: Span },
    NotAFunction { type_name: &'static str, span: Span },
    FieldAccessOnNonRecord { field: String, span: Span },
    NoSuchField { field: String, span: Span },
    NoMatchingPattern { span: Span },
    UnwrapOnNonResult { span: Span },
    OperatorTypeMismatch { span: Span },
    DivisionByZero { span: Span },
    IntegerOverflow { span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::NotAFunction { span, .. }
            | RuntimeError::FieldAccessOnNonRecord { span, .. }
            | RuntimeError::NoSuchField { span, .. }
            | RuntimeError::NoMatchingPattern { span, .. }
            | RuntimeError::UnwrapOnNonResult { span, .. }
            | RuntimeError::OperatorTypeMismatch { span, .. }
            | RuntimeError::DivisionByZero { span, .. }
            | RuntimeError::IntegerOverflow { span, .. } => *span,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UndefinedVariable { name, .. } => {
                write!(f, "undefined variable `{name}`")
            }
            RuntimeError::NotAFunction { type_name, .. } => {
                write!(f, "cannot call a value of type `{type_name}`")
            }
            RuntimeError::FieldAccessOnNonRecord { field, .. } => {
                write!(f, "field access `.{field}` on a non-record value")
            }
            RuntimeError::NoSuchField { field, .. } => {
                write!(f, "record has no field `{field}`")
            }
            RuntimeError::NoMatchingPattern { .. } => {
                write!(f, "no pattern in match expression matched the subject")
            }
            RuntimeError::UnwrapOnNonResult { .. } => {
                write!(f, "`?` requires an `Ok`/`Err` value")
            }
            RuntimeError::OperatorTypeMismatch { .. } => {
                write!(f, "operator applied to operands of incompatible types")
            }
            RuntimeError::DivisionByZero { .. } => {
                write!(f, "division by zero")
            }
            RuntimeError::IntegerOverflow { .. } => {
                write!(f, "integer operation overflowed")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl Diagnostic for RuntimeError {
    fn message(&self) -> String {
        self.to_string()
    }

    fn span(&self) -> Option<Span> {
        Some(self.span())
    }
}

/// The error channel threaded through every `eval_expr` call.
#[derive(Debug, Clone)]
pub enum Unwind {
    /// A non-local transfer raised by `?` on an `Err(...)` value, seeking
    /// the nearest enclosing recovery binder. Carries the whole `Err(...)`
    /// tag, per spec.md §5.
    EarlyReturn(Value),
    /// A hard runtime error; never caught by a recovery binder.
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_undefined_variable() {
        let err = RuntimeError::UndefinedVariable {
            name: "x".into(),
            span: Span::new(0, 1),
        };
        assert_eq!(err.to_string(), "undefined variable `x`");
    }

    #[test]
    fn runtime_error_converts_into_unwind() {
        let err: Unwind = RuntimeError::DivisionByZero { span: Span::new(0, 1) }.into();
        assert!(matches!(err, Unwind::Error(RuntimeError::DivisionByZero { .. })));
    }
}
