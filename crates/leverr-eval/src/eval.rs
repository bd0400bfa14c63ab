//! Tree-walking evaluator.
//!
//! `eval_expr` dispatches each AST expression variant to an `eval_*`
//! helper producing a `Value`, grounded on `mesh-codegen::codegen::expr`'s
//! per-shape `codegen_expr` dispatch (each `MirExpr` variant there
//! translates to LLVM IR via a `codegen_*` method; here each `Expr`
//! variant translates to a `Value` via an `eval_*` function, with a
//! persistent `Env` standing in for the `codegen` module's `alloca` frame).

use std::rc::Rc;

use leverr_common::span::Span;
use leverr_parser::ast::{BinOp, Expr, Pattern, UnOp};

use crate::builtins;
use crate::env::Env;
use crate::error::{RuntimeError, Unwind};
use crate::sink::Sink;
use crate::value::{values_equal, Builtin, Closure, Value};

/// Evaluate a whole program (one top-level expression, as spec.md §2
/// specifies) against `env` and `sink`.
///
/// An uncaught early-return transfer (spec.md §5: "or the program
/// boundary") surfaces as the final value, exactly like a normal result —
/// only a genuine `RuntimeError` is reported as failure.
pub fn evaluate(expr: &Expr, env: &Env, sink: &mut dyn Sink) -> Result<Value, RuntimeError> {
    log::debug!("evaluating program");
    match eval_expr(expr, env, sink) {
        Ok(v) => Ok(v),
        Err(Unwind::EarlyReturn(v)) => Ok(v),
        Err(Unwind::Error(e)) => Err(e),
    }
}

/// Build the default environment: every built-in bound, ready to
/// evaluate a top-level program.
pub fn default_env() -> Env {
    builtins::register_builtins(&Env::new())
}

pub fn eval_expr(expr: &Expr, env: &Env, sink: &mut dyn Sink) -> Result<Value, Unwind> {
    match expr {
        Expr::Int(n, _) => Ok(Value::Int(*n)),
        Expr::Float(n, _) => Ok(Value::Float(*n)),
        Expr::Str(s, _) => Ok(Value::Str(s.clone())),
        Expr::Bool(b, _) => Ok(Value::Bool(*b)),
        Expr::Unit(_) => Ok(Value::Unit),

        Expr::Ident(name, span) => env
            .lookup(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone(), span: *span }.into()),

        Expr::Let { name, is_rec, value, body, .. } => eval_let(name, *is_rec, value, body, env, sink),

        Expr::Lambda { param, body, .. } => Ok(eval_lambda(param, body, env)),

        Expr::App { func, arg, span } => {
            let f = eval_expr(func, env, sink)?;
            let a = eval_expr(arg, env, sink)?;
            apply(f, a, sink, *span)
        }

        Expr::BinaryOp { op, lhs, rhs, span } => {
            let l = eval_expr(lhs, env, sink)?;
            let r = eval_expr(rhs, env, sink)?;
            apply_binop(op, l, r, *span)
        }

        Expr::UnaryOp { op, operand, span } => {
            let v = eval_expr(operand, env, sink)?;
            apply_unop(op, v, *span)
        }

        Expr::Pipe { lhs, rhs, span } => eval_pipe(lhs, rhs, *span, env, sink),

        Expr::Unwrap { inner, span } => {
            let v = eval_expr(inner, env, sink)?;
            unwrap_result(v, *span)
        }

        Expr::RecoveryBinder { protected, err_name, fallback, .. } => {
            debug_assert!(protected.is_none(), "parser never populates a recovery binder's protected slot");
            let bound = env.bind(err_name, Value::Unit);
            eval_expr(fallback, &bound, sink)
        }

        Expr::Match { subject, cases, span } => {
            let value = eval_expr(subject, env, sink)?;
            for (pattern, body) in cases {
                if let Some(bound_env) = match_pattern(pattern, &value, env) {
                    return eval_expr(body, &bound_env, sink);
                }
            }
            Err(RuntimeError::NoMatchingPattern { span: *span }.into())
        }

        Expr::Conditional { cond, then_branch, else_branch, span } => {
            match eval_expr(cond, env, sink)? {
                Value::Bool(true) => eval_expr(then_branch, env, sink),
                Value::Bool(false) => eval_expr(else_branch, env, sink),
                _ => Err(RuntimeError::OperatorTypeMismatch { span: *span }.into()),
            }
        }

        Expr::List(elems, _) => {
            let mut out = Vec::with_capacity(elems.len());
            for e in elems {
                out.push(eval_expr(e, env, sink)?);
            }
            Ok(Value::List(out))
        }

        Expr::Tuple(elems, _) => {
            let mut out = Vec::with_capacity(elems.len());
            for e in elems {
                out.push(eval_expr(e, env, sink)?);
            }
            Ok(Value::Tuple(out))
        }

        Expr::Record(fields, _) => {
            let mut out = Vec::with_capacity(fields.len());
            for (name, e) in fields {
                out.push((name.clone(), eval_expr(e, env, sink)?));
            }
            Ok(Value::Record(out))
        }

        Expr::FieldAccess { record, field, span } => {
            let value = eval_expr(record, env, sink)?;
            match &value {
                Value::Record(_) => value
                    .record_field(field)
                    .cloned()
                    .ok_or_else(|| RuntimeError::NoSuchField { field: field.clone(), span: *span }.into()),
                _ => Err(RuntimeError::FieldAccessOnNonRecord { field: field.clone(), span: *span }.into()),
            }
        }

        Expr::Tag { name, args, .. } => {
            let mut out = Vec::with_capacity(args.len());
            for a in args {
                out.push(eval_expr(a, env, sink)?);
            }
            Ok(Value::Tag(name.clone(), out))
        }
    }
}

fn eval_let(
    name: &str,
    is_rec: bool,
    value_expr: &Expr,
    body: &Expr,
    env: &Env,
    sink: &mut dyn Sink,
) -> Result<Value, Unwind> {
    if is_rec {
        // Bind a placeholder first so a closure evaluated below captures
        // *this* frame; backpatching it afterwards (regardless of whether
        // the value turned out to be a closure) both replaces the
        // placeholder and, for closures, establishes the self-reference.
        let rec_env = env.bind(name, Value::Unit);
        let value = eval_expr(value_expr, &rec_env, sink)?;
        rec_env.backpatch(name, value);
        eval_expr(body, &rec_env, sink)
    } else {
        let value = eval_expr(value_expr, env, sink)?;
        let body_env = env.bind(name, value);
        eval_expr(body, &body_env, sink)
    }
}

fn eval_lambda(param: &str, body: &Expr, env: &Env) -> Value {
    Value::Closure(Rc::new(Closure {
        param: param.to_string(),
        body: Rc::new(body.clone()),
        env: env.clone(),
    }))
}

/// Apply a callable value to one argument. Closures evaluate their body
/// in the captured environment extended with the parameter; built-ins
/// accumulate arguments until their declared arity is reached, then
/// invoke the underlying implementation (spec.md §4.5's auto-currying).
pub fn apply(func: Value, arg: Value, sink: &mut dyn Sink, call_span: Span) -> Result<Value, Unwind> {
    match func {
        Value::Closure(c) => {
            let call_env = c.env.bind(&c.param, arg);
            eval_expr(&c.body, &call_env, sink)
        }
        Value::Builtin(b) => {
            let mut applied = b.applied.clone();
            applied.push(arg);
            if applied.len() == b.arity {
                builtins::invoke(&b.name, applied, sink, call_span)
            } else {
                Ok(Value::Builtin(Rc::new(Builtin { name: b.name.clone(), arity: b.arity, applied })))
            }
        }
        other => Err(RuntimeError::NotAFunction { type_name: other.type_name(), span: call_span }.into()),
    }
}

/// The three pipe subcases mirroring `leverr_typeck::infer::infer_pipe`:
/// a bare recovery binder on the right adopts the left as its protected
/// expression; a bare unwrap on the right applies itself to the left then
/// unwraps; otherwise the right is applied to the left as a function.
fn eval_pipe(lhs: &Expr, rhs: &Expr, span: Span, env: &Env, sink: &mut dyn Sink) -> Result<Value, Unwind> {
    match rhs {
        Expr::RecoveryBinder { err_name, fallback, .. } => {
            let protected = eval_expr(lhs, env, sink);
            run_recovery(protected, err_name, fallback, env, sink)
        }
        Expr::Unwrap { inner, span: unwrap_span } => {
            let lhs_val = eval_expr(lhs, env, sink)?;
            let f = eval_expr(inner, env, sink)?;
            let applied = apply(f, lhs_val, sink, span)?;
            unwrap_result(applied, *unwrap_span)
        }
        _ => {
            let lhs_val = eval_expr(lhs, env, sink)?;
            let rhs_val = eval_expr(rhs, env, sink)?;
            apply(rhs_val, lhs_val, sink, span)
        }
    }
}

/// Shared by standalone `expr?` and a pipe's bare-unwrap rhs: `Ok(v)`
/// yields `v`; `Err(...)` raises the early-return transfer carrying the
/// whole tag; anything else is a runtime error.
fn unwrap_result(value: Value, span: Span) -> Result<Value, Unwind> {
    match value {
        Value::Tag(name, mut args) if name == "Ok" && args.len() == 1 => Ok(args.remove(0)),
        Value::Tag(name, args) if name == "Err" && args.len() == 1 => {
            Err(Unwind::EarlyReturn(Value::Tag(name, args)))
        }
        _ => Err(RuntimeError::UnwrapOnNonResult { span }.into()),
    }
}

/// Evaluate a recovery binder given the (already-run) result of its
/// protected expression. `Ok(Ok(v))` yields `v`; an `Err(...)` reaching
/// here — whether returned normally or caught from a transfer — evaluates
/// the fallback with `err_name` bound to the error payload; any other
/// normally-returned value is yielded as-is.
fn run_recovery(
    protected: Result<Value, Unwind>,
    err_name: &str,
    fallback: &Expr,
    env: &Env,
    sink: &mut dyn Sink,
) -> Result<Value, Unwind> {
    let caught_err = match protected {
        Err(Unwind::EarlyReturn(Value::Tag(name, mut args))) if name == "Err" && args.len() == 1 => {
            Some(args.remove(0))
        }
        Err(Unwind::EarlyReturn(other)) => Some(other),
        Err(Unwind::Error(e)) => return Err(Unwind::Error(e)),
        Ok(Value::Tag(name, mut args)) if name == "Ok" && args.len() == 1 => return Ok(args.remove(0)),
        Ok(Value::Tag(name, mut args)) if name == "Err" && args.len() == 1 => Some(args.remove(0)),
        Ok(other) => return Ok(other),
    };
    let err_val = caught_err.expect("every non-return branch above already returned");
    let fallback_env = env.bind(err_name, err_val);
    eval_expr(fallback, &fallback_env, sink)
}

/// Bottom-up structural pattern match, extending `env` on success.
/// Returns `None` on any sub-failure (spec.md §4.5).
fn match_pattern(pattern: &Pattern, value: &Value, env: &Env) -> Option<Env> {
    match pattern {
        Pattern::Int(n, _) => (matches!(value, Value::Int(v) if v == n)).then(|| env.clone()),
        Pattern::Float(n, _) => (matches!(value, Value::Float(v) if v == n)).then(|| env.clone()),
        Pattern::Str(s, _) => (matches!(value, Value::Str(v) if v == s)).then(|| env.clone()),
        Pattern::Bool(b, _) => (matches!(value, Value::Bool(v) if v == b)).then(|| env.clone()),
        Pattern::Wildcard(_) => Some(env.clone()),
        Pattern::Ident(name, _) => Some(env.bind(name, value.clone())),
        Pattern::Tag { name, subpatterns, .. } => match value {
            Value::Tag(vname, vargs) if vname == name && vargs.len() == subpatterns.len() => {
                match_all(subpatterns, vargs, env)
            }
            _ => None,
        },
        Pattern::Tuple(subpatterns, _) => match value {
            Value::Tuple(velems) if velems.len() == subpatterns.len() => {
                match_all(subpatterns, velems, env)
            }
            _ => None,
        },
        Pattern::Record(fields, _) => match value {
            Value::Record(_) => {
                let mut out = env.clone();
                for (name, subpattern) in fields {
                    let field_val = value.record_field(name)?;
                    out = match_pattern(subpattern, field_val, &out)?;
                }
                Some(out)
            }
            _ => None,
        },
    }
}

fn match_all(patterns: &[Pattern], values: &[Value], env: &Env) -> Option<Env> {
    let mut out = env.clone();
    for (p, v) in patterns.iter().zip(values) {
        out = match_pattern(p, v, &out)?;
    }
    Some(out)
}

fn apply_binop(op: &BinOp, lhs: Value, rhs: Value, span: Span) -> Result<Value, Unwind> {
    use BinOp::*;
    match op {
        Add => arith(lhs, rhs, span, |a, b| a.checked_add(b), |a, b| a + b),
        Sub => arith(lhs, rhs, span, |a, b| a.checked_sub(b), |a, b| a - b),
        Mul => arith(lhs, rhs, span, |a, b| a.checked_mul(b), |a, b| a * b),
        Div => div(lhs, rhs, span),
        Mod => modulo(lhs, rhs, span),
        Concat => match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
        },
        Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        NotEq => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        Lt => compare(lhs, rhs, span, |o| o.is_lt()),
        Gt => compare(lhs, rhs, span, |o| o.is_gt()),
        LtEq => compare(lhs, rhs, span, |o| o.is_le()),
        GtEq => compare(lhs, rhs, span, |o| o.is_ge()),
        And => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
            _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
        },
        Or => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
            _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
        },
    }
}

/// Integer-integer uses `int_op` (with overflow treated as a hard error);
/// any float operand promotes both sides to float and uses `float_op`,
/// per spec.md §4.5's mixed-arithmetic promotion rule.
fn arith(
    lhs: Value,
    rhs: Value,
    span: Span,
    int_op: impl FnOnce(i64, i64) -> Option<i64>,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> Result<Value, Unwind> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => {
            int_op(a, b).map(Value::Int).ok_or_else(|| RuntimeError::IntegerOverflow { span }.into())
        }
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(a, b as f64))),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

/// Integer division truncates toward zero, matching Rust's own `/` on
/// signed integers (spec.md §4.5).
fn div(lhs: Value, rhs: Value, span: Span) -> Result<Value, Unwind> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero { span }.into()),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a / b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 / b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a / b as f64)),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

fn modulo(lhs: Value, rhs: Value, span: Span) -> Result<Value, Unwind> {
    match (lhs, rhs) {
        (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero { span }.into()),
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a % b)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a % b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(a as f64 % b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a % b as f64)),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

fn compare(lhs: Value, rhs: Value, span: Span, accept: impl FnOnce(std::cmp::Ordering) -> bool) -> Result<Value, Unwind> {
    let ordering = match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        _ => None,
    };
    match ordering {
        Some(o) => Ok(Value::Bool(accept(o))),
        None => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

fn apply_unop(op: &UnOp, value: Value, span: Span) -> Result<Value, Unwind> {
    match (op, value) {
        (UnOp::Neg, Value::Int(n)) => Ok(Value::Int(-n)),
        (UnOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::CapturingSink;
    use leverr_parser::parse_source;

    fn run(src: &str) -> Result<Value, RuntimeError> {
        let expr = parse_source(src).expect("source should parse");
        let env = default_env();
        let mut sink = CapturingSink::default();
        evaluate(&expr, &env, &mut sink)
    }

    fn run_with_sink(src: &str, sink: &mut CapturingSink) -> Result<Value, RuntimeError> {
        let expr = parse_source(src).expect("source should parse");
        let env = default_env();
        evaluate(&expr, &env, sink)
    }

    #[test]
    fn fibonacci_evaluates_to_fifty_five() {
        let result = run(
            "let rec fib = fn(n) -> match n <= 1 { true -> n, false -> fib(n-1) + fib(n-2) } in fib(10)",
        );
        assert_eq!(result.unwrap(), Value::Int(55));
    }

    #[test]
    fn pipeline_evaluates_to_one_hundred_twenty() {
        let result = run(
            "[1, 2, 3, 4, 5] |> filter(fn(x) -> x > 2) |> map(fn(x) -> x * 10) |> fold(0, fn(acc, x) -> acc + x)",
        );
        assert_eq!(result.unwrap(), Value::Int(120));
    }

    #[test]
    fn unwrap_on_ok_short_circuits_through_the_pipe() {
        let result = run(
            r#"let parse = fn(s) -> match s { "42" -> Ok(42), _ -> Err("bad") } in "42" |> parse? |> fn n -> n * 2"#,
        );
        assert_eq!(result.unwrap(), Value::Int(84));
    }

    #[test]
    fn unwrap_on_err_is_caught_by_catch() {
        let result = run(
            r#"let parse = fn(s) -> match s { "1" -> Ok(1), _ -> Err("bad") } in "bad" |> parse? |> fn n -> n * 2 |> catch e -> 0"#,
        );
        assert_eq!(result.unwrap(), Value::Int(0));
    }

    #[test]
    fn uncaught_early_return_surfaces_as_the_final_value() {
        let result = run(
            r#"let parse = fn(s) -> match s { "1" -> Ok(1), _ -> Err("bad") } in "nope" |> parse?"#,
        );
        assert_eq!(result.unwrap(), Value::Tag("Err".into(), vec![Value::Str("bad".into())]));
    }

    #[test]
    fn tag_match_selects_the_matching_arm() {
        let result = run(
            "let area = fn(s) -> match s { Circle(r) -> r * r * 3, Rect(w, h) -> w * h } in area(Rect(3, 4))",
        );
        assert_eq!(result.unwrap(), Value::Int(12));
    }

    #[test]
    fn partial_application_of_a_builtin_works_through_map() {
        let result = run("let add = fn(a, b) -> a + b in [1, 2, 3] |> map(add(10))");
        assert_eq!(
            result.unwrap(),
            Value::List(vec![Value::Int(11), Value::Int(12), Value::Int(13)])
        );
    }

    #[test]
    fn print_writes_to_the_injected_sink() {
        let mut sink = CapturingSink::default();
        let result = run_with_sink(r#"print("hello")"#, &mut sink);
        assert_eq!(result.unwrap(), Value::Unit);
        assert_eq!(sink.lines, vec!["hello".to_string()]);
    }

    #[test]
    fn mismatched_operand_types_are_a_runtime_error() {
        let result = run(r#"1 + "two""#);
        assert!(matches!(result, Err(RuntimeError::OperatorTypeMismatch { .. })));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let result = run("10 / 0");
        assert!(matches!(result, Err(RuntimeError::DivisionByZero { .. })));
    }

    #[test]
    fn calling_a_non_function_is_a_runtime_error() {
        let result = run("let x = 5 in x(3)");
        assert!(matches!(result, Err(RuntimeError::NotAFunction { .. })));
    }

    #[test]
    fn record_field_access_reads_the_named_field() {
        let result = run("let p = { x: 1, y: 2 } in p.x + p.y");
        assert_eq!(result.unwrap(), Value::Int(3));
    }

    #[test]
    fn non_exhaustive_match_is_a_runtime_error() {
        let result = run("match 5 { 1 -> true }");
        assert!(matches!(result, Err(RuntimeError::NoMatchingPattern { .. })));
    }
}
