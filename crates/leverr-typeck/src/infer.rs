//! Algorithm W inference engine for Leverr.
//!
//! Walks the expression tree produced by `leverr-parser`, generates type
//! constraints, and solves them via unification. Implements Hindley-Milner
//! type inference with:
//! - Let-polymorphism (generalize + instantiate)
//! - Occurs check (rejects infinite types)
//! - Level-based generalization (Remy's algorithm)
//! - Error provenance via `ConstraintOrigin`

use leverr_common::span::Span;
use leverr_parser::ast::{BinOp, Expr, Pattern, UnOp};

use crate::builtins;
use crate::env::TypeEnv;
use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{RowTail, Scheme, Ty};
use crate::unify::InferCtx;

/// The outcome of type-checking a Leverr program: either the program's
/// inferred type, or the errors that prevented one from being assigned.
/// Inference never panics on a malformed program; it records every error
/// it finds in `errors` and keeps going where it safely can.
pub struct TypeckResult {
    pub ty: Option<Ty>,
    pub errors: Vec<TypeError>,
}

/// Type-check a whole program (a single top-level expression, since every
/// Leverr program is one expression).
pub fn check(expr: &Expr) -> TypeckResult {
    log::debug!("type-checking program");
    let mut ctx = InferCtx::new();
    let env = builtins::register_builtins(&mut ctx, &TypeEnv::new());

    let ty = infer_expr(&mut ctx, &env, expr).ok();
    let resolved = ty.map(|t| ctx.resolve(t));

    TypeckResult {
        ty: resolved,
        errors: ctx.errors,
    }
}

/// Infer the type of an expression under `env`.
fn infer_expr(ctx: &mut InferCtx, env: &TypeEnv, expr: &Expr) -> Result<Ty, TypeError> {
    match expr {
        Expr::Int(_, _) => Ok(Ty::int()),
        Expr::Float(_, _) => Ok(Ty::float()),
        Expr::Str(_, _) => Ok(Ty::string()),
        Expr::Bool(_, _) => Ok(Ty::bool()),
        Expr::Unit(_) => Ok(Ty::unit()),

        Expr::Ident(name, span) => infer_ident(ctx, env, name, *span),

        Expr::Let { name, is_rec, value, body, .. } => {
            infer_let(ctx, env, name, *is_rec, value, body)
        }

        Expr::Lambda { param, body, .. } => infer_lambda(ctx, env, param, body),

        Expr::App { func, arg, span } => infer_app(ctx, env, func, arg, *span),

        Expr::BinaryOp { op, lhs, rhs, span } => infer_binary_op(ctx, env, *op, lhs, rhs, *span),

        Expr::UnaryOp { op, operand, .. } => infer_unary_op(ctx, env, *op, operand),

        Expr::Pipe { lhs, rhs, span } => infer_pipe(ctx, env, lhs, rhs, *span),

        Expr::Unwrap { inner, span } => infer_unwrap(ctx, env, inner, *span),

        Expr::RecoveryBinder { protected, err_name, fallback, span } => {
            infer_recovery_binder(ctx, env, protected.as_deref(), err_name, fallback, *span)
        }

        Expr::Match { subject, cases, .. } => infer_match(ctx, env, subject, cases),

        Expr::Conditional { cond, then_branch, else_branch, span } => {
            infer_conditional(ctx, env, cond, then_branch, else_branch, *span)
        }

        Expr::List(elems, _) => infer_list(ctx, env, elems),

        Expr::Tuple(elems, _) => {
            let tys = elems
                .iter()
                .map(|e| infer_expr(ctx, env, e))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Ty::Tuple(tys))
        }

        Expr::Record(fields, _) => {
            let mut map = std::collections::BTreeMap::new();
            for (name, value) in fields {
                map.insert(name.clone(), infer_expr(ctx, env, value)?);
            }
            Ok(Ty::closed_record(map))
        }

        Expr::FieldAccess { record, field, span } => infer_field_access(ctx, env, record, field, *span),

        // `Ok`/`Err` are the two recognized constructors of the built-in
        // `Result` type, not ordinary open tags: the error side is always
        // `String`, per spec, so `Err`'s payload is checked against it
        // rather than left as a free type parameter.
        Expr::Tag { name, args, .. } if name == "Ok" && args.len() == 1 => {
            let ok_ty = infer_expr(ctx, env, &args[0])?;
            Ok(Ty::result(ok_ty))
        }
        Expr::Tag { name, args, span } if name == "Err" && args.len() == 1 => {
            let err_ty = infer_expr(ctx, env, &args[0])?;
            ctx.unify(err_ty, Ty::string(), ConstraintOrigin::FnArg { call_site: *span })?;
            Ok(Ty::result(ctx.fresh_var()))
        }

        Expr::Tag { name, args, .. } => {
            let arg_tys = args
                .iter()
                .map(|a| infer_expr(ctx, env, a))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Ty::Tag(name.clone(), arg_tys))
        }
    }
}

fn infer_ident(ctx: &mut InferCtx, env: &TypeEnv, name: &str, span: Span) -> Result<Ty, TypeError> {
    match env.lookup(name) {
        Some(scheme) => Ok(ctx.instantiate(scheme)),
        None => {
            let err = TypeError::UnboundVariable { name: name.to_string(), span };
            ctx.errors.push(err.clone());
            Err(err)
        }
    }
}

fn infer_let(
    ctx: &mut InferCtx,
    env: &TypeEnv,
    name: &str,
    is_rec: bool,
    value: &Expr,
    body: &Expr,
) -> Result<Ty, TypeError> {
    ctx.enter_level();

    let value_ty = if is_rec {
        let self_var = ctx.fresh_var();
        let rec_env = env.bind(name, Scheme::mono(self_var.clone()));
        let inferred = infer_expr(ctx, &rec_env, value)?;
        ctx.unify(self_var, inferred.clone(), ConstraintOrigin::LetBinding { span: value.span() })?;
        inferred
    } else {
        infer_expr(ctx, env, value)?
    };

    ctx.leave_level();
    let scheme = ctx.generalize(value_ty);
    let body_env = env.bind(name, scheme);
    infer_expr(ctx, &body_env, body)
}

fn infer_lambda(ctx: &mut InferCtx, env: &TypeEnv, param: &str, body: &Expr) -> Result<Ty, TypeError> {
    let param_ty = ctx.fresh_var();
    let body_env = env.bind(param, Scheme::mono(param_ty.clone()));
    let body_ty = infer_expr(ctx, &body_env, body)?;
    Ok(Ty::fun(param_ty, body_ty))
}

fn infer_app(ctx: &mut InferCtx, env: &TypeEnv, func: &Expr, arg: &Expr, span: Span) -> Result<Ty, TypeError> {
    let func_ty = infer_expr(ctx, env, func)?;
    let arg_ty = infer_expr(ctx, env, arg)?;
    let ret_var = ctx.fresh_var();
    ctx.unify(
        func_ty,
        Ty::fun(arg_ty, ret_var.clone()),
        ConstraintOrigin::FnArg { call_site: span },
    )?;
    Ok(ret_var)
}

fn infer_binary_op(
    ctx: &mut InferCtx,
    env: &TypeEnv,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
) -> Result<Ty, TypeError> {
    let lhs_ty = infer_expr(ctx, env, lhs)?;
    let rhs_ty = infer_expr(ctx, env, rhs)?;
    let origin = ConstraintOrigin::BinOp { op_span: span };

    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            ctx.unify(lhs_ty.clone(), rhs_ty, origin)?;
            Ok(lhs_ty)
        }
        BinOp::Concat => {
            ctx.unify(lhs_ty, Ty::string(), origin.clone())?;
            ctx.unify(rhs_ty, Ty::string(), origin)?;
            Ok(Ty::string())
        }
        BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
            ctx.unify(lhs_ty, rhs_ty, origin)?;
            Ok(Ty::bool())
        }
        BinOp::And | BinOp::Or => {
            ctx.unify(lhs_ty, Ty::bool(), origin.clone())?;
            ctx.unify(rhs_ty, Ty::bool(), origin)?;
            Ok(Ty::bool())
        }
    }
}

fn infer_unary_op(ctx: &mut InferCtx, env: &TypeEnv, op: UnOp, operand: &Expr) -> Result<Ty, TypeError> {
    let operand_ty = infer_expr(ctx, env, operand)?;
    match op {
        UnOp::Neg => Ok(operand_ty),
        UnOp::Not => {
            ctx.unify(operand_ty, Ty::bool(), ConstraintOrigin::Builtin)?;
            Ok(Ty::bool())
        }
    }
}

/// Infer a pipeline stage `lhs |> rhs`.
///
/// The parser never distinguishes "standalone" vs. "pipe-tail" catch/unwrap
/// at the AST level: `RecoveryBinder.protected` is always `None`, and a
/// postfix `?` always wraps whatever expression preceded it. It is this
/// function, not the parser, that gives `rhs: Unwrap { .. }` and
/// `rhs: RecoveryBinder { .. }` their pipe-specific meaning: lhs is the
/// value/computation the unwrap or recovery applies to.
fn infer_pipe(ctx: &mut InferCtx, env: &TypeEnv, lhs: &Expr, rhs: &Expr, span: Span) -> Result<Ty, TypeError> {
    let lhs_ty = infer_expr(ctx, env, lhs)?;
    let origin = ConstraintOrigin::Pipe { span };

    match rhs {
        // `lhs |> f?`: apply f to lhs, expecting a Result, then unwrap it.
        Expr::Unwrap { inner, .. } => {
            let inner_ty = infer_expr(ctx, env, inner)?;
            let ret_var = ctx.fresh_var();
            ctx.unify(
                inner_ty,
                Ty::fun(lhs_ty, Ty::result(ret_var.clone())),
                ConstraintOrigin::FnArg { call_site: span },
            )?;
            Ok(ret_var)
        }

        // `lhs |> catch e -> fallback`: lhs is the protected computation.
        // Both lhs and fallback must agree on the recovered type; no Result
        // wrapping is visible at the type level, since unwinding on `?`
        // failure is an evaluator-level control transfer, not a type.
        Expr::RecoveryBinder { err_name, fallback, .. } => {
            let fallback_env = env.bind(err_name.clone(), Scheme::mono(Ty::string()));
            let fallback_ty = infer_expr(ctx, &fallback_env, fallback)?;
            ctx.unify(fallback_ty, lhs_ty.clone(), origin)?;
            Ok(lhs_ty)
        }

        // Ordinary pipeline stage: rhs must be a function accepting lhs.
        _ => {
            let rhs_ty = infer_expr(ctx, env, rhs)?;
            let ret_var = ctx.fresh_var();
            ctx.unify(rhs_ty, Ty::fun(lhs_ty, ret_var.clone()), origin)?;
            Ok(ret_var)
        }
    }
}

/// Infer a standalone `expr?`: `expr` itself must already be a `Result a`
/// (unlike the pipe-tail case, there is no function application here).
fn infer_unwrap(ctx: &mut InferCtx, env: &TypeEnv, inner: &Expr, span: Span) -> Result<Ty, TypeError> {
    let inner_ty = infer_expr(ctx, env, inner)?;
    let resolved = ctx.resolve(inner_ty.clone());
    if let Ty::Result(ok) = resolved {
        return Ok(*ok);
    }
    let ret_var = ctx.fresh_var();
    match ctx.unify(inner_ty, Ty::result(ret_var.clone()), ConstraintOrigin::Builtin) {
        Ok(()) => Ok(ret_var),
        Err(_) => {
            let err = TypeError::UnwrapOnNonResult { ty: resolved, span };
            ctx.errors.push(err.clone());
            Err(err)
        }
    }
}

/// Infer a standalone `catch e -> fallback`, with no protected expression.
/// This is a rare shape not exercised by any pipeline program; since there
/// is nothing to recover from, it behaves like a plain lambda from the
/// error value to the fallback's type.
fn infer_recovery_binder(
    ctx: &mut InferCtx,
    env: &TypeEnv,
    protected: Option<&Expr>,
    err_name: &str,
    fallback: &Expr,
    _span: Span,
) -> Result<Ty, TypeError> {
    debug_assert!(protected.is_none(), "parser never populates `protected`");
    let fallback_env = env.bind(err_name, Scheme::mono(Ty::string()));
    infer_expr(ctx, &fallback_env, fallback)
}

fn infer_match(
    ctx: &mut InferCtx,
    env: &TypeEnv,
    subject: &Expr,
    cases: &[(Pattern, Expr)],
) -> Result<Ty, TypeError> {
    let subject_ty = infer_expr(ctx, env, subject)?;

    let mut result_ty: Option<Ty> = None;
    for (pattern, body) in cases {
        let arm_env = infer_pattern(ctx, env, pattern, &subject_ty)?;
        let body_ty = infer_expr(ctx, &arm_env, body)?;
        match result_ty.take() {
            Some(prev) => {
                ctx.unify(
                    prev.clone(),
                    body_ty,
                    ConstraintOrigin::MatchArms { span: pattern.span() },
                )?;
                result_ty = Some(prev);
            }
            None => result_ty = Some(body_ty),
        }
    }

    Ok(result_ty.unwrap_or_else(|| ctx.fresh_var()))
}

/// Infer a pattern's type against the scrutinee type, returning the
/// extended environment with every variable the pattern binds.
fn infer_pattern(ctx: &mut InferCtx, env: &TypeEnv, pattern: &Pattern, scrutinee_ty: &Ty) -> Result<TypeEnv, TypeError> {
    match pattern {
        Pattern::Int(_, _) => {
            ctx.unify(Ty::int(), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            Ok(env.clone())
        }
        Pattern::Float(_, _) => {
            ctx.unify(Ty::float(), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            Ok(env.clone())
        }
        Pattern::Str(_, _) => {
            ctx.unify(Ty::string(), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            Ok(env.clone())
        }
        Pattern::Bool(_, _) => {
            ctx.unify(Ty::bool(), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            Ok(env.clone())
        }
        Pattern::Wildcard(_) => Ok(env.clone()),
        Pattern::Ident(name, _) => Ok(env.bind(name.clone(), Scheme::mono(scrutinee_ty.clone()))),

        // `Ok`/`Err` destructure the built-in `Result` type and, unlike
        // open tags, DO unify against the scrutinee: matching `Ok(n)`
        // means the scrutinee really is a `Result`.
        Pattern::Tag { name, subpatterns, .. } if name == "Ok" && subpatterns.len() == 1 => {
            let ok_var = ctx.fresh_var();
            ctx.unify(Ty::result(ok_var.clone()), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            infer_pattern(ctx, env, &subpatterns[0], &ok_var)
        }
        Pattern::Tag { name, subpatterns, .. } if name == "Err" && subpatterns.len() == 1 => {
            let ok_var = ctx.fresh_var();
            ctx.unify(Ty::result(ok_var), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            infer_pattern(ctx, env, &subpatterns[0], &Ty::string())
        }

        // Open tags otherwise (no declared sum-type registry): a tag
        // pattern does NOT unify its constructor against the scrutinee's
        // type, so two arms of the same match may test different,
        // unrelated constructors (`Circle(r)`, `Rect(w, h)`) without
        // forcing the scrutinee into one concrete `Tag` shape. Each
        // subpattern binds a fresh, arm-local type, resolved from how the
        // arm body uses it.
        Pattern::Tag { subpatterns, .. } => {
            let mut out = env.clone();
            for sub in subpatterns {
                let var = ctx.fresh_var();
                out = infer_pattern(ctx, &out, sub, &var)?;
            }
            Ok(out)
        }

        Pattern::Tuple(subpatterns, _) => {
            let elem_vars: Vec<Ty> = subpatterns.iter().map(|_| ctx.fresh_var()).collect();
            ctx.unify(Ty::Tuple(elem_vars.clone()), scrutinee_ty.clone(), ConstraintOrigin::Builtin)?;
            let mut out = env.clone();
            for (sub, var) in subpatterns.iter().zip(elem_vars.iter()) {
                out = infer_pattern(ctx, &out, sub, var)?;
            }
            Ok(out)
        }

        Pattern::Record(fields, _) => {
            let mut field_vars = std::collections::BTreeMap::new();
            for (name, _) in fields {
                field_vars.insert(name.clone(), ctx.fresh_var());
            }
            let row_var = ctx.fresh_row_var();
            ctx.unify(
                Ty::Record(field_vars.clone(), RowTail::Open(row_var)),
                scrutinee_ty.clone(),
                ConstraintOrigin::Builtin,
            )?;
            let mut out = env.clone();
            for (name, sub) in fields {
                let var = field_vars.get(name).expect("just inserted").clone();
                out = infer_pattern(ctx, &out, sub, &var)?;
            }
            Ok(out)
        }
    }
}

fn infer_conditional(
    ctx: &mut InferCtx,
    env: &TypeEnv,
    cond: &Expr,
    then_branch: &Expr,
    else_branch: &Expr,
    span: Span,
) -> Result<Ty, TypeError> {
    let cond_ty = infer_expr(ctx, env, cond)?;
    ctx.unify(cond_ty, Ty::bool(), ConstraintOrigin::Builtin)?;

    let then_ty = infer_expr(ctx, env, then_branch)?;
    let else_ty = infer_expr(ctx, env, else_branch)?;
    ctx.unify(then_ty.clone(), else_ty, ConstraintOrigin::IfBranches { span })?;
    Ok(then_ty)
}

fn infer_list(ctx: &mut InferCtx, env: &TypeEnv, elems: &[Expr]) -> Result<Ty, TypeError> {
    let elem_var = ctx.fresh_var();
    for e in elems {
        let ty = infer_expr(ctx, env, e)?;
        ctx.unify(ty, elem_var.clone(), ConstraintOrigin::Builtin)?;
    }
    Ok(Ty::list(elem_var))
}

fn infer_field_access(ctx: &mut InferCtx, env: &TypeEnv, record: &Expr, field: &str, span: Span) -> Result<Ty, TypeError> {
    let record_ty = infer_expr(ctx, env, record)?;
    let resolved = ctx.resolve(record_ty.clone());

    if let Ty::Record(fields, tail) = &resolved {
        if let Some(ty) = fields.get(field) {
            return Ok(ty.clone());
        }
        if matches!(tail, RowTail::Closed) {
            let err = TypeError::NoSuchField { ty: resolved, field_name: field.to_string(), span };
            ctx.errors.push(err.clone());
            return Err(err);
        }
    }

    let field_var = ctx.fresh_var();
    let row_var = ctx.fresh_row_var();
    let mut expected_fields = std::collections::BTreeMap::new();
    expected_fields.insert(field.to_string(), field_var.clone());
    ctx.unify(
        resolved,
        Ty::Record(expected_fields, RowTail::Open(row_var)),
        ConstraintOrigin::Builtin,
    )?;
    Ok(field_var)
}
