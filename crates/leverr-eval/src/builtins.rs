//! Built-in function registration and dispatch.
//!
//! Seeds the initial value environment with Leverr's ten built-ins as
//! `Value::Builtin` entries (name + declared arity), mirroring
//! `leverr_typeck::builtins::register_builtins`'s environment-seeding
//! pattern applied to the value environment instead of the type
//! environment. `invoke` runs a built-in once all of its arguments have
//! accumulated (see `crate::eval::apply`'s auto-currying).

use leverr_common::span::Span;

use crate::env::Env;
use crate::error::{RuntimeError, Unwind};
use crate::eval::apply;
use crate::sink::Sink;
use crate::value::{render_plain, Builtin, Value};
use std::rc::Rc;

const NAMES_AND_ARITIES: &[(&str, usize)] = &[
    ("map", 2),
    ("filter", 2),
    ("fold", 3),
    ("length", 1),
    ("head", 1),
    ("tail", 1),
    ("to_string", 1),
    ("print", 1),
    ("concat", 2),
    ("each", 2),
];

/// Seed `env` with every built-in, each as a zero-argument-applied,
/// fully-curried `Value::Builtin`.
pub fn register_builtins(env: &Env) -> Env {
    let mut env = env.clone();
    for (name, arity) in NAMES_AND_ARITIES {
        env = env.bind(
            *name,
            Value::Builtin(Rc::new(Builtin {
                name: (*name).to_string(),
                arity: *arity,
                applied: Vec::new(),
            })),
        );
    }
    env
}

/// Run a fully-applied built-in. `span` is the call site, used for any
/// runtime errors the built-in itself raises.
pub fn invoke(name: &str, args: Vec<Value>, sink: &mut dyn Sink, span: Span) -> Result<Value, Unwind> {
    match name {
        "map" => map(args, sink, span),
        "filter" => filter(args, sink, span),
        "fold" => fold(args, sink, span),
        "length" => length(args, span),
        "head" => head(args, span),
        "tail" => tail(args, span),
        "to_string" => to_string_builtin(args, span),
        "print" => print_builtin(args, sink, span),
        "concat" => concat(args, span),
        "each" => each(args, sink, span),
        _ => unreachable!("unknown built-in `{name}` registered"),
    }
}

fn map(mut args: Vec<Value>, sink: &mut dyn Sink, span: Span) -> Result<Value, Unwind> {
    let xs = take_list(args.pop().unwrap(), span)?;
    let f = args.pop().unwrap();
    let mut out = Vec::with_capacity(xs.len());
    for x in xs {
        out.push(apply(f.clone(), x, sink, span)?);
    }
    Ok(Value::List(out))
}

fn filter(mut args: Vec<Value>, sink: &mut dyn Sink, span: Span) -> Result<Value, Unwind> {
    let xs = take_list(args.pop().unwrap(), span)?;
    let pred = args.pop().unwrap();
    let mut out = Vec::new();
    for x in xs {
        match apply(pred.clone(), x.clone(), sink, span)? {
            Value::Bool(true) => out.push(x),
            Value::Bool(false) => {}
            _ => return Err(RuntimeError::OperatorTypeMismatch { span }.into()),
        }
    }
    Ok(Value::List(out))
}

fn fold(mut args: Vec<Value>, sink: &mut dyn Sink, span: Span) -> Result<Value, Unwind> {
    let xs = take_list(args.pop().unwrap(), span)?;
    let step = args.pop().unwrap();
    let mut acc = args.pop().unwrap();
    for x in xs {
        let partial = apply(step.clone(), acc, sink, span)?;
        acc = apply(partial, x, sink, span)?;
    }
    Ok(acc)
}

fn length(mut args: Vec<Value>, span: Span) -> Result<Value, Unwind> {
    match args.pop().unwrap() {
        Value::List(elems) => Ok(Value::Int(elems.len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

fn head(mut args: Vec<Value>, span: Span) -> Result<Value, Unwind> {
    let xs = take_list(args.pop().unwrap(), span)?;
    match xs.into_iter().next() {
        Some(first) => Ok(Value::Tag("Ok".to_string(), vec![first])),
        None => Ok(Value::Tag("Err".to_string(), vec![Value::Str("empty list".to_string())])),
    }
}

fn tail(mut args: Vec<Value>, span: Span) -> Result<Value, Unwind> {
    let xs = take_list(args.pop().unwrap(), span)?;
    if xs.is_empty() {
        Ok(Value::Tag("Err".to_string(), vec![Value::Str("empty list".to_string())]))
    } else {
        Ok(Value::Tag("Ok".to_string(), vec![Value::List(xs[1..].to_vec())]))
    }
}

fn to_string_builtin(mut args: Vec<Value>, _span: Span) -> Result<Value, Unwind> {
    Ok(Value::Str(render_plain(&args.pop().unwrap())))
}

fn print_builtin(mut args: Vec<Value>, sink: &mut dyn Sink, _span: Span) -> Result<Value, Unwind> {
    let v = args.pop().unwrap();
    sink.print_line(&render_plain(&v));
    Ok(Value::Unit)
}

fn concat(mut args: Vec<Value>, span: Span) -> Result<Value, Unwind> {
    let b = args.pop().unwrap();
    let a = args.pop().unwrap();
    match (a, b) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}

fn each(mut args: Vec<Value>, sink: &mut dyn Sink, span: Span) -> Result<Value, Unwind> {
    let xs = take_list(args.pop().unwrap(), span)?;
    let f = args.pop().unwrap();
    for x in xs {
        apply(f.clone(), x, sink, span)?;
    }
    Ok(Value::Unit)
}

fn take_list(value: Value, span: Span) -> Result<Vec<Value>, Unwind> {
    match value {
        Value::List(elems) => Ok(elems),
        _ => Err(RuntimeError::OperatorTypeMismatch { span }.into()),
    }
}
