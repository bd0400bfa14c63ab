//! Runtime values produced by evaluation.
//!
//! Every compound value (list, tuple, record, tag) is logically immutable:
//! no evaluator operation mutates an existing value in place, matching
//! spec.md §5's "shared state" policy. Closures and built-ins are cheap to
//! clone (`Rc`-backed) since the same function value routinely flows
//! through several pipeline stages.

use std::fmt;
use std::rc::Rc;

use leverr_parser::ast::Expr;

use crate::env::Env;

/// A closure: a lambda's parameter, body, and a snapshot of the
/// environment captured at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub param: String,
    pub body: Rc<Expr>,
    pub env: Env,
}

/// A built-in function, auto-curried. `applied` accumulates arguments as
/// partial application proceeds; once `applied.len() == arity` the
/// built-in's underlying callable runs (see `crate::builtins::invoke`).
#[derive(Debug, Clone, PartialEq)]
pub struct Builtin {
    pub name: String,
    pub arity: usize,
    pub applied: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Unit,
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered field list (spec.md §6: records render preserving
    /// insertion order, which a hash map cannot guarantee).
    Record(Vec<(String, Value)>),
    Tag(String, Vec<Value>),
    Closure(Rc<Closure>),
    Builtin(Rc<Builtin>),
}

impl Value {
    pub fn unit() -> Value {
        Value::Unit
    }

    /// A lowercase shape name for error messages (`"Int"`, `"closure"`, …).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Bool(_) => "Bool",
            Value::Unit => "Unit",
            Value::List(_) => "List",
            Value::Tuple(_) => "Tuple",
            Value::Record(_) => "Record",
            Value::Tag(..) => "Tag",
            Value::Closure(_) => "closure",
            Value::Builtin(_) => "built-in",
        }
    }

    /// Look up a field on a record by name, in insertion order.
    pub fn record_field(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == field).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Structural equality used for `==`/`!=`. Closures and built-ins never
/// compare equal to anything, including themselves, since function
/// identity has no meaningful notion of equality in the surface language.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Unit, Value::Unit) => true,
        (Value::List(x), Value::List(y)) | (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (Value::Record(x), Value::Record(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(name, v)| y.iter().any(|(n2, v2)| n2 == name && values_equal(v, v2)))
        }
        (Value::Tag(n1, a1), Value::Tag(n2, a2)) => {
            n1 == n2 && a1.len() == a2.len() && a1.iter().zip(a2).all(|(a, b)| values_equal(a, b))
        }
        _ => false,
    }
}

impl fmt::Display for Value {
    /// Spec.md §6's runtime output format: integers/floats by their
    /// textual form, strings double-quoted, `()` for unit, `[...]`/`(...)`
    /// for lists/tuples, `{ f: v, .. }` for records, bare `Name` or
    /// `Name(a1, a2)` for tags, and opaque placeholders for callables.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Unit => write!(f, "()"),
            Value::List(elems) => {
                write!(f, "[")?;
                write_joined(f, elems)?;
                write!(f, "]")
            }
            Value::Tuple(elems) => {
                write!(f, "(")?;
                write_joined(f, elems)?;
                write!(f, ")")
            }
            Value::Record(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, " }}")
            }
            Value::Tag(name, args) => {
                if args.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "{name}(")?;
                    write_joined(f, args)?;
                    write!(f, ")")
                }
            }
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Builtin(b) => write!(f, "<built-in {}>", b.name),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{v}")?;
    }
    Ok(())
}

/// `to_string`/`print`'s rule: a top-level string passes through unchanged
/// (no quotes); every other value uses the full `Display` pretty-printing.
pub fn render_plain(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_primitives() {
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Unit.to_string(), "()");
        assert_eq!(Value::Str("hi".into()).to_string(), "\"hi\"");
    }

    #[test]
    fn renders_compound_values_recursively() {
        let list = Value::List(vec![Value::Int(1), Value::Str("a".into())]);
        assert_eq!(list.to_string(), "[1, \"a\"]");

        let rec = Value::Record(vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))]);
        assert_eq!(rec.to_string(), "{ x: 1, y: 2 }");

        let tag = Value::Tag("Circle".into(), vec![Value::Int(3)]);
        assert_eq!(tag.to_string(), "Circle(3)");

        let zero_arg_tag = Value::Tag("None".into(), vec![]);
        assert_eq!(zero_arg_tag.to_string(), "None");
    }

    #[test]
    fn render_plain_unquotes_top_level_strings_only() {
        assert_eq!(render_plain(&Value::Str("hi".into())), "hi");
        let nested = Value::List(vec![Value::Str("hi".into())]);
        assert_eq!(render_plain(&nested), "[\"hi\"]");
    }

    #[test]
    fn equality_is_structural_and_functions_never_equal() {
        assert!(values_equal(&Value::Int(1), &Value::Int(1)));
        assert!(!values_equal(&Value::Int(1), &Value::Int(2)));
        let tag_a = Value::Tag("Ok".into(), vec![Value::Int(1)]);
        let tag_b = Value::Tag("Ok".into(), vec![Value::Int(1)]);
        assert!(values_equal(&tag_a, &tag_b));
    }
}
