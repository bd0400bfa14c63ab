//! Value environment with persistent, immutable scoping.
//!
//! Mirrors `leverr_typeck::env::TypeEnv`: `bind` returns a new environment
//! sharing the old one's frames via `Rc` rather than mutating a shared
//! scope stack, so captured closures snapshot exactly the bindings visible
//! at creation time (spec.md §5).
//!
//! The one deliberate exception is `backpatch`, used solely to realize
//! `let rec`'s closure fix-point (spec.md §4.5): it mutates the frame's
//! contents in place so that a closure which already captured this frame
//! observes the update, establishing the self-reference cycle.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

#[derive(Debug, PartialEq)]
struct Frame {
    bindings: RefCell<FxHashMap<String, Value>>,
    parent: Option<Rc<Frame>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Env {
    top: Option<Rc<Frame>>,
}

impl Env {
    pub fn new() -> Self {
        Env { top: None }
    }

    /// Return a new environment with `name` bound to `value`, shadowing
    /// any existing binding of the same name. The receiver is unchanged.
    pub fn bind(&self, name: impl Into<String>, value: Value) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(name.into(), value);
        Env {
            top: Some(Rc::new(Frame {
                bindings: RefCell::new(bindings),
                parent: self.top.clone(),
            })),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut frame = self.top.as_deref();
        while let Some(f) = frame {
            if let Some(value) = f.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            frame = f.parent.as_deref();
        }
        None
    }

    /// Rebind `name` in this environment's own (innermost) frame in
    /// place. Used only by `let rec`'s closure fix-point; every other
    /// binding goes through `bind`.
    pub fn backpatch(&self, name: &str, value: Value) {
        if let Some(top) = &self.top {
            top.bindings.borrow_mut().insert(name.to_string(), value);
        }
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_own_and_parent_bindings() {
        let outer = Env::new().bind("x", Value::Int(1));
        let inner = outer.bind("y", Value::Bool(true));
        assert_eq!(inner.lookup("x"), Some(Value::Int(1)));
        assert_eq!(inner.lookup("y"), Some(Value::Bool(true)));
        assert_eq!(inner.lookup("z"), None);
    }

    #[test]
    fn shadowing_does_not_mutate_outer() {
        let outer = Env::new().bind("x", Value::Int(1));
        let inner = outer.bind("x", Value::Int(2));
        assert_eq!(inner.lookup("x"), Some(Value::Int(2)));
        assert_eq!(outer.lookup("x"), Some(Value::Int(1)));
    }

    #[test]
    fn backpatch_is_visible_through_a_previously_captured_clone() {
        let env = Env::new().bind("self", Value::Unit);
        let captured = env.clone();
        env.backpatch("self", Value::Int(42));
        assert_eq!(captured.lookup("self"), Some(Value::Int(42)));
    }
}
