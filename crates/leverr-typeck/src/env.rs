//! Type environment with persistent, immutable scoping.
//!
//! Unlike a mutable scope stack, `TypeEnv` is a cheaply-cloneable, parent-
//! linked chain of frames: `bind` returns a *new* environment sharing the
//! old one's frames via `Rc`, rather than mutating a shared stack in place.
//! This matches the evaluator's own environment representation and avoids
//! push/pop bookkeeping when inference recurses into and back out of
//! nested scopes (lambda bodies, match arms, let bodies).

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

struct Frame {
    bindings: FxHashMap<String, Scheme>,
    parent: Option<Rc<Frame>>,
}

/// A persistent type environment: an immutable, parent-linked chain of
/// name-to-scheme frames. Cloning an environment is an `Rc` bump, not a
/// deep copy.
#[derive(Clone)]
pub struct TypeEnv {
    top: Option<Rc<Frame>>,
}

impl TypeEnv {
    /// The empty environment (no bindings).
    pub fn new() -> Self {
        TypeEnv { top: None }
    }

    /// Return a new environment with `name` bound to `scheme`, shadowing
    /// any existing binding of the same name. The receiver is left
    /// unmodified.
    pub fn bind(&self, name: impl Into<String>, scheme: Scheme) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(name.into(), scheme);
        TypeEnv {
            top: Some(Rc::new(Frame {
                bindings,
                parent: self.top.clone(),
            })),
        }
    }

    /// Look up a name, searching from the innermost frame outward.
    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        let mut frame = self.top.as_deref();
        while let Some(f) = frame {
            if let Some(scheme) = f.bindings.get(name) {
                return Some(scheme);
            }
            frame = f.parent.as_deref();
        }
        None
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}
