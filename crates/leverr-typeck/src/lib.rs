//! Leverr type checker: Hindley-Milner type inference with extensions.
//!
//! Assigns a single type to a Leverr program (one top-level expression per
//! `spec.md` §2) or reports the type errors that prevent it.
//!
//! - Hindley-Milner inference with let-polymorphism (`ty`, `infer`)
//! - Union-find unification with occurs check and level-based
//!   generalization (`unify`)
//! - Persistent, copy-on-bind type environment (`env`)
//! - Built-in function schemes (`builtins`)
//! - Span-carrying type errors (`error`, `diagnostics`)

pub mod builtins;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod infer;
pub mod ty;
pub mod unify;

pub use crate::error::{ConstraintOrigin, TypeError};
pub use crate::infer::{check, TypeckResult};
pub use crate::ty::{Scheme, Ty, TyCon, TyVar};
