//! Built-in function type registration.
//!
//! Seeds the type environment with polymorphic schemes for Leverr's ten
//! built-in functions (`map`, `filter`, `fold`, `length`, `head`, `tail`,
//! `to_string`, `print`, `concat`, `each`). Every built-in is curried, in
//! keeping with every other Leverr function, so pipeline stages like
//! `|> filter(fn(x) -> x > 2)` read as partial application of the
//! built-in followed by the piped argument.

use crate::env::TypeEnv;
use crate::ty::{Scheme, Ty, TyVar};
use crate::unify::InferCtx;

/// Register every built-in function's type scheme into `env`, returning
/// the extended environment. Each scheme is built from fresh type
/// variables allocated through `ctx`, so later instantiation produces
/// variables that do not collide with anything already in the program.
pub fn register_builtins(ctx: &mut InferCtx, env: &TypeEnv) -> TypeEnv {
    let mut env = env.clone();

    env = env.bind("map", poly1(ctx, |a, b| {
        Ty::fun(Ty::fun(a.clone(), b.clone()), Ty::fun(Ty::list(a), Ty::list(b)))
    }));

    env = env.bind("filter", poly1(ctx, |a, _b| {
        Ty::fun(Ty::fun(a.clone(), Ty::bool()), Ty::fun(Ty::list(a.clone()), Ty::list(a)))
    }));

    env = env.bind("fold", poly1(ctx, |a, b| {
        Ty::fun(
            b.clone(),
            Ty::fun(Ty::fun(b.clone(), Ty::fun(a.clone(), b.clone())), Ty::fun(Ty::list(a), b)),
        )
    }));

    env = env.bind("length", poly1(ctx, |a, _b| Ty::fun(Ty::list(a), Ty::int())));

    env = env.bind("head", poly1(ctx, |a, _b| Ty::fun(Ty::list(a.clone()), Ty::result(a))));

    env = env.bind("tail", poly1(ctx, |a, _b| {
        Ty::fun(Ty::list(a.clone()), Ty::result(Ty::list(a)))
    }));

    env = env.bind("to_string", poly1(ctx, |a, _b| Ty::fun(a, Ty::string())));

    env = env.bind("print", poly1(ctx, |a, _b| Ty::fun(a, Ty::unit())));

    env = env.bind(
        "concat",
        Scheme::mono(Ty::fun(Ty::string(), Ty::fun(Ty::string(), Ty::string()))),
    );

    env = env.bind("each", poly1(ctx, |a, _b| {
        Ty::fun(Ty::fun(a.clone(), Ty::unit()), Ty::fun(Ty::list(a), Ty::unit()))
    }));

    env
}

/// Build a scheme quantified over two fresh variables `a` and `b`, handing
/// both to `build` even when a built-in only needs one of them.
fn poly1(ctx: &mut InferCtx, build: impl FnOnce(Ty, Ty) -> Ty) -> Scheme {
    let a = fresh(ctx);
    let b = fresh(ctx);
    let (va, vb) = (var_of(&a), var_of(&b));
    let ty = build(a, b);
    Scheme {
        vars: vec![va, vb],
        ty,
    }
}

fn fresh(ctx: &mut InferCtx) -> Ty {
    ctx.fresh_var()
}

fn var_of(ty: &Ty) -> TyVar {
    match ty {
        Ty::Var(v) => *v,
        _ => unreachable!("fresh() always returns Ty::Var"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_all_ten() {
        let mut ctx = InferCtx::new();
        let env = register_builtins(&mut ctx, &TypeEnv::new());

        for name in [
            "map", "filter", "fold", "length", "head", "tail", "to_string", "print", "concat", "each",
        ] {
            assert!(env.lookup(name).is_some(), "missing builtin `{name}`");
        }
    }

    #[test]
    fn map_is_polymorphic_over_two_vars() {
        let mut ctx = InferCtx::new();
        let env = register_builtins(&mut ctx, &TypeEnv::new());
        let scheme = env.lookup("map").unwrap();
        assert_eq!(scheme.vars.len(), 2);
        assert!(matches!(scheme.ty, Ty::Fun(_, _)));
    }

    #[test]
    fn head_returns_a_result() {
        let mut ctx = InferCtx::new();
        let env = register_builtins(&mut ctx, &TypeEnv::new());
        let scheme = env.lookup("head").unwrap();
        match &scheme.ty {
            Ty::Fun(_, ret) => assert!(matches!(**ret, Ty::Result(_))),
            other => panic!("expected function type, got {other:?}"),
        }
    }
}
