//! Unification engine for Hindley-Milner type inference.
//!
//! Implements the core unification algorithm using `ena`'s union-find table.
//! Supports occurs check (infinite type detection), level-based generalization,
//! and scheme instantiation.

use std::collections::BTreeMap;

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{RowTail, Scheme, Ty, TyVar};

/// The inference context -- owns the unification table, level state, and errors.
///
/// All type inference happens through this context. It creates fresh type
/// variables, unifies types, tracks levels for generalization, and collects
/// errors.
pub struct InferCtx {
    /// The union-find unification table (ena).
    table: InPlaceUnificationTable<TyVar>,
    /// Current let-nesting level for generalization.
    current_level: u32,
    /// Level at which each type variable was created. Indexed by `TyVar.0`.
    var_levels: Vec<u32>,
    /// Type errors accumulated during inference.
    pub errors: Vec<TypeError>,
}

impl InferCtx {
    /// Create a new, empty inference context.
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            current_level: 0,
            var_levels: Vec::new(),
            errors: Vec::new(),
        }
    }

    // ── Type Variable Creation ──────────────────────────────────────────

    /// Create a fresh type variable at the current level.
    pub fn fresh_var(&mut self) -> Ty {
        let var = self.table.new_key(None);
        while self.var_levels.len() <= var.0 as usize {
            self.var_levels.push(0);
        }
        self.var_levels[var.0 as usize] = self.current_level;
        Ty::Var(var)
    }

    fn fresh_tyvar(&mut self) -> TyVar {
        match self.fresh_var() {
            Ty::Var(v) => v,
            _ => unreachable!(),
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Resolve a type by following union-find indirection.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Fun(param, ret) => {
                let param = Box::new(self.resolve(*param));
                let ret = Box::new(self.resolve(*ret));
                Ty::Fun(param, ret)
            }
            Ty::List(elem) => Ty::List(Box::new(self.resolve(*elem))),
            Ty::Tuple(elems) => Ty::Tuple(elems.into_iter().map(|e| self.resolve(e)).collect()),
            Ty::Record(fields, tail) => {
                let fields = fields.into_iter().map(|(k, v)| (k, self.resolve(v))).collect();
                let tail = match tail {
                    RowTail::Open(v) => match self.table.probe_value(v) {
                        Some(Ty::Record(inner_fields, inner_tail)) => {
                            return self.resolve(Ty::Record(
                                merge_rows(fields, inner_fields),
                                inner_tail,
                            ));
                        }
                        _ => RowTail::Open(self.table.find(v)),
                    },
                    RowTail::Closed => RowTail::Closed,
                };
                Ty::Record(fields, tail)
            }
            Ty::Result(ok) => Ty::Result(Box::new(self.resolve(*ok))),
            Ty::Tag(name, args) => Ty::Tag(name, args.into_iter().map(|a| self.resolve(a)).collect()),
            other => other,
        }
    }

    // ── Occurs Check ────────────────────────────────────────────────────

    /// Check if a type variable occurs anywhere within a type.
    pub fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if *v == var {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Con(_) => false,
            Ty::Fun(param, ret) => self.occurs_in(var, param) || self.occurs_in(var, ret),
            Ty::List(elem) => self.occurs_in(var, elem),
            Ty::Tuple(elems) => elems.iter().any(|e| self.occurs_in(var, e)),
            Ty::Record(fields, tail) => {
                fields.values().any(|t| self.occurs_in(var, t))
                    || matches!(tail, RowTail::Open(v) if *v == var)
            }
            Ty::Result(ok) => self.occurs_in(var, ok),
            Ty::Tag(_, args) => args.iter().any(|a| self.occurs_in(var, a)),
        }
    }

    // ── Unification ─────────────────────────────────────────────────────

    /// Unify two types, making them equal.
    ///
    /// Both types are first resolved through the union-find table, then
    /// structurally compared. If they differ, a type error is recorded.
    pub fn unify(&mut self, a: Ty, b: Ty, origin: ConstraintOrigin) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),

            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table
                    .unify_var_var(v1, v2)
                    .expect("unifying two unbound vars should not fail");
                Ok(())
            }

            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    let err = TypeError::InfiniteType { var: v, ty, origin };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    self.table
                        .unify_var_value(v, Some(ty))
                        .expect("binding a var to a concrete type after occurs check should not fail");
                    Ok(())
                }
            }

            (Ty::Con(c1), Ty::Con(c2)) => {
                if c1 == c2 {
                    Ok(())
                } else {
                    let err = TypeError::Mismatch {
                        expected: Ty::Con(c1),
                        found: Ty::Con(c2),
                        origin,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                }
            }

            (Ty::Fun(p1, r1), Ty::Fun(p2, r2)) => {
                self.unify(*p1, *p2, origin.clone())?;
                self.unify(*r1, *r2, origin)
            }

            (Ty::List(e1), Ty::List(e2)) => self.unify(*e1, *e2, origin),

            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                if e1.len() != e2.len() {
                    let err = TypeError::ArityMismatch {
                        expected: e1.len(),
                        found: e2.len(),
                        origin,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    for (x, y) in e1.into_iter().zip(e2.into_iter()) {
                        self.unify(x, y, origin.clone())?;
                    }
                    Ok(())
                }
            }

            (Ty::Record(f1, t1), Ty::Record(f2, t2)) => self.unify_records(f1, t1, f2, t2, origin),

            (Ty::Result(o1), Ty::Result(o2)) => self.unify(*o1, *o2, origin),

            (Ty::Tag(n1, a1), Ty::Tag(n2, a2)) => {
                if n1 != n2 {
                    let err = TypeError::Mismatch {
                        expected: Ty::Tag(n1, a1),
                        found: Ty::Tag(n2, a2),
                        origin,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                } else if a1.len() != a2.len() {
                    let err = TypeError::ArityMismatch {
                        expected: a1.len(),
                        found: a2.len(),
                        origin,
                    };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    for (x, y) in a1.into_iter().zip(a2.into_iter()) {
                        self.unify(x, y, origin.clone())?;
                    }
                    Ok(())
                }
            }

            (a, b) => {
                let err = TypeError::Mismatch { expected: a, found: b, origin };
                self.errors.push(err.clone());
                Err(err)
            }
        }
    }

    /// Record unification is deliberately loose: only fields present on
    /// both sides are required to match, regardless of whether either row
    /// is open or closed. A field present on one side but absent on the
    /// other is tolerated rather than rejected.
    fn unify_records(
        &mut self,
        f1: BTreeMap<String, Ty>,
        t1: RowTail,
        f2: BTreeMap<String, Ty>,
        t2: RowTail,
        origin: ConstraintOrigin,
    ) -> Result<(), TypeError> {
        for (name, ty1) in f1.iter() {
            if let Some(ty2) = f2.get(name) {
                self.unify(ty1.clone(), ty2.clone(), origin.clone())?;
            }
        }

        match (t1, t2) {
            // Closed/closed still unifies on the intersection only: a field
            // named on one side and absent on the other is tolerated, not
            // rejected (spec's deliberate looseness for record unification).
            (RowTail::Closed, RowTail::Closed) => Ok(()),
            (RowTail::Open(v), RowTail::Closed) | (RowTail::Closed, RowTail::Open(v)) => {
                let remaining: BTreeMap<String, Ty> = f2
                    .iter()
                    .chain(f1.iter())
                    .filter(|(k, _)| !f1.contains_key(*k) || !f2.contains_key(*k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                self.table
                    .unify_var_value(v, Some(Ty::closed_record(remaining)))
                    .expect("binding open row var should not fail");
                Ok(())
            }
            (RowTail::Open(v1), RowTail::Open(v2)) => {
                self.table
                    .unify_var_var(v1, v2)
                    .expect("unifying two row vars should not fail");
                Ok(())
            }
        }
    }

    // ── Level Management ────────────────────────────────────────────────

    pub fn enter_level(&mut self) {
        self.current_level += 1;
    }

    pub fn leave_level(&mut self) {
        debug_assert!(self.current_level > 0, "cannot leave level 0");
        self.current_level -= 1;
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    // ── Generalization ──────────────────────────────────────────────────

    /// Generalize a type into a polymorphic scheme: collects all type
    /// variables in `ty` whose level is strictly greater than
    /// `current_level`, which are exactly the ones introduced inside the
    /// `let`-body being generalized.
    pub fn generalize(&mut self, ty: Ty) -> Scheme {
        let resolved = self.resolve(ty);
        let mut free_vars = Vec::new();
        self.collect_generalizable_vars(&resolved, &mut free_vars);
        let mut seen = std::collections::HashSet::new();
        free_vars.retain(|v| seen.insert(*v));
        Scheme { vars: free_vars, ty: resolved }
    }

    fn collect_generalizable_vars(&mut self, ty: &Ty, out: &mut Vec<TyVar>) {
        match ty {
            Ty::Var(v) => match self.table.probe_value(*v) {
                Some(inner) => self.collect_generalizable_vars(&inner, out),
                None => {
                    let level = self.var_levels.get(v.0 as usize).copied().unwrap_or(0);
                    if level > self.current_level {
                        out.push(*v);
                    }
                }
            },
            Ty::Con(_) => {}
            Ty::Fun(param, ret) => {
                self.collect_generalizable_vars(param, out);
                self.collect_generalizable_vars(ret, out);
            }
            Ty::List(elem) => self.collect_generalizable_vars(elem, out),
            Ty::Tuple(elems) => {
                for e in elems {
                    self.collect_generalizable_vars(e, out);
                }
            }
            Ty::Record(fields, tail) => {
                for v in fields.values() {
                    self.collect_generalizable_vars(v, out);
                }
                if let RowTail::Open(v) = tail {
                    self.collect_generalizable_vars(&Ty::Var(*v), out);
                }
            }
            Ty::Result(ok) => self.collect_generalizable_vars(ok, out),
            Ty::Tag(_, args) => {
                for a in args {
                    self.collect_generalizable_vars(a, out);
                }
            }
        }
    }

    // ── Instantiation ───────────────────────────────────────────────────

    /// Instantiate a polymorphic scheme with fresh type variables.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        if scheme.vars.is_empty() {
            return scheme.ty.clone();
        }
        let substitution: FxHashMap<TyVar, Ty> =
            scheme.vars.iter().map(|v| (*v, self.fresh_var())).collect();
        self.apply_substitution(&scheme.ty, &substitution)
    }

    fn apply_substitution(&mut self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => {
                if let Some(replacement) = subst.get(v) {
                    replacement.clone()
                } else {
                    match self.table.probe_value(*v) {
                        Some(inner) => self.apply_substitution(&inner, subst),
                        None => ty.clone(),
                    }
                }
            }
            Ty::Con(_) => ty.clone(),
            Ty::Fun(param, ret) => Ty::Fun(
                Box::new(self.apply_substitution(param, subst)),
                Box::new(self.apply_substitution(ret, subst)),
            ),
            Ty::List(elem) => Ty::List(Box::new(self.apply_substitution(elem, subst))),
            Ty::Tuple(elems) => {
                Ty::Tuple(elems.iter().map(|e| self.apply_substitution(e, subst)).collect())
            }
            Ty::Record(fields, tail) => {
                let fields = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.apply_substitution(v, subst)))
                    .collect();
                let tail = match tail {
                    RowTail::Open(v) => match subst.get(v) {
                        Some(Ty::Var(fresh)) => RowTail::Open(*fresh),
                        _ => RowTail::Open(*v),
                    },
                    RowTail::Closed => RowTail::Closed,
                };
                Ty::Record(fields, tail)
            }
            Ty::Result(ok) => Ty::Result(Box::new(self.apply_substitution(ok, subst))),
            Ty::Tag(name, args) => Ty::Tag(
                name.clone(),
                args.iter().map(|a| self.apply_substitution(a, subst)).collect(),
            ),
        }
    }

    /// Allocate a fresh open row variable, for records whose full field set
    /// is not yet known (e.g. a lambda parameter accessed only by field).
    pub fn fresh_row_var(&mut self) -> TyVar {
        self.fresh_tyvar()
    }
}

fn merge_rows(mut outer: BTreeMap<String, Ty>, inner: BTreeMap<String, Ty>) -> BTreeMap<String, Ty> {
    for (k, v) in inner {
        outer.entry(k).or_insert(v);
    }
    outer
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin_origin() -> ConstraintOrigin {
        ConstraintOrigin::Builtin
    }

    #[test]
    fn unify_two_fresh_vars() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let b = ctx.fresh_var();

        assert!(ctx.unify(a.clone(), b.clone(), builtin_origin()).is_ok());
        assert!(ctx.unify(a.clone(), Ty::int(), builtin_origin()).is_ok());
        assert_eq!(ctx.resolve(a), Ty::int());
        assert_eq!(ctx.resolve(b), Ty::int());
    }

    #[test]
    fn unify_var_with_concrete() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        assert!(ctx.unify(a.clone(), Ty::int(), builtin_origin()).is_ok());
        assert_eq!(ctx.resolve(a), Ty::int());
    }

    #[test]
    fn unify_mismatch() {
        let mut ctx = InferCtx::new();
        let result = ctx.unify(Ty::int(), Ty::string(), builtin_origin());
        assert!(result.is_err());
        match result.unwrap_err() {
            TypeError::Mismatch { expected, found, .. } => {
                assert_eq!(expected, Ty::int());
                assert_eq!(found, Ty::string());
            }
            other => panic!("expected Mismatch, got {other:?}"),
        }
    }

    #[test]
    fn unify_function_return_mismatch() {
        let mut ctx = InferCtx::new();
        let f1 = Ty::fun(Ty::int(), Ty::string());
        let f2 = Ty::fun(Ty::int(), Ty::bool());
        let result = ctx.unify(f1, f2, builtin_origin());
        assert!(result.is_err());
    }

    #[test]
    fn occurs_check_infinite_type() {
        let mut ctx = InferCtx::new();
        let a = ctx.fresh_var();
        let fun = Ty::fun(a.clone(), Ty::int());
        let result = ctx.unify(a, fun, builtin_origin());
        assert!(matches!(result.unwrap_err(), TypeError::InfiniteType { .. }));
    }

    #[test]
    fn generalize_and_instantiate() {
        let mut ctx = InferCtx::new();
        ctx.enter_level();
        let a = ctx.fresh_var();
        let identity_ty = Ty::fun(a.clone(), a);
        ctx.leave_level();

        let scheme = ctx.generalize(identity_ty);
        assert_eq!(scheme.vars.len(), 1);

        let inst1 = ctx.instantiate(&scheme);
        let inst2 = ctx.instantiate(&scheme);
        match (&inst1, &inst2) {
            (Ty::Fun(p1, _), Ty::Fun(p2, _)) => assert_ne!(p1, p2),
            _ => panic!("expected function types"),
        }
    }

    #[test]
    fn unify_tuple_types() {
        let mut ctx = InferCtx::new();
        let t1 = Ty::Tuple(vec![Ty::int(), Ty::string()]);
        let t2 = Ty::Tuple(vec![Ty::int(), Ty::string()]);
        assert!(ctx.unify(t1, t2, builtin_origin()).is_ok());
    }

    #[test]
    fn unify_tuple_arity_mismatch() {
        let mut ctx = InferCtx::new();
        let t1 = Ty::Tuple(vec![Ty::int()]);
        let t2 = Ty::Tuple(vec![Ty::int(), Ty::int()]);
        let result = ctx.unify(t1, t2, builtin_origin());
        assert!(matches!(result.unwrap_err(), TypeError::ArityMismatch { .. }));
    }

    #[test]
    fn unify_tags_same_ctor() {
        let mut ctx = InferCtx::new();
        let a = Ty::Tag("Circle".into(), vec![Ty::int()]);
        let b = Ty::Tag("Circle".into(), vec![Ty::int()]);
        assert!(ctx.unify(a, b, builtin_origin()).is_ok());
    }

    #[test]
    fn unify_tags_different_ctor_is_mismatch() {
        let mut ctx = InferCtx::new();
        let a = Ty::Tag("Circle".into(), vec![Ty::int()]);
        let b = Ty::Tag("Rect".into(), vec![Ty::int(), Ty::int()]);
        let result = ctx.unify(a, b, builtin_origin());
        assert!(matches!(result.unwrap_err(), TypeError::Mismatch { .. }));
    }

    #[test]
    fn unify_records_with_disjoint_extra_fields_succeeds() {
        let mut ctx = InferCtx::new();
        let mut fa = BTreeMap::new();
        fa.insert("x".to_string(), Ty::int());
        fa.insert("y".to_string(), Ty::int());
        let a = Ty::Record(fa, RowTail::Open(ctx.fresh_row_var()));

        let mut fb = BTreeMap::new();
        fb.insert("x".to_string(), Ty::int());
        let b = Ty::Record(fb, RowTail::Open(ctx.fresh_row_var()));

        assert!(ctx.unify(a, b, builtin_origin()).is_ok());
    }

    #[test]
    fn unify_closed_records_only_require_shared_fields_to_match() {
        let mut ctx = InferCtx::new();
        let mut fa = BTreeMap::new();
        fa.insert("x".to_string(), Ty::int());
        let a = Ty::closed_record(fa);

        let mut fb = BTreeMap::new();
        fb.insert("x".to_string(), Ty::int());
        fb.insert("y".to_string(), Ty::int());
        let b = Ty::closed_record(fb);

        assert!(ctx.unify(a, b, builtin_origin()).is_ok());
    }

    #[test]
    fn unify_closed_records_still_reject_a_shared_field_mismatch() {
        let mut ctx = InferCtx::new();
        let mut fa = BTreeMap::new();
        fa.insert("x".to_string(), Ty::int());
        let a = Ty::closed_record(fa);

        let mut fb = BTreeMap::new();
        fb.insert("x".to_string(), Ty::string());
        let b = Ty::closed_record(fb);

        assert!(ctx.unify(a, b, builtin_origin()).is_err());
    }

    #[test]
    fn unify_result_types() {
        let mut ctx = InferCtx::new();
        assert!(ctx
            .unify(Ty::result(Ty::int()), Ty::result(Ty::int()), builtin_origin())
            .is_ok());
        assert!(ctx
            .unify(Ty::result(Ty::int()), Ty::result(Ty::string()), builtin_origin())
            .is_err());
    }

    #[test]
    fn ty_display() {
        assert_eq!(format!("{}", Ty::int()), "Int");
        assert_eq!(format!("{}", Ty::fun(Ty::int(), Ty::bool())), "Int -> Bool");
    }
}
