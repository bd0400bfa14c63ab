//! Type representation for Leverr's Hindley-Milner type system.
//!
//! Defines the core `Ty` enum, type constructors (`TyCon`), type variables
//! (`TyVar`), and polymorphic type schemes (`Scheme`).

use std::collections::BTreeMap;
use std::fmt;

/// A type variable, identified by a `u32` index into the unification table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyVar(pub u32);

/// A base type constructor: `Int`, `Float`, `Bool`, `String`, or `Unit`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyCon {
    pub name: String,
}

impl TyCon {
    pub fn new(name: impl Into<String>) -> Self {
        TyCon { name: name.into() }
    }
}

impl fmt::Display for TyCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A row-polymorphism tail for a record type: either closed (no more
/// fields possible) or open at an as-yet-unresolved type variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RowTail {
    Closed,
    Open(TyVar),
}

/// A Leverr type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// An inference variable, unresolved until bound by unification.
    Var(TyVar),
    /// `Int`, `Float`, `Bool`, `String`, or `Unit`.
    Con(TyCon),
    /// A single-parameter function type: every Leverr function is curried,
    /// so there is no parameter list here, only one parameter and a return.
    Fun(Box<Ty>, Box<Ty>),
    /// `List a`.
    List(Box<Ty>),
    /// `(a, b, ...)`.
    Tuple(Vec<Ty>),
    /// `{ field: ty, ... }`, with an optional open row variable standing in
    /// for "and possibly more fields" (spec.md's deliberately loose record
    /// unification).
    Record(BTreeMap<String, Ty>, RowTail),
    /// `Result a`. The error side is always `String`, per spec.md, so it is
    /// not carried as a type parameter.
    Result(Box<Ty>),
    /// An open tag constructor applied to its argument types, e.g.
    /// `Circle(Int)`. There is no declared sum-type registry: any uppercase
    /// name is an admissible constructor.
    Tag(String, Vec<Ty>),
}

impl Ty {
    pub fn int() -> Ty {
        Ty::Con(TyCon::new("Int"))
    }

    pub fn float() -> Ty {
        Ty::Con(TyCon::new("Float"))
    }

    pub fn string() -> Ty {
        Ty::Con(TyCon::new("String"))
    }

    pub fn bool() -> Ty {
        Ty::Con(TyCon::new("Bool"))
    }

    pub fn unit() -> Ty {
        Ty::Con(TyCon::new("Unit"))
    }

    pub fn fun(param: Ty, ret: Ty) -> Ty {
        Ty::Fun(Box::new(param), Box::new(ret))
    }

    pub fn list(elem: Ty) -> Ty {
        Ty::List(Box::new(elem))
    }

    pub fn result(ok: Ty) -> Ty {
        Ty::Result(Box::new(ok))
    }

    pub fn closed_record(fields: BTreeMap<String, Ty>) -> Ty {
        Ty::Record(fields, RowTail::Closed)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Con(c) => write!(f, "{}", c),
            Ty::Fun(param, ret) => write!(f, "{} -> {}", param, ret),
            Ty::List(elem) => write!(f, "List {}", elem),
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            Ty::Record(fields, tail) => {
                write!(f, "{{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, ty)?;
                }
                if matches!(tail, RowTail::Open(_)) {
                    write!(f, ", ..")?;
                }
                write!(f, " }}")
            }
            Ty::Result(ok) => write!(f, "Result {}", ok),
            Ty::Tag(name, args) => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "(")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// A polymorphic type scheme: a type with universally quantified variables.
#[derive(Clone, Debug)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    /// Create a monomorphic scheme (no quantified variables).
    pub fn mono(ty: Ty) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
        }
    }

    /// Render this scheme's type with each quantified variable given a
    /// stable, human-readable name (`a`, `b`, ..., `z`, `a1`, `b1`, ...)
    /// instead of its raw numeric id, with no name reused within the
    /// scheme even past 26 variables.
    pub fn display_with_names(&self) -> String {
        let mut names = BTreeMap::new();
        for (i, var) in self.vars.iter().enumerate() {
            names.insert(*var, var_name(i));
        }
        render_ty(&self.ty, &names)
    }
}

fn var_name(index: usize) -> String {
    let letter = (b'a' + (index % 26) as u8) as char;
    let generation = index / 26;
    if generation == 0 {
        letter.to_string()
    } else {
        format!("{letter}{generation}")
    }
}

fn render_ty(ty: &Ty, names: &BTreeMap<TyVar, String>) -> String {
    match ty {
        Ty::Var(v) => names.get(v).cloned().unwrap_or_else(|| format!("?{}", v.0)),
        Ty::Con(c) => c.to_string(),
        Ty::Fun(param, ret) => format!("{} -> {}", render_ty(param, names), render_ty(ret, names)),
        Ty::List(elem) => format!("List {}", render_ty(elem, names)),
        Ty::Tuple(elems) => {
            let parts: Vec<_> = elems.iter().map(|e| render_ty(e, names)).collect();
            format!("({})", parts.join(", "))
        }
        Ty::Record(fields, tail) => {
            let mut parts: Vec<_> = fields
                .iter()
                .map(|(name, ty)| format!("{name}: {}", render_ty(ty, names)))
                .collect();
            if matches!(tail, RowTail::Open(_)) {
                parts.push("..".to_string());
            }
            format!("{{ {} }}", parts.join(", "))
        }
        Ty::Result(ok) => format!("Result {}", render_ty(ok, names)),
        Ty::Tag(name, args) => {
            if args.is_empty() {
                name.clone()
            } else {
                let parts: Vec<_> = args.iter().map(|a| render_ty(a, names)).collect();
                format!("{name}({})", parts.join(", "))
            }
        }
    }
}

// ── ena trait implementations ──────────────────────────────────────────

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ty_display() {
        assert_eq!(format!("{}", Ty::int()), "Int");
        assert_eq!(format!("{}", Ty::fun(Ty::int(), Ty::bool())), "Int -> Bool");
        assert_eq!(format!("{}", Ty::list(Ty::int())), "List Int");
        assert_eq!(format!("{}", Ty::result(Ty::string())), "Result String");
        assert_eq!(format!("{}", Ty::Tuple(vec![Ty::int(), Ty::string()])), "(Int, String)");
        assert_eq!(format!("{}", Ty::Tag("Circle".into(), vec![Ty::int()])), "Circle(Int)");
        assert_eq!(format!("{}", Ty::Tag("Nothing".into(), vec![])), "Nothing");
    }

    #[test]
    fn scheme_display_names_vars_uniquely() {
        let scheme = Scheme {
            vars: vec![TyVar(10), TyVar(20)],
            ty: Ty::fun(Ty::Var(TyVar(10)), Ty::Var(TyVar(20))),
        };
        assert_eq!(scheme.display_with_names(), "a -> b");
    }

    #[test]
    fn scheme_display_past_26_vars_has_no_collisions() {
        let vars: Vec<TyVar> = (0..30).map(TyVar).collect();
        let scheme = Scheme {
            vars: vars.clone(),
            ty: Ty::Tuple(vars.iter().map(|v| Ty::Var(*v)).collect()),
        };
        let rendered = scheme.display_with_names();
        let names: Vec<&str> = rendered
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(", ")
            .collect();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len(), "no name should repeat within one scheme");
    }
}
