//! REPL session state management.
//!
//! Tracks accumulated `let` definitions across REPL interactions. Leverr
//! has no top-level `let` statement -- every program is one expression,
//! and `let` only binds within an enclosing `in` body (`leverr_parser`
//! rejects a bare `let x = 1` with no `in`). A definition entered at the
//! prompt is therefore not executed on its own; it is held as text and
//! spliced, innermost-last, around every later line so that line sees
//! all prior definitions in scope. This mirrors `mesh-repl::ReplSession`'s
//! definitions-accumulate-as-context role, with the JIT wrapper-function
//! naming dropped (there is no codegen step to name a function for).

/// One definition entered at the prompt: `let [rec] name = rhs`.
struct Definition {
    name: String,
    is_rec: bool,
    rhs: String,
}

/// Persistent state for a REPL session.
pub struct Session {
    definitions: Vec<Definition>,
}

impl Session {
    /// Create a new empty REPL session.
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
        }
    }

    /// Store a `let [rec] name = rhs` definition for future lines.
    pub fn add_definition(&mut self, name: &str, is_rec: bool, rhs: &str) {
        self.definitions.push(Definition {
            name: name.to_string(),
            is_rec,
            rhs: rhs.to_string(),
        });
    }

    /// Names of every definition in scope, in the order they were entered.
    pub fn definition_names(&self) -> Vec<&str> {
        self.definitions.iter().map(|d| d.name.as_str()).collect()
    }

    /// Wrap `tail` in every accumulated definition, outermost-first, so
    /// that `tail` is evaluated with every prior definition visible.
    pub fn wrap(&self, tail: &str) -> String {
        let mut source = tail.to_string();
        for def in self.definitions.iter().rev() {
            let rec = if def.is_rec { "rec " } else { "" };
            source = format!("let {}{} = {} in {}", rec, def.name, def.rhs, source);
        }
        source
    }

    /// Clear all accumulated definitions.
    pub fn reset(&mut self) {
        self.definitions.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_wraps_to_identity() {
        let session = Session::new();
        assert_eq!(session.wrap("1 + 1"), "1 + 1");
        assert!(session.definition_names().is_empty());
    }

    #[test]
    fn add_definition_is_visible_in_wrap() {
        let mut session = Session::new();
        session.add_definition("x", false, "5");
        assert_eq!(session.wrap("x + 1"), "let x = 5 in x + 1");
    }

    #[test]
    fn definitions_nest_in_entry_order() {
        let mut session = Session::new();
        session.add_definition("x", false, "1");
        session.add_definition("y", false, "x + 1");
        assert_eq!(session.wrap("y"), "let x = 1 in let y = x + 1 in y");
    }

    #[test]
    fn rec_definitions_carry_the_rec_keyword() {
        let mut session = Session::new();
        session.add_definition("fib", true, "fn(n) -> n");
        assert_eq!(session.wrap("fib(1)"), "let rec fib = fn(n) -> n in fib(1)");
    }

    #[test]
    fn reset_clears_definitions() {
        let mut session = Session::new();
        session.add_definition("x", false, "1");
        session.reset();
        assert!(session.definition_names().is_empty());
        assert_eq!(session.wrap("1"), "1");
    }
}
