//! Interactive REPL for the Leverr language.
//!
//! Leverr has no separate codegen stage (the evaluator walks the AST
//! directly), so this crate drops `mesh-repl`'s JIT-compilation step and
//! keeps only what spec.md §6 actually asks the shell collaborator for:
//! an `eval(line)` that returns rendered output or a diagnostic.
//!
//! - [`session`]: accumulated `let` definitions visible to later lines
//! - [`eval`]: the `eval(line)` collaborator itself
//!
//! ## Usage
//!
//! ```no_run
//! use leverr_repl::{run_repl, ReplConfig};
//!
//! run_repl(&ReplConfig::default()).unwrap();
//! ```

pub mod eval;
pub mod session;

pub use eval::{eval_line, Outcome};
pub use session::Session;

use leverr_eval::StdoutSink;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Configuration for the REPL.
pub struct ReplConfig {
    /// The prompt string (default: "leverr> ").
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "leverr> ".to_string(),
        }
    }
}

/// Run the interactive REPL loop: read a line, evaluate it against an
/// accumulating [`Session`], print the outcome, repeat until `:quit`,
/// `:exit`, Ctrl-D, or Ctrl-C.
pub fn run_repl(config: &ReplConfig) -> Result<(), String> {
    let mut editor = DefaultEditor::new().map_err(|e| e.to_string())?;
    let mut session = Session::new();
    let mut sink = StdoutSink;

    loop {
        match editor.readline(&config.prompt) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                match eval_line(&mut session, &line, &mut sink) {
                    Outcome::Value(rendered) => println!("{rendered}"),
                    Outcome::Defined { name, ty } => println!("{name} :: {ty}"),
                    Outcome::TypeInfo(ty) => println!("{ty}"),
                    Outcome::EnvListing(names) => {
                        if names.is_empty() {
                            println!("(no definitions)");
                        } else {
                            for name in names {
                                println!("{name}");
                            }
                        }
                    }
                    Outcome::Diagnostic(message) => eprintln!("{message}"),
                    Outcome::Empty => {}
                    Outcome::Quit => break,
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.to_string()),
        }
    }

    Ok(())
}
