//! Leverr evaluator: a tree-walking interpreter over the parser's AST.
//!
//! - `value`: runtime values (`Value`, `Closure`, `Builtin`) and rendering
//! - `env`: persistent value environment with the `let rec` backpatch
//! - `error`: runtime errors and the `Unwind` control-transfer signal
//! - `builtins`: the ten built-in functions
//! - `sink`: the `print` output sink, injected so tests can capture it
//! - `eval`: the tree walk itself

pub mod builtins;
pub mod env;
pub mod error;
pub mod eval;
pub mod sink;
pub mod value;

pub use env::Env;
pub use error::{RuntimeError, Unwind};
pub use eval::{apply, default_env, eval_expr, evaluate};
pub use sink::{CapturingSink, Sink, StdoutSink};
pub use value::Value;
