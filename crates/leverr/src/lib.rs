//! Library surface behind the `leverr` CLI: the file-runner collaborator
//! named in spec.md §6 (`runSource(text)`), grounded on `meshc::main`'s
//! parse -> typecheck -> report pipeline shape, retargeted from "compile
//! to binary" to "evaluate and render".

use leverr_common::diagnostic::render;

/// Parse, type-check, and evaluate `text` as a Leverr program, returning
/// its rendered top-level value (spec.md §6's runtime output format) or
/// a rendered diagnostic.
pub fn run_source(text: &str) -> Result<String, String> {
    let expr = leverr_parser::parse_source(text).map_err(|e| render(text, &e))?;

    let typeck = leverr_typeck::check(&expr);
    if !typeck.errors.is_empty() {
        let rendered: Vec<String> = typeck.errors.iter().map(|e| render(text, e)).collect();
        return Err(rendered.join("\n"));
    }

    let env = leverr_eval::default_env();
    let mut sink = leverr_eval::StdoutSink;
    leverr_eval::evaluate(&expr, &env, &mut sink)
        .map(|value| value.to_string())
        .map_err(|e| render(text, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_well_typed_program_to_its_rendered_value() {
        assert_eq!(run_source("1 + 2"), Ok("3".to_string()));
    }

    #[test]
    fn reports_a_parse_error() {
        assert!(run_source("let x =").is_err());
    }

    #[test]
    fn reports_a_type_error() {
        assert!(run_source("1 + \"a\"").is_err());
    }

    #[test]
    fn reports_a_runtime_error() {
        assert!(run_source("1 / 0").is_err());
    }
}
