//! Rendering type errors as source-anchored diagnostic text.
//!
//! Thin wrapper over `leverr_common::diagnostic::render`: `TypeError`
//! already implements the shared `Diagnostic` trait, so rendering a batch
//! of them is just mapping `render` over the list.

use leverr_common::diagnostic::render;

use crate::error::TypeError;

/// Render every error in `errors` against `source` as a three-line
/// diagnostic block (header, source line, caret underline).
pub fn render_errors(source: &str, errors: &[TypeError]) -> Vec<String> {
    errors.iter().map(|err| render(source, err)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConstraintOrigin;
    use crate::ty::Ty;
    use leverr_common::span::Span;

    #[test]
    fn renders_one_line_per_error() {
        let errors = vec![
            TypeError::UnboundVariable {
                name: "foo".to_string(),
                span: Span::new(0, 3),
            },
            TypeError::Mismatch {
                expected: Ty::int(),
                found: Ty::string(),
                origin: ConstraintOrigin::Builtin,
            },
        ];
        let rendered = render_errors("foo + 1", &errors);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].contains("foo"));
        assert!(rendered[1].contains("Int"));
    }
}
