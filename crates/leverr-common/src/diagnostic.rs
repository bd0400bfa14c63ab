use crate::span::{LineIndex, Span};

/// Anything that can be rendered as a source diagnostic: a message and,
/// when the failure is tied to a particular piece of source text, a span.
pub trait Diagnostic {
    fn message(&self) -> String;
    fn span(&self) -> Option<Span>;
}

/// Render a diagnostic against the original source text as the fixed
/// three-line block: a header naming the line/column, the offending
/// source line, and a caret underline beneath the offending span.
///
/// When the diagnostic carries no span (e.g. it never had source text to
/// begin with), only the plain message is rendered.
pub fn render(source: &str, diag: &impl Diagnostic) -> String {
    match diag.span() {
        Some(span) => render_spanned(source, span, &diag.message()),
        None => diag.message(),
    }
}

fn render_spanned(source: &str, span: Span, message: &str) -> String {
    let index = LineIndex::new(source);
    let (line, col) = index.line_col(span.start);
    let line_text = index.line_text(source, line);
    let underline_len = span.len().max(1) as usize;
    let mut out = String::new();
    out.push_str(&format!("Error at line {line}, col {col}:\n"));
    out.push_str(&format!("    {line_text}\n"));
    out.push_str("    ");
    out.push_str(&" ".repeat((col - 1) as usize));
    out.push_str(&"^".repeat(underline_len));
    out
}
