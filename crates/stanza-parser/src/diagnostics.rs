//! Diagnostic rendering for parse errors.
//!
//! Converts [`ParseError`] values into codespan diagnostics and emits them
//! with source context to the terminal.

use crate::error::ParseError;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use termcolor::{ColorChoice, StandardStream};

/// Build a codespan diagnostic for a parse error.
pub fn to_diagnostic(error: &ParseError) -> Diagnostic<()> {
    let (start, end) = error.span();
    // Zero-width spans render poorly; widen to one character
    let end = end.max(start + 1);
    Diagnostic::error()
        .with_message(error.to_string())
        .with_labels(vec![Label::primary((), start..end)])
}

/// Emit a parse error with source context to stderr.
pub fn emit(file_name: &str, source: &str, error: &ParseError) {
    let file = SimpleFile::new(file_name, source);
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    // Rendering is best-effort; the error itself has already been reported
    let _ = term::emit(&mut writer.lock(), &config, &file, &to_diagnostic(error));
}
