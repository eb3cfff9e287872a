//! The [`ParseError`] type wrapping one or more front-end diagnostics.

use thiserror::Error;

use crate::error::{Diagnostic, ErrorCode};

/// Error type for the front-end phases.
///
/// Wraps one or more diagnostics. Warnings may be present alongside at
/// least one error.
#[derive(Debug, Error)]
#[error("{}", summarize(.diagnostics))]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Wrap the diagnostics a phase produced.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get every diagnostic, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Error codes of all diagnostics, in emission order.
    pub fn codes(&self) -> impl Iterator<Item = ErrorCode> + '_ {
        self.diagnostics.iter().filter_map(Diagnostic::code)
    }

    /// Returns `true` if any diagnostic carries `code`.
    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.codes().any(|c| c == code)
    }
}

/// The first diagnostic, plus a count of the rest.
fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => String::new(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_single() {
        let err: ParseError = Diagnostic::error("unterminated block comment")
            .with_code(ErrorCode::E101)
            .into();
        assert_eq!(err.to_string(), "error[E101]: unterminated block comment");
    }

    #[test]
    fn test_display_counts_the_rest() {
        let err: ParseError = vec![
            Diagnostic::error("first"),
            Diagnostic::error("second"),
            Diagnostic::warning("third"),
        ]
        .into();
        assert_eq!(err.to_string(), "error: first (+2 more)");
    }

    #[test]
    fn test_codes() {
        let err = ParseError::new(vec![
            Diagnostic::error("a").with_code(ErrorCode::E300),
            Diagnostic::error("b"),
            Diagnostic::error("c").with_code(ErrorCode::E301),
        ]);
        assert_eq!(
            err.codes().collect::<Vec<_>>(),
            vec![ErrorCode::E300, ErrorCode::E301]
        );
        assert!(err.has_code(ErrorCode::E301));
        assert!(!err.has_code(ErrorCode::E302));
    }
}
