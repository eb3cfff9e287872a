//! Collector for accumulating diagnostics during a phase.
//!
//! Validation keeps walking after the first problem so one run reports
//! every undefined type and duplicate name at once.

use log::warn;

use crate::error::{Diagnostic, ParseError};

/// Accumulates diagnostics so a phase can report every problem it finds
/// instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Any error-severity diagnostic makes
    /// [`finish`](Self::finish) fail.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` once an error has been emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection.
    ///
    /// Returns `Err` with every diagnostic if any error was emitted.
    /// Otherwise warnings are logged and dropped.
    pub fn finish(self) -> Result<(), ParseError> {
        if self.has_errors {
            return Err(ParseError::new(self.diagnostics));
        }

        for diagnostic in &self.diagnostics {
            let span = diagnostic.primary_span().unwrap_or_default();
            warn!(
                code:? = diagnostic.code(),
                start = span.start(),
                end = span.end();
                "{}", diagnostic.message()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, span::Span};

    #[test]
    fn test_empty_collector_is_ok() {
        assert!(DiagnosticCollector::new().finish().is_ok());
    }

    #[test]
    fn test_warnings_only_is_ok() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("variable `x` has no placement"));

        assert!(!collector.has_errors());
        assert!(collector.finish().is_ok());
    }

    #[test]
    fn test_errors_keep_all_diagnostics() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(
            Diagnostic::error("undefined type `A`")
                .with_code(ErrorCode::E300)
                .with_label(Span::new(0..1), "not declared"),
        );
        collector.emit(Diagnostic::warning("variable `x` has no placement"));
        collector.emit(Diagnostic::error("undefined type `B`").with_code(ErrorCode::E300));

        assert!(collector.has_errors());
        let err = collector.finish().unwrap_err();
        assert_eq!(err.diagnostics().len(), 3);
        assert_eq!(err.diagnostics()[0].message(), "undefined type `A`");
    }
}
