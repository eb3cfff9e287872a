//! The core diagnostic type.
//!
//! A [`Diagnostic`] is one problem found in pattern source: severity, an
//! optional code, a message, any number of labeled spans and optional help.

use std::fmt;

use crate::{
    error::{ErrorCode, Label, Severity},
    span::Span,
};

/// A single error or warning with source locations.
///
/// Rendered by the CLI as:
///
/// ```text
/// error[E300]: undefined type `Heder`
///    ╭─[header.hexpat:4:1]
///  4 │ Heder hdr @ 0x00;
///    · ──┬──
///    ·   ╰── not declared
///    ╰────
///   help: declare it with `struct`, `enum` or `using`
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use hexpat_parser::error::{Diagnostic, ErrorCode};
    /// # use hexpat_parser::Span;
    ///
    /// let diag = Diagnostic::error("undefined type `Heder`")
    ///     .with_code(ErrorCode::E300)
    ///     .with_label(Span::new(0..5), "not declared")
    ///     .with_help("declare it with `struct`, `enum` or `using`");
    /// assert!(diag.severity().is_error());
    /// assert_eq!(diag.primary_span(), Some(Span::new(0..5)));
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use hexpat_parser::error::Diagnostic;
    /// # use hexpat_parser::Span;
    ///
    /// let diag = Diagnostic::warning("variable `x` has no placement")
    ///     .with_label(Span::new(4..5), "never placed")
    ///     .with_help("add `@ offset` to lay it out");
    /// assert_eq!(diag.to_string(), "warning: variable `x` has no placement");
    /// ```
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels, in the order they were added.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text, replacing any earlier help.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a diagnostic with no code, labels or help.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
