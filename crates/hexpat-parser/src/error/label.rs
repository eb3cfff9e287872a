//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A message attached to a span of source text.
///
/// A diagnostic usually has one primary label marking the offending code,
/// plus secondary labels for related locations such as an earlier
/// definition of the same name.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a primary label, marking the code a diagnostic is about.
    ///
    /// # Example
    ///
    /// ```
    /// # use hexpat_parser::error::Label;
    /// # use hexpat_parser::Span;
    ///
    /// let label = Label::primary(Span::new(10..14), "undefined type");
    /// assert!(label.is_primary());
    /// assert_eq!(label.message(), "undefined type");
    /// ```
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a secondary label pointing at related code.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    /// Get the labeled span.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the label text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for a primary label.
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Returns `true` for a secondary label.
    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}
