//! Severity levels for diagnostics.

use std::fmt;

/// The severity level of a diagnostic.
///
/// Displays as the lowercase word used in rendered diagnostics.
///
/// ```
/// # use hexpat_parser::error::Severity;
/// assert_eq!(Severity::Error.to_string(), "error");
/// assert!(Severity::Warning.is_warning());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A fatal problem; the phase that produced it fails.
    Error,

    /// An advisory problem; processing continues.
    Warning,
}

impl Severity {
    /// Returns `true` if this is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    /// Returns `true` if this is a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
