//! Error and diagnostic system for the hexpat front end.
//!
//! Every front-end phase (preprocessing, lexing, parsing, validation)
//! reports problems as [`Diagnostic`]s: a severity, an optional
//! [`ErrorCode`], a message, labeled source spans and optional help.
//! Phases that can keep going after an error accumulate diagnostics in a
//! collector and hand them back together as one [`ParseError`].
//!
//! # Example
//!
//! ```
//! # use hexpat_parser::error::{Diagnostic, ErrorCode};
//! # use hexpat_parser::Span;
//!
//! let diag = Diagnostic::error("type `Header` is defined multiple times")
//!     .with_code(ErrorCode::E301)
//!     .with_label(Span::new(40..46), "duplicate definition")
//!     .with_secondary_label(Span::new(7..13), "first defined here")
//!     .with_help("rename one of the definitions");
//! assert_eq!(diag.to_string(), "error[E301]: type `Header` is defined multiple times");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
