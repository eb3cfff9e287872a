//! # Hexpat Parser
//!
//! Front end of the hexpat pattern language: it turns pattern source text
//! into a validated syntax tree ready for layout evaluation.
//!
//! The phases run in order, and each one reports problems as
//! [`error::Diagnostic`]s wrapped in an [`error::ParseError`]:
//!
//! 1. **Preprocess** - [`preprocess`] handles `#include`, `#define`,
//!    conditionals and `#pragma` lines.
//! 2. **Tokenize** - [`tokenize`] produces positioned tokens.
//! 3. **Parse** - [`parse`] builds an arena-allocated [`ast::Ast`].
//! 4. **Validate** - [`validate`] checks names and types and returns the
//!    [`TypeTable`] used for lookup.
//!
//! ## Usage
//!
//! ```
//! # use hexpat_parser::{NoopResolver, error::ParseError, parse, preprocess, tokenize, validate};
//! # use bumpalo::Bump;
//! fn main() -> Result<(), ParseError> {
//!     let source = "struct Point { u32 x; u32 y; } Point origin @ 0x00;";
//!
//!     let preprocessed = preprocess(source, &NoopResolver)?;
//!     let tokens = tokenize(preprocessed.source())?;
//!     let arena = Bump::new();
//!     let ast = parse(&tokens, &arena)?;
//!     let types = validate(&ast)?;
//!
//!     assert!(types.get_struct("Point".into()).is_some());
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod preprocessor;
mod span;
mod tokens;
mod type_table;
mod validate;

pub use lexer::tokenize;
pub use parser::parse;
pub use preprocessor::{
    DEFAULT_MAX_OUTPUT_LEN, Endian, IncludeResolver, MAX_EXPANSION_DEPTH, MAX_INCLUDE_DEPTH,
    MapResolver, NoopResolver, Pragmas, Preprocessed, preprocess, preprocess_with_limit,
};
pub use span::{Span, Spanned};
pub use tokens::{PositionedToken, Token};
pub use type_table::{TypeDefinition, TypeTable};
pub use validate::validate;
