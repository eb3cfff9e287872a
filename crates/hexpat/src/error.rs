//! Error types for hexpat operations.
//!
//! [`HexpatError`] is the error of a whole pipeline run; [`LayoutError`]
//! covers failures of the layout evaluator alone.

use std::{fmt, io};

use thiserror::Error;

use hexpat_parser::error::ParseError;

/// Front-end phase that produced a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Lex,
    Parse,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Preprocess => "preprocessing",
            Stage::Lex => "lexing",
            Stage::Parse => "parsing",
            Stage::Validate => "validation",
        };
        f.write_str(name)
    }
}

/// Failure of the layout evaluator.
///
/// Any of these aborts the run; no regions of that run are published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("undefined type `{name}`")]
    UndefinedType { name: String },

    #[error("enum `{name}` is backed by `{underlying}`, which is not an unsigned integer")]
    InvalidEnumUnderlyingType { name: String, underlying: String },

    #[error("enum `{name}` is backed by a {width}-byte integer; at most 8 bytes are supported")]
    EnumWidthExceeded { name: String, width: u8 },

    #[error("alias `{name}` refers back to itself")]
    AliasCycle { name: String },

    #[error("struct `{name}` contains itself")]
    RecursiveStruct { name: String },

    #[error("struct nesting deeper than {limit} levels")]
    DepthLimit { limit: usize },

    #[error("pattern produces more than {limit} regions")]
    RegionLimit { limit: usize },

    #[error("`{name}` extends past the largest representable offset")]
    OffsetOverflow { name: String },

    #[error("evaluation cancelled")]
    Cancelled,
}

/// The main error type for hexpat operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries structured diagnostics whose spans point
/// into `src`: the original text for preprocessing errors, the
/// preprocessed text for later stages.
#[derive(Debug, Error)]
pub enum HexpatError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("source is {len} bytes, the limit is {limit} bytes")]
    SourceTooLarge { len: usize, limit: usize },

    #[error("{err}")]
    Parse {
        stage: Stage,
        err: ParseError,
        src: String,
    },

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

impl HexpatError {
    /// Create a new `Parse` error with the text its spans refer to.
    pub fn new_parse_error(stage: Stage, err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            stage,
            err,
            src: src.into(),
        }
    }

    /// Returns `true` if the run was cancelled rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HexpatError::Layout(LayoutError::Cancelled))
    }
}
