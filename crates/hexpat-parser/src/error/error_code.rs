//! Error codes for the hexpat diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Preprocessor errors
//! - `E1xx` - Lexer errors
//! - `E2xx` - Parser errors
//! - `E3xx` - Validation errors

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Preprocessor Errors (E0xx)
    // =========================================================================
    /// Unknown preprocessor directive.
    E001,

    /// Malformed directive.
    ///
    /// A known directive is missing its argument or has trailing garbage.
    E002,

    /// Unresolved include.
    ///
    /// The include resolver has no file for the requested path.
    E003,

    /// Include depth exceeded.
    ///
    /// Includes nest too deeply, usually because two files include each other.
    E004,

    /// Unbalanced conditional.
    ///
    /// `#else` or `#endif` without an open `#ifdef`/`#ifndef`, or a second
    /// `#else` in the same conditional.
    E005,

    /// Unterminated conditional.
    ///
    /// An `#ifdef`/`#ifndef` block reaches the end of the file without `#endif`.
    E006,

    /// Invalid pragma value.
    E007,

    /// Preprocessed source too large.
    ///
    /// Macro expansion and includes together produce more text than the
    /// source size limit allows.
    E008,

    /// Macro expansion too deep.
    ///
    /// A macro expands through more nested macros than the preprocessor
    /// follows.
    E009,

    // =========================================================================
    // Lexer Errors (E1xx)
    // =========================================================================
    /// Unexpected character.
    E100,

    /// Unterminated block comment.
    E101,

    /// Invalid integer literal.
    ///
    /// A radix prefix (`0x`, `0b`, `0o`) is not followed by valid digits, or
    /// the literal runs straight into identifier characters.
    E102,

    /// Integer literal out of range.
    ///
    /// Integer literals must fit in 128 bits.
    E103,

    // =========================================================================
    // Parser Errors (E2xx)
    // =========================================================================
    /// Unexpected token.
    E200,

    /// Incomplete input.
    E201,

    /// Invalid array length.
    ///
    /// Array lengths must be at least one.
    E202,

    /// Value out of range.
    ///
    /// Offsets, array lengths and enum values must fit in 64 bits.
    E203,

    /// Placement on a struct member.
    ///
    /// Only top-level declarations may carry `@ offset`.
    E204,

    // =========================================================================
    // Validation Errors (E3xx)
    // =========================================================================
    /// Undefined type reference.
    E300,

    /// Duplicate type definition.
    E301,

    /// Invalid enum underlying type.
    ///
    /// Enums must be backed by an unsigned built-in type of at most 8 bytes.
    E302,

    /// Duplicate enum variant.
    E303,

    /// Enum value out of range for its underlying type.
    E304,

    /// Duplicate struct member.
    E305,

    /// Duplicate top-level variable.
    E306,

    /// Unplaced variable.
    ///
    /// A top-level variable without `@ offset` produces no regions.
    E307,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            ErrorCode::E008 => "E008",
            ErrorCode::E009 => "E009",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
            ErrorCode::E306 => "E306",
            ErrorCode::E307 => "E307",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unknown directive",
            ErrorCode::E002 => "malformed directive",
            ErrorCode::E003 => "unresolved include",
            ErrorCode::E004 => "include depth exceeded",
            ErrorCode::E005 => "unbalanced conditional",
            ErrorCode::E006 => "unterminated conditional",
            ErrorCode::E007 => "invalid pragma value",
            ErrorCode::E008 => "preprocessed source too large",
            ErrorCode::E009 => "macro expansion too deep",
            ErrorCode::E100 => "unexpected character",
            ErrorCode::E101 => "unterminated block comment",
            ErrorCode::E102 => "invalid integer literal",
            ErrorCode::E103 => "integer literal out of range",
            ErrorCode::E200 => "unexpected token",
            ErrorCode::E201 => "incomplete input",
            ErrorCode::E202 => "invalid array length",
            ErrorCode::E203 => "value out of range",
            ErrorCode::E204 => "placement on struct member",
            ErrorCode::E300 => "undefined type",
            ErrorCode::E301 => "duplicate type definition",
            ErrorCode::E302 => "invalid enum underlying type",
            ErrorCode::E303 => "duplicate enum variant",
            ErrorCode::E304 => "enum value out of range",
            ErrorCode::E305 => "duplicate struct member",
            ErrorCode::E306 => "duplicate variable",
            ErrorCode::E307 => "unplaced variable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
