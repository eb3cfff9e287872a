//! Token definitions produced by the lexer.

use std::fmt;

use hexpat_core::types::BuiltinType;

use crate::span::Span;

/// A lexical token of the pattern language.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    // Keywords
    Struct,
    Enum,
    Using,

    /// A built-in type keyword such as `u32` or `char`.
    Builtin(BuiltinType),
    Identifier(&'src str),
    IntegerLiteral(u128),

    // Punctuation
    Equals,
    Colon,
    At,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,

    // Trivia
    LineComment(&'src str),
    BlockComment(&'src str),
    Whitespace,
    Newline,
}

impl Token<'_> {
    /// Returns `true` for tokens the parser skips between significant tokens.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            Token::Whitespace | Token::Newline | Token::LineComment(_) | Token::BlockComment(_)
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Struct => write!(f, "struct"),
            Token::Enum => write!(f, "enum"),
            Token::Using => write!(f, "using"),
            Token::Builtin(ty) => write!(f, "{ty}"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::IntegerLiteral(value) => write!(f, "{value}"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::At => write!(f, "@"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::LineComment(_) => write!(f, "line comment"),
            Token::BlockComment(_) => write!(f, "block comment"),
            Token::Whitespace => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
        }
    }
}

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }
}
