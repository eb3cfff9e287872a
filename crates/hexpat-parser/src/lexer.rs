//! Lexical analyzer for pattern source text.
//!
//! [`tokenize`] turns preprocessed source into [`PositionedToken`]s,
//! keeping trivia (whitespace, newlines, comments) so the parser can
//! compute precise error spans. Lexing recovers from errors: an offending
//! character is reported and skipped, and every lexical error is returned
//! together.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, opt, peek, preceded, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, one_of, take_until, take_while},
};

use hexpat_core::types::BuiltinType;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span runs from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse `// ...` up to (not including) the newline.
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse `/* ... */`. Comments do not nest.
fn block_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();

    preceded(
        "/*",
        cut_err(terminated(take_until(0.., "*/"), "*/")).context(LexerDiagnostic {
            code: ErrorCode::E101,
            message: "unterminated block comment",
            help: Some("close the comment with `*/`"),
            start,
        }),
    )
    .map(Token::BlockComment)
    .parse_next(input)
}

/// Parse an integer literal: decimal, `0x` hex, `0b` binary or `0o` octal.
///
/// `_` may separate digits. The literal must not run into identifier
/// characters and must fit in 128 bits.
fn integer_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start = input.current_token_start();

    peek(one_of(|c: char| c.is_ascii_digit())).parse_next(input)?;

    let radix = opt(alt((
        alt((literal("0x"), literal("0X"))).value(16u32),
        alt((literal("0b"), literal("0B"))).value(2u32),
        alt((literal("0o"), literal("0O"))).value(8u32),
    )))
    .parse_next(input)?
    .unwrap_or(10);

    let digits = cut_err(terminated(
        take_while(1.., move |c: char| c.is_digit(radix) || c == '_')
            .verify(|digits: &str| digits.chars().any(|c| c != '_')),
        peek(not(one_of(is_word_char))),
    ))
    .context(LexerDiagnostic {
        code: ErrorCode::E102,
        message: "invalid integer literal",
        help: Some("use decimal digits, or `0x`, `0b`, `0o` followed by digits of that base"),
        start,
    })
    .parse_next(input)?;

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    match u128::from_str_radix(&cleaned, radix) {
        Ok(value) => Ok(Token::IntegerLiteral(value)),
        Err(_) => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            LexerDiagnostic {
                code: ErrorCode::E103,
                message: "integer literal out of range",
                help: Some("integer literals must fit in 128 bits"),
                start,
            },
        ))),
    }
}

/// Parse a word: a keyword, a built-in type name, or an identifier.
fn word<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_word_char)
        .verify(|s: &str| s.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
        .map(|s: &'a str| match s {
            "struct" => Token::Struct,
            "enum" => Token::Enum,
            "using" => Token::Using,
            _ => BuiltinType::from_keyword(s)
                .map(Token::Builtin)
                .unwrap_or(Token::Identifier(s)),
        })
        .parse_next(input)
}

fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '='.value(Token::Equals),
        ':'.value(Token::Colon),
        '@'.value(Token::At),
        '{'.value(Token::LeftBrace),
        '}'.value(Token::RightBrace),
        '['.value(Token::LeftBracket),
        ']'.value(Token::RightBracket),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// Whitespace other than `\n`.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        block_comment,
        integer_literal,
        word,
        single_char_token,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Accumulates tokens and diagnostics while lexing.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let diagnostic = Self::convert_err_mode(e, error_pos);
                    let unterminated_comment = diagnostic.code() == Some(ErrorCode::E101);
                    self.diagnostics.emit(diagnostic);

                    if unterminated_comment {
                        // Everything after an open `/*` is comment text.
                        input.finish();
                    } else if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|()| self.tokens)
    }

    /// Turn a winnow error into a diagnostic, falling back to E100
    /// (unexpected character) when no [`LexerDiagnostic`] context exists.
    fn convert_err_mode(err: ErrMode<ContextError<LexerDiagnostic>>, error_pos: usize) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E100)
            .with_label(span, ErrorCode::E100.description())
    }
}

/// Tokenize source text, collecting every lexical error.
///
/// # Errors
///
/// Returns a [`ParseError`] holding one diagnostic per lexical error.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Identifiers that are not keywords or built-in type names.
    fn valid_identifier_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_]{0,20}".prop_filter("avoid reserved words", |s| {
            !matches!(s.as_str(), "struct" | "enum" | "using")
                && BuiltinType::from_keyword(s).is_none()
        })
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_identifier_round_trips(id: &str) -> Result<(), TestCaseError> {
        let source = format!("struct {id} {{ u8 x; }};");
        let tokens = tokenize(&source);
        prop_assert!(tokens.is_ok(), "failed to tokenize `{id}`: {:?}", tokens.err());

        let tokens = tokens.unwrap();
        let found = tokens.iter().any(|t| t.token == Token::Identifier(id));
        prop_assert!(found, "identifier `{id}` not produced");
        Ok(())
    }

    fn check_integer_formats_agree(value: u64) -> Result<(), TestCaseError> {
        for literal in [
            format!("{value}"),
            format!("0x{value:X}"),
            format!("0b{value:b}"),
            format!("0o{value:o}"),
        ] {
            let tokens = tokenize(&literal);
            prop_assert!(tokens.is_ok(), "failed to tokenize `{literal}`");
            let tokens = tokens.unwrap();
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(&tokens[0].token, &Token::IntegerLiteral(u128::from(value)));
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn identifiers_tokenize(id in valid_identifier_strategy()) {
            check_identifier_round_trips(&id)?;
        }

        #[test]
        fn integer_formats_agree(value in any::<u64>()) {
            check_integer_formats_agree(value)?;
        }
    }
}
