//! Parser for pattern source tokens.
//!
//! Transforms the token stream from the [`lexer`](super::lexer) into an
//! arena-allocated [`Ast`]. The public entry point is [`parse`].
//!
//! Grammar:
//!
//! ```text
//! program      := declaration* EOF
//! declaration  := struct_decl | enum_decl | alias_decl | variable_decl
//! struct_decl  := 'struct' IDENT '{' member_decl* '}' ';'?
//! enum_decl    := 'enum' IDENT ':' type '{' [variant (',' variant)* ','?] '}' ';'?
//! variant      := IDENT ['=' INT]
//! alias_decl   := 'using' IDENT '=' type ';'
//! variable_decl:= type IDENT ['[' INT ']'] ['@' INT] ';'
//! member_decl  := type IDENT ['[' INT ']'] ';'
//! type         := BUILTIN | IDENT
//! ```

use bumpalo::Bump;
use log::{debug, trace};
use winnow::{
    Parser as _,
    combinator::{opt, preceded, repeat},
    error::{AddContext, ContextError, ErrMode},
    stream::{Stateful, Stream, TokenSlice},
    token::any,
};

use hexpat_core::identifier::Id;

use crate::{
    ast::{AliasDecl, Ast, Declaration, EnumDecl, EnumVariant, StructDecl, TypeRef, VariableDecl},
    error::{Diagnostic, ErrorCode, ParseError},
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context attached to parser errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected.
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) where the failed construct
    /// started; the error span runs from there to the failure point.
    StartOffset(usize),
    /// A well-formed construct with an invalid value.
    Invalid {
        code: ErrorCode,
        message: &'static str,
    },
}

/// Token slice threaded with the arena the tree is allocated in.
type Input<'t, 'a> = Stateful<TokenSlice<'t, PositionedToken<'t>>, &'a Bump>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Run `f`, turning a backtrack into a cut that remembers where `f` started.
fn cut_err<'t, 'a, O, F>(input: &mut Input<'t, 'a>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'t, 'a>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(e)) | Err(ErrMode::Cut(e)) => Err(ErrMode::Cut(e.add_context(
            input,
            &input.checkpoint(),
            Context::StartOffset(start_remaining),
        ))),
        Err(e) => Err(e),
    }
}

/// A cut error for a construct that parsed but carries an invalid value.
fn invalid(
    input: &Input<'_, '_>,
    start_remaining: usize,
    code: ErrorCode,
    message: &'static str,
) -> ErrMode<ContextError<Context>> {
    let checkpoint = input.checkpoint();
    ErrMode::Cut(
        ContextError::new()
            .add_context(input, &checkpoint, Context::StartOffset(start_remaining))
            .add_context(input, &checkpoint, Context::Invalid { code, message }),
    )
}

fn trivia(input: &mut Input<'_, '_>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| token.token.is_trivia())
        .void()
        .parse_next(input)
}

/// Skip whitespace, newlines and comments.
fn trivia0(input: &mut Input<'_, '_>) -> IResult<()> {
    repeat(0.., trivia).parse_next(input)
}

/// Match one significant token equal to `expected`, returning its span.
fn punct<'t>(
    input: &mut Input<'t, '_>,
    expected: Token<'static>,
    label: &'static str,
) -> IResult<Span> {
    preceded(
        trivia0,
        any.verify_map(move |token: &PositionedToken<'t>| {
            (token.token == expected).then_some(token.span)
        }),
    )
    .context(Context::Label(label))
    .parse_next(input)
}

fn semicolon(input: &mut Input<'_, '_>) -> IResult<Span> {
    punct(input, Token::Semicolon, "`;`")
}

fn identifier<'t>(input: &mut Input<'t, '_>) -> IResult<Spanned<Id>> {
    preceded(
        trivia0,
        any.verify_map(|token: &PositionedToken<'t>| match token.token {
            Token::Identifier(name) => Some(Spanned::new(Id::new(name), token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn type_ref<'t>(input: &mut Input<'t, '_>) -> IResult<Spanned<TypeRef>> {
    preceded(
        trivia0,
        any.verify_map(|token: &PositionedToken<'t>| match token.token {
            Token::Builtin(ty) => Some(Spanned::new(TypeRef::Builtin(ty), token.span)),
            Token::Identifier(name) => {
                Some(Spanned::new(TypeRef::Custom(Id::new(name)), token.span))
            }
            _ => None,
        }),
    )
    .context(Context::Label("type"))
    .parse_next(input)
}

fn integer<'t>(input: &mut Input<'t, '_>) -> IResult<Spanned<u128>> {
    preceded(
        trivia0,
        any.verify_map(|token: &PositionedToken<'t>| match token.token {
            Token::IntegerLiteral(value) => Some(Spanned::new(value, token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("integer"))
    .parse_next(input)
}

/// An integer literal that must fit in 64 bits.
fn u64_literal(input: &mut Input<'_, '_>, message: &'static str) -> IResult<Spanned<u64>> {
    let start = input.eof_offset();
    let literal = integer(input)?;

    u64::try_from(*literal.inner())
        .map(|value| Spanned::new(value, literal.span()))
        .map_err(|_| invalid(input, start, ErrorCode::E203, message))
}

/// `'[' INT ']'`, if present.
fn array_suffix(input: &mut Input<'_, '_>) -> IResult<Option<Spanned<u64>>> {
    let start = input.eof_offset();
    let Some(open) = opt(|i: &mut Input<'_, '_>| punct(i, Token::LeftBracket, "`[`"))
        .parse_next(input)?
    else {
        return Ok(None);
    };

    let len = cut_err(input, |i| {
        u64_literal(i, "array length does not fit in 64 bits")
    })?;
    if *len.inner() == 0 {
        return Err(invalid(
            input,
            start,
            ErrorCode::E202,
            "array length must be at least 1",
        ));
    }
    let close = cut_err(input, |i| punct(i, Token::RightBracket, "`]`"))?;

    Ok(Some(Spanned::new(len.into_inner(), open.union(close))))
}

/// `'@' INT`, if present.
fn placement(input: &mut Input<'_, '_>) -> IResult<Option<Spanned<u64>>> {
    let Some(_) = opt(|i: &mut Input<'_, '_>| punct(i, Token::At, "`@`")).parse_next(input)? else {
        return Ok(None);
    };

    cut_err(input, |i| u64_literal(i, "offset does not fit in 64 bits")).map(Some)
}

/// A variable declaration. Members (`is_member`) may not carry a placement.
fn variable_decl(input: &mut Input<'_, '_>, is_member: bool) -> IResult<VariableDecl> {
    let ty = type_ref(input)?;

    cut_err(input, |input| {
        let name = identifier(input)?;
        let array_len = array_suffix(input)?;

        let at_start = input.eof_offset();
        let offset = placement(input)?;
        if is_member && offset.is_some() {
            return Err(invalid(
                input,
                at_start,
                ErrorCode::E204,
                "struct members cannot be placed with `@`",
            ));
        }

        semicolon(input)?;

        Ok(VariableDecl {
            name,
            ty,
            array_len,
            offset,
        })
    })
    .map_err(|e| e.map(|e| e.add_context(input, &input.checkpoint(), Context::Label("declaration"))))
}

fn struct_decl<'a>(input: &mut Input<'_, 'a>) -> IResult<StructDecl<'a>> {
    punct(input, Token::Struct, "`struct`")?;
    let arena: &'a Bump = input.state;

    cut_err(input, |input| {
        let name = identifier(input)?;
        punct(input, Token::LeftBrace, "`{`")?;
        let members: Vec<VariableDecl> =
            repeat(0.., |i: &mut Input<'_, '_>| variable_decl(i, true)).parse_next(input)?;
        punct(input, Token::RightBrace, "`}`")?;
        opt(semicolon).parse_next(input)?;

        trace!(name:% = name.inner(), members = members.len(); "Parsed struct");
        Ok(StructDecl {
            name,
            members: arena.alloc_slice_copy(&members),
        })
    })
}

fn enum_variants(input: &mut Input<'_, '_>) -> IResult<Vec<EnumVariant>> {
    let mut variants = Vec::new();
    // `None` once the implicit successor would overflow.
    let mut next_value = Some(0u64);

    while let Some(name) = opt(identifier).parse_next(input)? {
        let value_start = input.eof_offset();
        let value = match opt(|i: &mut Input<'_, '_>| punct(i, Token::Equals, "`=`"))
            .parse_next(input)?
        {
            Some(_) => cut_err(input, |i| u64_literal(i, "enum value does not fit in 64 bits"))?,
            None => match next_value {
                Some(value) => Spanned::new(value, name.span()),
                None => {
                    return Err(invalid(
                        input,
                        value_start,
                        ErrorCode::E203,
                        "implicit enum value exceeds 64 bits",
                    ));
                }
            },
        };

        next_value = value.inner().checked_add(1);
        variants.push(EnumVariant { name, value });

        if opt(|i: &mut Input<'_, '_>| punct(i, Token::Comma, "`,`"))
            .parse_next(input)?
            .is_none()
        {
            break;
        }
    }

    Ok(variants)
}

fn enum_decl<'a>(input: &mut Input<'_, 'a>) -> IResult<EnumDecl<'a>> {
    punct(input, Token::Enum, "`enum`")?;
    let arena: &'a Bump = input.state;

    cut_err(input, |input| {
        let name = identifier(input)?;
        punct(input, Token::Colon, "`:`")?;
        let underlying = type_ref(input)?;
        punct(input, Token::LeftBrace, "`{`")?;
        let variants = enum_variants(input)?;
        punct(input, Token::RightBrace, "`}`")?;
        opt(semicolon).parse_next(input)?;

        trace!(name:% = name.inner(), variants = variants.len(); "Parsed enum");
        Ok(EnumDecl {
            name,
            underlying,
            variants: arena.alloc_slice_copy(&variants),
        })
    })
}

fn alias_decl(input: &mut Input<'_, '_>) -> IResult<AliasDecl> {
    punct(input, Token::Using, "`using`")?;

    cut_err(input, |input| {
        let name = identifier(input)?;
        punct(input, Token::Equals, "`=`")?;
        let target = type_ref(input)?;
        semicolon(input)?;
        Ok(AliasDecl { name, target })
    })
}

fn declaration<'a>(input: &mut Input<'_, 'a>) -> IResult<Declaration<'a>> {
    let checkpoint = input.checkpoint();

    // Each alternative backtracks only before its leading token.
    for attempt in 0..4 {
        let result = match attempt {
            0 => struct_decl(input).map(Declaration::Struct),
            1 => enum_decl(input).map(Declaration::Enum),
            2 => alias_decl(input).map(Declaration::Alias),
            _ => variable_decl(input, false).map(Declaration::Variable),
        };
        match result {
            Err(ErrMode::Backtrack(_)) => input.reset(&checkpoint),
            other => return other,
        }
    }

    Err(ErrMode::Backtrack(ContextError::new().add_context(
        input,
        &checkpoint,
        Context::Label("declaration"),
    )))
}

fn program<'a>(input: &mut Input<'_, 'a>) -> IResult<Vec<Declaration<'a>>> {
    let declarations: Vec<Declaration<'a>> = repeat(0.., declaration).parse_next(input)?;
    trivia0(input)?;

    if input.eof_offset() > 0 {
        return Err(ErrMode::Backtrack(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            Context::Label("declaration"),
        )));
    }

    Ok(declarations)
}

/// Span of the first significant token in `tokens`, if any.
fn first_significant(tokens: &[PositionedToken<'_>]) -> Option<Span> {
    tokens
        .iter()
        .find(|t| !t.token.is_trivia())
        .map(|t| t.span)
}

fn last_significant(tokens: &[PositionedToken<'_>]) -> Option<Span> {
    tokens
        .iter()
        .rev()
        .find(|t| !t.token.is_trivia())
        .map(|t| t.span)
}

fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let end_offset = tokens.len() - current_remaining;

    let e = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => {
            let span = tokens
                .get(end_offset)
                .map(|t| t.span)
                .or_else(|| last_significant(tokens))
                .unwrap_or_default();
            return Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E201)
                .with_label(span, "incomplete")
                .with_help("ensure the declaration is complete");
        }
    };

    let start_offset = e
        .context()
        .find_map(|ctx| match ctx {
            Context::StartOffset(n) => Some(tokens.len() - n),
            _ => None,
        })
        .unwrap_or(end_offset);

    let invalid = e.context().find_map(|ctx| match ctx {
        Context::Invalid { code, message } => Some((*code, *message)),
        _ => None,
    });

    if let Some((code, message)) = invalid {
        let span = first_significant(&tokens[start_offset.min(end_offset)..end_offset])
            .zip(last_significant(&tokens[start_offset.min(end_offset)..end_offset]))
            .map(|(first, last)| first.union(last))
            .unwrap_or_default();
        return Diagnostic::error(message)
            .with_code(code)
            .with_label(span, code.description());
    }

    // Point at the token the parser stopped on; at the end of input, point
    // at the last significant token.
    let stopped_at = first_significant(&tokens[end_offset..]);
    let span = stopped_at
        .or_else(|| last_significant(tokens))
        .unwrap_or_default();
    let found = tokens[end_offset..]
        .iter()
        .find(|t| !t.token.is_trivia())
        .map(|t| format!("`{}`", t.token))
        .unwrap_or_else(|| "end of input".to_string());

    let expected: Vec<&str> = e
        .context()
        .filter_map(|ctx| match ctx {
            Context::Label(label) => Some(*label),
            _ => None,
        })
        .collect();

    let message = match expected.first() {
        Some(first) => format!("expected {first}, found {found}"),
        None => format!("unexpected {found}"),
    };

    let mut diag = Diagnostic::error(message)
        .with_code(ErrorCode::E200)
        .with_label(span, "unexpected token");

    if start_offset < end_offset {
        if let Some(start) = first_significant(&tokens[start_offset..end_offset]) {
            diag = diag.with_secondary_label(start, "while parsing this");
        }
    }
    if expected.len() > 1 {
        diag = diag.with_help(format!("in {}", expected[1..].join(" → ")));
    }
    diag
}

/// Parse tokens into an [`Ast`] allocated in `arena`.
///
/// # Errors
///
/// Returns a [`ParseError`] with a single `E2xx` diagnostic describing the
/// first syntax error.
pub fn parse<'a>(tokens: &[PositionedToken<'_>], arena: &'a Bump) -> Result<Ast<'a>, ParseError> {
    let mut input = Stateful {
        input: TokenSlice::new(tokens),
        state: arena,
    };

    match program(&mut input) {
        Ok(declarations) => {
            debug!(declarations = declarations.len(); "Parsed pattern source");
            Ok(Ast::new(arena.alloc_slice_copy(&declarations)))
        }
        Err(e) => {
            let current_remaining = input.eof_offset();
            Err(convert_error(e, tokens, current_remaining).into())
        }
    }
}
