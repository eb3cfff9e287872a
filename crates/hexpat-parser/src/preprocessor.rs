//! Line-oriented preprocessor run before lexing.
//!
//! Supported directives:
//!
//! - `#define NAME [value]` / `#undef NAME`, with whole-word substitution
//!   in ordinary lines
//! - `#ifdef NAME` / `#ifndef NAME` / `#else` / `#endif`, nestable
//! - `#include "path"` / `#include <path>` through an [`IncludeResolver`]
//! - `#pragma once`, `#pragma endian little|big|native`, and free-form
//!   `#pragma key value` metadata
//!
//! Directive lines and lines in inactive conditional branches are replaced
//! by empty lines, so spans reported by later phases keep their line
//! numbers as long as the file has no includes. Directives inside
//! `/* ... */` comments are left alone.
//!
//! A macro is never substituted inside its own expansion, so
//! `#define A A B` expands `A` to `A B` once. The preprocessed text as a
//! whole must stay below a length limit (see [`preprocess_with_limit`]).

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

/// Maximum nesting of `#include` directives.
pub const MAX_INCLUDE_DEPTH: usize = 32;

/// Maximum nesting of macros inside macro values.
pub const MAX_EXPANSION_DEPTH: usize = 64;

/// Output limit used by [`preprocess`], in bytes (exclusive).
pub const DEFAULT_MAX_OUTPUT_LEN: usize = 0xFF_FFFF;

/// Why a line could not be macro-expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpansionError {
    /// The expanded line exceeds the remaining output budget.
    TooLong,
    /// Macros nest deeper than [`MAX_EXPANSION_DEPTH`].
    TooDeep,
}

/// Source of `#include`d text.
pub trait IncludeResolver {
    /// Returns the text of `path`, or `None` if it cannot be found.
    ///
    /// `is_system` is `true` for the `<path>` form.
    fn resolve(&self, path: &str, is_system: bool) -> Option<String>;
}

/// Resolver that has no files; every include fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolver;

impl IncludeResolver for NoopResolver {
    fn resolve(&self, _path: &str, _is_system: bool) -> Option<String> {
        None
    }
}

/// In-memory resolver keyed by include path.
#[derive(Debug, Default, Clone)]
pub struct MapResolver {
    files: HashMap<String, String>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file and return the resolver, for chaining.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.add(path, content);
        self
    }

    pub fn add(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl IncludeResolver for MapResolver {
    fn resolve(&self, path: &str, _is_system: bool) -> Option<String> {
        self.files.get(path).cloned()
    }
}

/// Byte order of multi-byte values in the inspected data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Byte order of the machine running the program.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

/// Settings collected from `#pragma` directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pragmas {
    endian: Option<Endian>,
    metadata: IndexMap<String, String>,
}

impl Pragmas {
    /// Declared byte order, falling back to little endian.
    pub fn endian(&self) -> Endian {
        self.endian.unwrap_or_default()
    }

    /// Byte order exactly as declared, if any.
    pub fn declared_endian(&self) -> Option<Endian> {
        self.endian
    }

    /// Pragmas other than `once` and `endian`, keyed by pragma name.
    pub fn metadata(&self) -> &IndexMap<String, String> {
        &self.metadata
    }
}

/// Output of [`preprocess`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    source: String,
    pragmas: Pragmas,
}

impl Preprocessed {
    /// The expanded source text handed to the lexer.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pragmas(&self) -> &Pragmas {
        &self.pragmas
    }

    pub fn into_parts(self) -> (String, Pragmas) {
        (self.source, self.pragmas)
    }
}

/// State of one open `#ifdef`/`#ifndef`.
#[derive(Debug)]
struct Conditional {
    active: bool,
    taken: bool,
    else_seen: bool,
    span: Span,
}

/// Where the text being processed came from.
#[derive(Debug, Clone)]
struct Origin {
    /// Include path, `None` for the root source.
    path: Option<String>,
    /// Span in the root source that diagnostics are attributed to when the
    /// text is an included file.
    include_span: Option<Span>,
}

struct Preprocessor<'r> {
    resolver: &'r dyn IncludeResolver,
    defines: HashMap<String, String>,
    once: HashSet<String>,
    pragmas: Pragmas,
    diagnostics: DiagnosticCollector,
    /// Output must stay strictly below this many bytes.
    max_len: usize,
    /// Bytes produced so far, across all included files.
    emitted: usize,
    /// Set once `max_len` is reached; processing stops.
    overflowed: bool,
}

impl<'r> Preprocessor<'r> {
    fn new(resolver: &'r dyn IncludeResolver, max_len: usize) -> Self {
        Self {
            resolver,
            defines: HashMap::new(),
            once: HashSet::new(),
            pragmas: Pragmas::default(),
            diagnostics: DiagnosticCollector::new(),
            max_len,
            emitted: 0,
            overflowed: false,
        }
    }

    /// Count `len` output bytes, failing the run once the limit is reached.
    fn account(&mut self, len: usize, span: Span, origin: &Origin) {
        self.emitted = self.emitted.saturating_add(len);
        if self.emitted >= self.max_len && !self.overflowed {
            self.overflowed = true;
            let message = format!(
                "preprocessed source reaches the limit of {} bytes",
                self.max_len
            );
            self.report(origin, span, ErrorCode::E008, message);
        }
    }

    fn report(&mut self, origin: &Origin, span: Span, code: ErrorCode, message: String) {
        let diagnostic = match (&origin.path, origin.include_span) {
            (Some(path), Some(include_span)) => Diagnostic::error(format!("{message} (in `{path}`)"))
                .with_code(code)
                .with_label(include_span, format!("{} in included file", code.description())),
            _ => Diagnostic::error(message)
                .with_code(code)
                .with_label(span, code.description()),
        };
        self.diagnostics.emit(diagnostic);
    }

    fn process(&mut self, text: &str, depth: usize, origin: &Origin) -> String {
        let mut output = String::with_capacity(text.len());
        let mut conditionals: Vec<Conditional> = Vec::new();
        let mut in_block_comment = false;
        let mut line_start = 0;

        for raw_line in text.split_inclusive('\n') {
            if self.overflowed {
                break;
            }
            let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
            let line = line.strip_suffix('\r').unwrap_or(line);
            let trimmed = line.trim_start();
            let indent = line.len() - trimmed.len();
            let trimmed = trimmed.trim_end();
            let span = Span::new(line_start + indent..line_start + indent + trimmed.len());
            line_start += raw_line.len();

            let starts_in_comment = in_block_comment;
            in_block_comment = block_comment_state(line, in_block_comment);
            let active = conditionals.iter().all(|c| c.active);

            let directive = if starts_in_comment {
                None
            } else {
                trimmed.strip_prefix('#')
            };

            let Some(directive) = directive else {
                if active {
                    let budget = self.max_len.saturating_sub(self.emitted);
                    match self.expand(line, budget) {
                        Ok(expanded) => {
                            self.account(expanded.len(), span, origin);
                            output.push_str(&expanded);
                        }
                        Err(ExpansionError::TooLong) => {
                            self.account(budget, span, origin);
                            break;
                        }
                        Err(ExpansionError::TooDeep) => {
                            let message = format!(
                                "macro expansion nests deeper than {MAX_EXPANSION_DEPTH} levels"
                            );
                            self.report(origin, span, ErrorCode::E009, message);
                        }
                    }
                }
                output.push('\n');
                self.account(1, span, origin);
                continue;
            };

            let directive = strip_line_comment(directive).trim();
            let (name, rest) = directive
                .split_once(char::is_whitespace)
                .map(|(name, rest)| (name, rest.trim()))
                .unwrap_or((directive, ""));

            match name {
                "ifdef" | "ifndef" => {
                    if !is_identifier(rest) {
                        self.report(
                            origin,
                            span,
                            ErrorCode::E002,
                            format!("`#{name}` requires a macro name"),
                        );
                    }
                    let defined = self.defines.contains_key(rest);
                    let condition = if name == "ifdef" { defined } else { !defined };
                    conditionals.push(Conditional {
                        active: active && condition,
                        // An inactive parent must keep `#else` from activating.
                        taken: !active || condition,
                        else_seen: false,
                        span,
                    });
                }
                "else" => match conditionals.last_mut() {
                    Some(open) if open.else_seen => {
                        self.report(
                            origin,
                            span,
                            ErrorCode::E005,
                            "duplicate `#else` in conditional".to_string(),
                        );
                    }
                    Some(open) => {
                        open.else_seen = true;
                        open.active = !open.taken;
                        open.taken = true;
                    }
                    None => self.report(
                        origin,
                        span,
                        ErrorCode::E005,
                        "`#else` without matching `#ifdef`/`#ifndef`".to_string(),
                    ),
                },
                "endif" => {
                    if conditionals.pop().is_none() {
                        self.report(
                            origin,
                            span,
                            ErrorCode::E005,
                            "`#endif` without matching `#ifdef`/`#ifndef`".to_string(),
                        );
                    }
                }
                _ if !active => {}
                "define" => self.define(rest, span, origin),
                "undef" => {
                    if is_identifier(rest) {
                        self.defines.remove(rest);
                    } else {
                        self.report(
                            origin,
                            span,
                            ErrorCode::E002,
                            "`#undef` requires a macro name".to_string(),
                        );
                    }
                }
                "include" => {
                    if let Some(included) = self.include(rest, span, depth, origin) {
                        output.push_str(&included);
                    }
                }
                "pragma" => self.pragma(rest, span, origin),
                _ => self.report(
                    origin,
                    span,
                    ErrorCode::E001,
                    format!("unknown preprocessor directive `#{name}`"),
                ),
            }

            output.push('\n');
            self.account(1, span, origin);
        }

        if self.overflowed {
            return output;
        }
        for open in conditionals {
            let message = "conditional is never closed with `#endif`".to_string();
            self.report(origin, open.span, ErrorCode::E006, message);
        }

        // `split_inclusive` keeps the source's final newline; don't add one
        // the source did not have.
        if !text.ends_with('\n') && output.ends_with('\n') {
            output.pop();
        }
        output
    }

    fn define(&mut self, rest: &str, span: Span, origin: &Origin) {
        let (name, value) = rest
            .split_once(char::is_whitespace)
            .map(|(name, value)| (name, value.trim()))
            .unwrap_or((rest, ""));

        if !is_identifier(name) {
            self.report(
                origin,
                span,
                ErrorCode::E002,
                "`#define` requires a macro name".to_string(),
            );
            return;
        }

        trace!(name = name, value = value; "Defining macro");
        self.defines.insert(name.to_string(), value.to_string());
    }

    fn include(&mut self, rest: &str, span: Span, depth: usize, origin: &Origin) -> Option<String> {
        let (path, is_system) = if let Some(path) = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
        {
            (path, false)
        } else if let Some(path) = rest.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
            (path, true)
        } else {
            self.report(
                origin,
                span,
                ErrorCode::E002,
                format!("invalid `#include` syntax `{rest}`"),
            );
            return None;
        };

        if path.is_empty() {
            self.report(
                origin,
                span,
                ErrorCode::E002,
                "`#include` requires a path".to_string(),
            );
            return None;
        }

        if self.once.contains(path) {
            debug!(path = path; "Skipping include guarded by `#pragma once`");
            return None;
        }

        if depth + 1 > MAX_INCLUDE_DEPTH {
            self.report(
                origin,
                span,
                ErrorCode::E004,
                format!("include depth exceeds {MAX_INCLUDE_DEPTH} at `{path}`"),
            );
            return None;
        }

        let Some(content) = self.resolver.resolve(path, is_system) else {
            self.report(
                origin,
                span,
                ErrorCode::E003,
                format!("cannot resolve include `{path}`"),
            );
            return None;
        };

        debug!(path = path, depth = depth + 1; "Including file");
        let nested = Origin {
            path: Some(path.to_string()),
            include_span: origin.include_span.or(Some(span)),
        };
        Some(self.process(&content, depth + 1, &nested))
    }

    fn pragma(&mut self, rest: &str, span: Span, origin: &Origin) {
        let (key, value) = rest
            .split_once(char::is_whitespace)
            .map(|(key, value)| (key, value.trim()))
            .unwrap_or((rest, ""));

        match key {
            "" => self.report(
                origin,
                span,
                ErrorCode::E002,
                "`#pragma` requires a name".to_string(),
            ),
            "once" => {
                if let Some(path) = &origin.path {
                    self.once.insert(path.clone());
                }
            }
            "endian" => {
                let endian = match value {
                    "little" => Endian::Little,
                    "big" => Endian::Big,
                    "native" => Endian::native(),
                    other => {
                        self.report(
                            origin,
                            span,
                            ErrorCode::E007,
                            format!("invalid endianness `{other}`, expected `little`, `big` or `native`"),
                        );
                        return;
                    }
                };
                self.pragmas.endian = Some(endian);
            }
            _ => {
                self.pragmas
                    .metadata
                    .insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Substitute defined macros in `line`, whole words only. Macro values
    /// are expanded in turn, except for macros already being expanded.
    /// Text after `//` is left untouched.
    ///
    /// Fails once the result would be longer than `budget` bytes.
    fn expand(&self, line: &str, budget: usize) -> Result<String, ExpansionError> {
        if line.len() > budget {
            return Err(ExpansionError::TooLong);
        }
        if self.defines.is_empty() {
            return Ok(line.to_string());
        }

        let (code, comment) = split_line_comment(line);
        let mut out = String::with_capacity(line.len());
        let mut active = Vec::new();
        self.expand_into(code, &mut active, &mut out, budget)?;

        if out.len() + comment.len() > budget {
            return Err(ExpansionError::TooLong);
        }
        out.push_str(comment);
        Ok(out)
    }

    fn expand_into<'s>(
        &'s self,
        text: &str,
        active: &mut Vec<&'s str>,
        out: &mut String,
        budget: usize,
    ) -> Result<(), ExpansionError> {
        let mut rest = text;

        while let Some(start) = rest.find(is_word_char) {
            out.push_str(&rest[..start]);
            let word_len = rest[start..]
                .find(|c: char| !is_word_char(c))
                .unwrap_or(rest.len() - start);
            let word = &rest[start..start + word_len];
            rest = &rest[start + word_len..];

            let macro_def = self
                .defines
                .get_key_value(word)
                .filter(|_| !word.starts_with(|c: char| c.is_ascii_digit()))
                .filter(|&(name, _)| !active.iter().any(|open| *open == name.as_str()));
            match macro_def {
                Some((name, value)) => {
                    if active.len() >= MAX_EXPANSION_DEPTH {
                        return Err(ExpansionError::TooDeep);
                    }
                    active.push(name.as_str());
                    self.expand_into(value, active, out, budget)?;
                    active.pop();
                }
                None => out.push_str(word),
            }

            if out.len() > budget {
                return Err(ExpansionError::TooLong);
            }
        }
        out.push_str(rest);

        if out.len() > budget {
            return Err(ExpansionError::TooLong);
        }
        Ok(())
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_identifier(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') && s.chars().all(is_word_char)
}

fn split_line_comment(line: &str) -> (&str, &str) {
    match line.find("//") {
        Some(pos) => line.split_at(pos),
        None => (line, ""),
    }
}

fn strip_line_comment(line: &str) -> &str {
    split_line_comment(line).0
}

/// Returns whether a block comment is still open at the end of `line`.
fn block_comment_state(line: &str, mut in_block: bool) -> bool {
    let mut rest = line;
    loop {
        if in_block {
            match rest.find("*/") {
                Some(end) => {
                    in_block = false;
                    rest = &rest[end + 2..];
                }
                None => return true,
            }
        } else {
            let comment = rest.find("//");
            let block = rest.find("/*");
            match (block, comment) {
                (Some(b), Some(c)) if c < b => return false,
                (Some(b), _) => {
                    in_block = true;
                    rest = &rest[b + 2..];
                }
                (None, _) => return false,
            }
        }
    }
}

/// Run the preprocessor over `source` with the default output limit.
///
/// # Errors
///
/// Returns every directive problem found (`E0xx`) as one [`ParseError`].
pub fn preprocess(source: &str, resolver: &dyn IncludeResolver) -> Result<Preprocessed, ParseError> {
    preprocess_with_limit(source, resolver, DEFAULT_MAX_OUTPUT_LEN)
}

/// Run the preprocessor over `source`, failing with `E008` once the
/// preprocessed text reaches `max_len` bytes.
///
/// # Errors
///
/// Returns every directive problem found (`E0xx`) as one [`ParseError`].
pub fn preprocess_with_limit(
    source: &str,
    resolver: &dyn IncludeResolver,
    max_len: usize,
) -> Result<Preprocessed, ParseError> {
    let mut preprocessor = Preprocessor::new(resolver, max_len);
    let root = Origin {
        path: None,
        include_span: None,
    };
    let output = preprocessor.process(source, 0, &root);

    let Preprocessor {
        pragmas,
        diagnostics,
        defines,
        ..
    } = preprocessor;
    diagnostics.finish()?;

    debug!(
        input_len = source.len(),
        output_len = output.len(),
        macros = defines.len();
        "Preprocessing complete"
    );

    Ok(Preprocessed {
        source: output,
        pragmas,
    })
}
