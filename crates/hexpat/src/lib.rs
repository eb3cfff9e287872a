//! Hexpat - a pattern language for annotating regions of binary data.
//!
//! A pattern declares structs, enums, type aliases and placed variables in a
//! C-like syntax. Evaluating it yields a flat list of
//! [`AnnotatedRegion`](region::AnnotatedRegion)s: byte ranges of the
//! inspected data with a name and an interpretation.

pub mod config;
pub mod layout;
pub mod value;

mod error;
mod include;
mod session;

pub use hexpat_core::{identifier, region, types};
pub use hexpat_parser::{Endian, IncludeResolver, MapResolver, NoopResolver, Pragmas};

pub use error::{HexpatError, LayoutError, Stage};
pub use include::FileSystemResolver;
pub use session::{RunOutcome, Session};

use std::sync::Arc;

use bumpalo::Bump;
use log::{debug, info, trace};

use config::AppConfig;
use layout::Evaluator;
use region::AnnotatedRegion;

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct Evaluation {
    regions: Arc<[AnnotatedRegion]>,
    pragmas: Pragmas,
}

impl Evaluation {
    /// Regions of every placed variable, in declaration order.
    pub fn regions(&self) -> &Arc<[AnnotatedRegion]> {
        &self.regions
    }

    /// Settings declared with `#pragma`.
    pub fn pragmas(&self) -> &Pragmas {
        &self.pragmas
    }

    /// Byte order the pattern declares for the data, little endian unless
    /// stated otherwise.
    pub fn endian(&self) -> Endian {
        self.pragmas.endian()
    }
}

/// Runs pattern source through every stage, from preprocessing to layout.
///
/// A run is all-or-nothing: it returns every region or the first stage's
/// error, never a partial region list.
///
/// # Examples
///
/// ```
/// use hexpat::{Pipeline, config::AppConfig};
///
/// let pipeline = Pipeline::new(AppConfig::default());
/// let evaluation = pipeline
///     .run("struct S { u8 a; u16 b[2]; } S s @ 0x10;")
///     .expect("Failed to evaluate");
///
/// let names: Vec<&str> = evaluation.regions().iter().map(|r| r.name()).collect();
/// assert_eq!(names, ["s.a", "s.b[0]", "s.b[1]"]);
/// ```
pub struct Pipeline {
    config: AppConfig,
    resolver: Box<dyn IncludeResolver + Send + Sync>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Pipeline {
    /// Create a pipeline that resolves includes in the configured include
    /// directories.
    pub fn new(config: AppConfig) -> Self {
        let resolver = FileSystemResolver::new(config.source().include_dirs().iter().cloned());
        Self {
            config,
            resolver: Box::new(resolver),
        }
    }

    /// Replace the include resolver.
    pub fn with_resolver(mut self, resolver: impl IncludeResolver + Send + Sync + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Evaluate `source`.
    ///
    /// # Errors
    ///
    /// Returns [`HexpatError::SourceTooLarge`] for oversized input, a
    /// [`HexpatError::Parse`] tagged with the failing front-end [`Stage`],
    /// or a [`HexpatError::Layout`].
    pub fn run(&self, source: &str) -> Result<Evaluation, HexpatError> {
        self.run_with_cancel(source, &|| false)
    }

    /// Evaluate `source`, polling `is_cancelled` during layout.
    ///
    /// # Errors
    ///
    /// As [`Pipeline::run`], plus [`LayoutError::Cancelled`] once
    /// `is_cancelled` returns `true`.
    pub fn run_with_cancel(
        &self,
        source: &str,
        is_cancelled: &dyn Fn() -> bool,
    ) -> Result<Evaluation, HexpatError> {
        let limit = self.config.source().max_source_len();
        if source.len() >= limit {
            return Err(HexpatError::SourceTooLarge {
                len: source.len(),
                limit,
            });
        }
        info!(len = source.len(); "Evaluating pattern");

        let preprocessed =
            hexpat_parser::preprocess_with_limit(source, self.resolver.as_ref(), limit)
            .map_err(|err| HexpatError::new_parse_error(Stage::Preprocess, err, source))?;
        let (text, pragmas) = preprocessed.into_parts();
        debug!(len = text.len(); "Source preprocessed");

        let tokens = hexpat_parser::tokenize(&text)
            .map_err(|err| HexpatError::new_parse_error(Stage::Lex, err, text.as_str()))?;
        debug!(tokens = tokens.len(); "Source tokenized");

        let arena = Bump::new();
        let ast = hexpat_parser::parse(&tokens, &arena)
            .map_err(|err| HexpatError::new_parse_error(Stage::Parse, err, text.as_str()))?;
        let types = hexpat_parser::validate(&ast)
            .map_err(|err| HexpatError::new_parse_error(Stage::Validate, err, text.as_str()))?;
        trace!(declarations = ast.declarations().len(); "Pattern validated");

        let regions = Evaluator::new(&types, self.config.evaluator())
            .with_cancellation(is_cancelled)
            .evaluate(&ast)?;

        info!(regions = regions.len(); "Pattern evaluated");
        Ok(Evaluation {
            regions: regions.into(),
            pragmas,
        })
    }
}
