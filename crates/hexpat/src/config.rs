//! Configuration types for pattern evaluation.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! a configuration file only needs to mention the settings it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining source and evaluator settings.
//! - [`SourceConfig`] - Limits on accepted source text and include search paths.
//! - [`EvaluatorConfig`] - Region naming and resource limits of the layout evaluator.
//!
//! # Example
//!
//! ```
//! # use hexpat::config::{AppConfig, ArrayNaming};
//! let config = AppConfig::default();
//! assert_eq!(config.evaluator().array_naming(), ArrayNaming::Legacy);
//! assert_eq!(config.source().max_source_len(), 0xFF_FFFF);
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Sources of this many bytes or more are rejected without parsing.
pub const DEFAULT_MAX_SOURCE_LEN: usize = 0xFF_FFFF;

/// Default limit on struct nesting during evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default limit on the number of regions one evaluation may produce.
pub const DEFAULT_MAX_REGIONS: usize = 1 << 18;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Source handling section.
    #[serde(default)]
    source: SourceConfig,

    /// Evaluator section.
    #[serde(default)]
    evaluator: EvaluatorConfig,
}

impl AppConfig {
    pub fn new(source: SourceConfig, evaluator: EvaluatorConfig) -> Self {
        Self { source, evaluator }
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn evaluator(&self) -> &EvaluatorConfig {
        &self.evaluator
    }

    /// Mutable access to the source section, e.g. to append include
    /// directories given on the command line.
    pub fn source_mut(&mut self) -> &mut SourceConfig {
        &mut self.source
    }

    pub fn evaluator_mut(&mut self) -> &mut EvaluatorConfig {
        &mut self.evaluator
    }
}

/// Limits on source text and where `#include` looks for files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Exclusive upper bound on source length in bytes.
    max_source_len: usize,

    /// Directories searched for `#include`d files, in order.
    include_dirs: Vec<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            max_source_len: DEFAULT_MAX_SOURCE_LEN,
            include_dirs: Vec::new(),
        }
    }
}

impl SourceConfig {
    pub fn max_source_len(&self) -> usize {
        self.max_source_len
    }

    pub fn include_dirs(&self) -> &[PathBuf] {
        &self.include_dirs
    }

    pub fn with_max_source_len(mut self, max_source_len: usize) -> Self {
        self.max_source_len = max_source_len;
        self
    }

    /// Append an include directory after the configured ones.
    pub fn add_include_dir(&mut self, dir: impl AsRef<Path>) {
        self.include_dirs.push(dir.as_ref().to_path_buf());
    }
}

/// How elements of array declarations are named.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayNaming {
    /// Elements of a top-level array of a custom type are all named
    /// `name[N]`, with `N` the array length. Struct member elements are
    /// named `prefix.member[i]`.
    #[default]
    Legacy,
    /// Every array element is named by its index, `name[i]`.
    Indexed,
}

/// Region naming and resource limits of the evaluator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    array_naming: ArrayNaming,

    /// Deepest allowed struct nesting.
    max_depth: usize,

    /// Most regions a single evaluation may emit.
    max_regions: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            array_naming: ArrayNaming::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }
}

impl EvaluatorConfig {
    pub fn array_naming(&self) -> ArrayNaming {
        self.array_naming
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_regions(&self) -> usize {
        self.max_regions
    }

    pub fn with_array_naming(mut self, array_naming: ArrayNaming) -> Self {
        self.array_naming = array_naming;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_regions(mut self, max_regions: usize) -> Self {
        self.max_regions = max_regions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert_eq!(config.source().max_source_len(), DEFAULT_MAX_SOURCE_LEN);
        assert!(config.source().include_dirs().is_empty());
        assert_eq!(config.evaluator().array_naming(), ArrayNaming::Legacy);
        assert_eq!(config.evaluator().max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(config.evaluator().max_regions(), DEFAULT_MAX_REGIONS);
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [source]
            include_dirs = ["patterns/includes", "/usr/share/hexpat"]

            [evaluator]
            array_naming = "indexed"
            "#,
        )
        .unwrap();

        assert_eq!(config.source().max_source_len(), DEFAULT_MAX_SOURCE_LEN);
        assert_eq!(config.source().include_dirs().len(), 2);
        assert_eq!(config.evaluator().array_naming(), ArrayNaming::Indexed);
        assert_eq!(config.evaluator().max_depth(), DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_unknown_naming_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[evaluator]\narray_naming = \"fancy\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_add_include_dir_appends() {
        let mut config = AppConfig::default();
        config.source_mut().add_include_dir("a");
        config.source_mut().add_include_dir("b");

        assert_eq!(
            config.source().include_dirs(),
            &[PathBuf::from("a"), PathBuf::from("b")]
        );
    }
}
