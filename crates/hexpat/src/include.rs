//! Resolving `#include` directives against the file system.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace};

use hexpat_parser::IncludeResolver;

/// Looks up included files in a list of directories.
///
/// Quoted includes (`#include "x"`) try the base directory first, usually
/// the directory of the pattern being evaluated; both forms then try each
/// search directory in order. The first readable file wins.
#[derive(Debug, Clone, Default)]
pub struct FileSystemResolver {
    base_dir: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl FileSystemResolver {
    pub fn new(search_dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            base_dir: None,
            search_dirs: search_dirs.into_iter().collect(),
        }
    }

    /// Set the directory quoted includes are resolved against first.
    pub fn with_base_dir(mut self, base_dir: impl AsRef<Path>) -> Self {
        self.base_dir = Some(base_dir.as_ref().to_path_buf());
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    fn candidates<'s>(&'s self, is_system: bool) -> impl Iterator<Item = &'s Path> + 's {
        let base = if is_system { None } else { self.base_dir.as_deref() };
        base.into_iter()
            .chain(self.search_dirs.iter().map(PathBuf::as_path))
    }
}

impl IncludeResolver for FileSystemResolver {
    fn resolve(&self, path: &str, is_system: bool) -> Option<String> {
        for dir in self.candidates(is_system) {
            let candidate = dir.join(path);
            match fs::read_to_string(&candidate) {
                Ok(content) => {
                    debug!(path:? = candidate; "Resolved include");
                    return Some(content);
                }
                Err(err) => {
                    trace!(path:? = candidate, err:% = err; "Include candidate not readable");
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_search_order() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        fs::write(first.path().join("a.hexpat"), "first").unwrap();
        fs::write(second.path().join("a.hexpat"), "second").unwrap();
        fs::write(second.path().join("b.hexpat"), "only second").unwrap();

        let resolver =
            FileSystemResolver::new([first.path().to_path_buf(), second.path().to_path_buf()]);

        assert_eq!(resolver.resolve("a.hexpat", false).as_deref(), Some("first"));
        assert_eq!(resolver.resolve("b.hexpat", true).as_deref(), Some("only second"));
        assert_eq!(resolver.resolve("missing.hexpat", false), None);
    }

    #[test]
    fn test_base_dir_only_for_quoted_includes() {
        let base = tempdir().unwrap();
        let lib = tempdir().unwrap();
        fs::write(base.path().join("types.hexpat"), "local").unwrap();
        fs::write(lib.path().join("types.hexpat"), "library").unwrap();

        let resolver =
            FileSystemResolver::new([lib.path().to_path_buf()]).with_base_dir(base.path());

        assert_eq!(resolver.resolve("types.hexpat", false).as_deref(), Some("local"));
        assert_eq!(resolver.resolve("types.hexpat", true).as_deref(), Some("library"));
    }

    #[test]
    fn test_nested_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("std")).unwrap();
        fs::write(dir.path().join("std/io.hexpat"), "u8 x;").unwrap();

        let resolver = FileSystemResolver::new([dir.path().to_path_buf()]);
        assert_eq!(resolver.resolve("std/io.hexpat", true).as_deref(), Some("u8 x;"));
    }
}
