//! CLI logic for the hexpat pattern tool.
//!
//! Evaluates a pattern file and prints the annotated regions, optionally
//! with the values they hold in a data file.

pub mod error_adapter;

mod args;
mod config;
mod output;

pub use args::{Args, OutputFormat};

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use log::{debug, info};

use hexpat::{FileSystemResolver, HexpatError, Pipeline};

/// Run the hexpat CLI application
///
/// Reads the pattern, evaluates it, and writes the region listing to the
/// output file or standard output. Quoted includes are looked up next to
/// the pattern file first, then in the configured and `-I` directories.
///
/// # Errors
///
/// Returns `HexpatError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Preprocessing, parsing and validation errors
/// - Layout errors
pub fn run(args: &Args) -> Result<(), HexpatError> {
    info!(pattern_path = args.pattern; "Processing pattern");

    let mut app_config = config::load_config(args.config.as_ref())?;
    for dir in &args.include_dirs {
        app_config.source_mut().add_include_dir(dir);
    }

    let pattern_path = Path::new(&args.pattern);
    let source = fs::read_to_string(pattern_path)?;

    let mut resolver = FileSystemResolver::new(app_config.source().include_dirs().iter().cloned());
    if let Some(base_dir) = pattern_path.parent() {
        resolver = resolver.with_base_dir(base_dir);
    }
    debug!(search_dirs:? = resolver.search_dirs(); "Include search path");

    let pipeline = Pipeline::new(app_config).with_resolver(resolver);
    let evaluation = pipeline.run(&source)?;

    let data = args.data.as_ref().map(fs::read).transpose()?;
    let listing = output::render(&evaluation, data.as_deref(), args.format).map_err(io::Error::from)?;

    match &args.output {
        Some(path) => {
            fs::write(path, listing)?;
            info!(output_file = path; "Listing written");
        }
        None => io::stdout().lock().write_all(listing.as_bytes())?,
    }

    info!(regions = evaluation.regions().len(); "Pattern evaluated");
    Ok(())
}
