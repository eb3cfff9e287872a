//! Command-line argument definitions for the hexpat CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the pattern and data files, the listing
//! format, configuration and include directories, and logging verbosity.

use clap::{Parser, ValueEnum};

/// Command-line arguments for the hexpat pattern tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the pattern file
    #[arg(help = "Path to the pattern file (.hexpat)")]
    pub pattern: String,

    /// Binary file to decode region values from
    #[arg(short, long)]
    pub data: Option<String>,

    /// Listing format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Write the listing to this file instead of standard output
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Additional directory searched by `#include` (repeatable)
    #[arg(short = 'I', long = "include-dir")]
    pub include_dirs: Vec<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// How the region listing is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for reading in a terminal
    Table,
    /// A JSON document for other tools
    Json,
}
