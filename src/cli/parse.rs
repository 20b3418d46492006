//! CLI parse: clap types for navbridge. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Navbridge CLI - headless client for server-driven navigation
#[derive(Parser)]
#[command(name = "navbridge")]
#[command(about = "Decode packed responses and drive server-driven navigation headlessly")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory searched for navbridge.toml
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a packed JSON file (a bare packed value or a whole render response)
    Decode {
        /// File to decode
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Load a path through a headless controller and print the resulting frame
    Visit {
        /// Path to load, e.g. /posts/ (default: navigation.initial_path)
        path: Option<String>,
        /// Server to load from (overrides transport.base_url)
        #[arg(long)]
        base_url: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the effective configuration as TOML
    Config,
}
