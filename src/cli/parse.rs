//! CLI parse: clap types for verso. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Verso - version tracking for single files
#[derive(Parser)]
#[command(name = "verso", version)]
#[command(about = "Keep numbered versions of single files, without repositories")]
#[command(
    long_about = "Keep numbered versions of single files, without repositories.\n\n\
Every file is identified by its absolute path. Versions, their notes and their\n\
contents live in one data directory (by default $XDG_DATA_HOME/verso).\n\n\
Examples:\n  \
verso add deploy.sh -m 'deploy production'\n  \
verso commits deploy.sh\n  \
verso add deploy.sh -m 'deploy production with redis' --base 1\n  \
verso diff deploy.sh --from 1 --to 0"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the log and stored contents
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Configuration file path (replaces the global config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, file, file+stderr)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Commit the current content of a file as a new version
    Add {
        /// File to commit
        file: PathBuf,
        /// Short description of the change
        #[arg(short, long)]
        message: String,
        /// Version this one is based on (0: no parent)
        #[arg(long, default_value_t = 0)]
        base: u32,
    },
    /// List recorded versions of a file, or of every file
    Commits {
        file: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the version tree of a file, or of every file
    Tree { file: Option<PathBuf> },
    /// Write the content of a version to stdout
    Cat {
        file: PathBuf,
        /// Version number (1 or higher)
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        version: u32,
    },
    /// Diff two versions of a file (0 is the file on disk)
    Diff {
        file: PathBuf,
        #[arg(long, default_value_t = 0)]
        from: u32,
        #[arg(long, default_value_t = 0)]
        to: u32,
    },
    /// List tracked files with their signatures
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Re-check stored contents against their checksums
    Verify { file: Option<PathBuf> },
    /// Print the effective configuration
    Config,
}
