//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate Markdown API docs from Python sources
#[derive(Parser, Debug)]
#[command(name = "pyautodoc")]
#[command(about = "Generate Markdown API docs from Python sources")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (debug logging and progress bars)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render every configured page into the output directory
    Generate {
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Python source root (overrides the config file)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Leave {{autogenerated}} markers in the finished pages
        #[arg(long)]
        keep_markers: bool,
    },

    /// Resolve a dotted name and show what it refers to
    Resolve {
        /// Dotted name, e.g. pkg.layers.Dense.call
        name: String,

        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Python source root (overrides the config file)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Treat the last segment as a method bound to the class before it
        #[arg(long)]
        bound: bool,
    },

    /// Dump the object index as JSON
    Index {
        /// Config file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Python source root (overrides the config file)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Write the JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
