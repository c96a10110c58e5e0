//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::pipeline::DEFAULT_CONTENT_GLOB;

/// Exit codes for the CLI
///
/// These codes follow standard Unix conventions and provide
/// specific error categories for scripting and automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Normal exit
    Success = 0,
    /// Unclassified failure
    GeneralError = 1,
    /// Invalid arguments or configuration
    InvalidArgs = 2,
    /// Input file or document set not found
    InputNotFound = 3,
    /// Output could not be written
    OutputError = 4,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::InvalidArgs => "Invalid arguments",
            ExitCode::InputNotFound => "Input not found",
            ExitCode::OutputError => "Output error (permission denied, disk full, etc.)",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Incremental color signature index for images and video frames
#[derive(Parser, Debug)]
#[command(name = "hue-index")]
#[command(version)]
#[command(about = "Compute and store hue signatures for image references", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors; hide the progress bar
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (default: ./hue-index.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Update signatures in markdown front matter or a CSV table
    Update(UpdateArgs),
    /// Print the signature of a single image reference
    Analyze(AnalyzeArgs),
    /// Show system information
    Info,
}

/// Options shared by commands that resolve references
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Repository root for relative references
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// Sampling grid edge length
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=4096))]
    pub size: Option<u32>,

    /// Frame extraction program for video references
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,
}

/// Arguments for the update command
#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Markdown documents to update (relative to the repo root)
    #[arg(long, conflicts_with = "csv")]
    pub content_glob: Option<String>,

    /// CSV source: local path or http(s) URL
    #[arg(long)]
    pub csv: Option<String>,

    /// CSV output path (defaults to the CSV source when it is a local file)
    #[arg(short, long, requires = "csv")]
    pub output: Option<PathBuf>,

    /// Reference column / front matter key
    #[arg(long, visible_alias = "index-column")]
    pub image_key: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Show what would run without touching any file
    #[arg(long)]
    pub dry_run: bool,
}

impl UpdateArgs {
    /// Glob used in markdown mode
    pub fn effective_glob(&self) -> &str {
        self.content_glob.as_deref().unwrap_or(DEFAULT_CONTENT_GLOB)
    }

    /// Whether the run targets a CSV table
    pub fn is_csv(&self) -> bool {
        self.csv.is_some()
    }

    /// Config overrides taken from the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            index_column: self.image_key.clone(),
            ..self.source.overrides()
        }
    }
}

/// Arguments for the analyze command
#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Image or video reference (path relative to the repo root, or URL)
    pub reference: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Print the signature as JSON
    #[arg(long)]
    pub json: bool,
}

impl SourceArgs {
    /// Config overrides taken from the command line
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            sample_size: self.size,
            repo_root: self.repo_root.clone(),
            ffmpeg: self.ffmpeg.clone(),
            ..Default::default()
        }
    }
}

/// Create a styled progress bar for record processing
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb
}
