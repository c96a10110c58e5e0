//! hue-index - incremental color signatures for image references
//!
//! Derives a compact color signature (dominant hue, secondary hue, dominant
//! weight, saturation) from images and video frames, and merges it into
//! markdown front matter or CSV tables without recomputing known values.
//!
//! # Features
//!
//! - **Analysis** ([`analyzer`]) - Hue histogram with circular-distance secondary hue
//! - **Sampling** ([`sampler`]) - Fixed-size resize-then-sample pixel grids
//! - **Sources** ([`source`]) - Local files, URLs and first video frames via `ffmpeg`
//! - **Merging** ([`merge`]) - Index reuse, in-run memo and stable column order
//! - **Stores** ([`front_matter`], [`csv_store`]) - Line-preserving front matter, CSV tables
//!
//! # Quick Start
//!
//! ```rust
//! use hue_index::{AnalyzerOptions, HueAnalyzer};
//!
//! let analyzer = HueAnalyzer::new(
//!     AnalyzerOptions::builder()
//!         .secondary_separation(20)
//!         .build(),
//! );
//! let sig = analyzer.analyze(&[[0, 255, 0], [0, 255, 0]]);
//! assert_eq!(sig.dominant_hue, 120);
//! assert_eq!(sig.weight, 1.0);
//! ```
//!
//! Running a whole update:
//!
//! ```rust,no_run
//! use hue_index::{IndexPipeline, PipelineConfig, SilentProgress};
//!
//! let pipeline = IndexPipeline::new(PipelineConfig::default().with_repo_root("site")).unwrap();
//! let summary = pipeline.run_markdown("content/*.md", &SilentProgress).unwrap();
//! println!("Files updated: {}", summary.updated_paths.len());
//! ```
//!
//! # Architecture
//!
//! ```text
//! records -> MergeEngine --(index / memo miss)--> SourceResolver
//!               |                                      |
//!               |                         PixelSampler -> HueAnalyzer
//!               v
//!     front matter / CSV output (written only when changed)
//! ```
//!
//! # License
//!
//! AGPL-3.0

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod csv_store;
pub mod frame;
pub mod front_matter;
pub mod http_client;
pub mod index;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod record;
pub mod sampler;
pub mod signature;
pub mod source;
pub mod util;

// Re-exports for convenience
pub use analyzer::{
    circular_distance, quantize_hue, rgb_to_hsv, AnalyzerOptions, AnalyzerOptionsBuilder,
    HueAnalyzer, HueHistogram,
};
pub use cli::{create_progress_bar, AnalyzeArgs, Cli, Commands, ExitCode, UpdateArgs};
pub use config::{CliOverrides, Config, ConfigError};
pub use csv_store::{CsvSource, CsvStoreError, CsvTable};
pub use frame::{FfmpegExtractor, FrameError, FrameExtractor};
pub use front_matter::{FrontMatter, MarkdownDocument};
pub use http_client::{HttpClient, HttpError, HttpOptions};
pub use index::{ColorIndex, IndexError};
pub use merge::{MergeDecision, MergeEngine, MergeReport};
pub use pipeline::{
    IndexPipeline, PipelineConfig, PipelineError, ProgressCallback, RunSummary, SilentProgress,
};
pub use record::{Record, RecordAccessor};
pub use sampler::{PixelGrid, PixelSampler};
pub use signature::{ColorSignature, SignatureError, SIGNATURE_KEYS};
pub use source::{ImageSource, SourceError, SourceKind, SourceOptions, SourceResolver};
pub use util::{format_duration, write_if_changed};
