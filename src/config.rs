//! Configuration file support for hue-index
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./hue-index.toml` - current directory
//! 3. `~/.config/hue-index/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! index_column = "image"
//! sample_size = 64
//!
//! [analysis]
//! min_saturation = 0.2
//! secondary_separation = 15
//!
//! [sources]
//! video_extensions = ["webm", "mp4"]
//! ffmpeg = "/usr/local/bin/ffmpeg"
//!
//! [http]
//! read_timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyzer::AnalyzerOptions;
use crate::PipelineConfig;

/// Config file name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "hue-index.toml";

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Reference column / front matter key
    #[serde(default)]
    pub index_column: Option<String>,

    /// Sampling grid edge length
    #[serde(default)]
    pub sample_size: Option<u32>,

    /// Repository root for relative references
    #[serde(default)]
    pub repo_root: Option<PathBuf>,
}

/// Analyzer thresholds
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub min_saturation: Option<f64>,

    #[serde(default)]
    pub min_value: Option<f64>,

    /// Minimum degrees between dominant and secondary hue
    #[serde(default)]
    pub secondary_separation: Option<u16>,

    /// Degrees around the dominant hue used for the saturation estimate
    #[serde(default)]
    pub saturation_band: Option<u16>,
}

/// Reference source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourcesConfig {
    /// Raster extensions (no dot)
    #[serde(default)]
    pub image_extensions: Option<Vec<String>>,

    /// Video extensions (no dot)
    #[serde(default)]
    pub video_extensions: Option<Vec<String>>,

    /// Frame extraction program
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
}

/// HTTP configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    #[serde(default)]
    pub read_timeout_secs: Option<u64>,

    #[serde(default)]
    pub max_response_bytes: Option<usize>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analyzer settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Source settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// HTTP settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path
    ///
    /// Search order:
    /// 1. `./hue-index.toml`
    /// 2. `~/.config/hue-index/config.toml`
    /// 3. Default values (if no file found)
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load an explicitly given file, or fall back to the search path
    pub fn load_with(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Convert to PipelineConfig
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();

        // General
        if let Some(column) = &self.general.index_column {
            config = config.with_index_column(column.clone());
        }
        if let Some(size) = self.general.sample_size {
            config = config.with_sample_size(size);
        }
        if let Some(root) = &self.general.repo_root {
            config = config.with_repo_root(root.clone());
        }

        // Analysis thresholds go through the builder so they are clamped
        let defaults = AnalyzerOptions::default();
        let analysis = AnalyzerOptions::builder()
            .min_saturation(self.analysis.min_saturation.unwrap_or(defaults.min_saturation))
            .min_value(self.analysis.min_value.unwrap_or(defaults.min_value))
            .secondary_separation(
                self.analysis
                    .secondary_separation
                    .unwrap_or(defaults.secondary_separation),
            )
            .saturation_band(self.analysis.saturation_band.unwrap_or(defaults.saturation_band))
            .build();
        config = config.with_analysis(analysis);

        // Sources
        if let Some(exts) = &self.sources.image_extensions {
            config.image_extensions = normalize_extensions(exts);
        }
        if let Some(exts) = &self.sources.video_extensions {
            config.video_extensions = normalize_extensions(exts);
        }
        if let Some(ffmpeg) = &self.sources.ffmpeg {
            config = config.with_ffmpeg(ffmpeg.clone());
        }

        // HTTP
        if let Some(secs) = self.http.connect_timeout_secs {
            config.http.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.http.read_timeout_secs {
            config.http.read_timeout_secs = secs;
        }
        if let Some(bytes) = self.http.max_response_bytes {
            config.http.max_response_bytes = bytes;
        }

        config
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> PipelineConfig {
        let mut config = self.to_pipeline_config();

        if let Some(column) = &cli.index_column {
            config = config.with_index_column(column.clone());
        }
        if let Some(size) = cli.sample_size {
            config = config.with_sample_size(size);
        }
        if let Some(root) = &cli.repo_root {
            config = config.with_repo_root(root.clone());
        }
        if let Some(ffmpeg) = &cli.ffmpeg {
            config = config.with_ffmpeg(ffmpeg.clone());
        }

        config
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("hue-index").join("config.toml"));
        }

        paths
    }
}

/// Lowercase extensions without a leading dot
fn normalize_extensions(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub index_column: Option<String>,
    pub sample_size: Option<u32>,
    pub repo_root: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

impl CliOverrides {
    /// Create new empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set reference column override
    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = Some(column.into());
        self
    }

    /// Set sample size override
    pub fn with_sample_size(mut self, size: u32) -> Self {
        self.sample_size = Some(size);
        self
    }

    /// Set repository root override
    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = Some(root.into());
        self
    }
}
