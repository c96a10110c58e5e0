//! Source Resolver module
//!
//! Turns an image reference into a [`PixelGrid`]. A reference is one of:
//!
//! - a local raster image, resolved against the repository root
//! - a remote raster image (`http://` / `https://`)
//! - a local or remote video, whose first frame is extracted with an
//!   external tool (remote videos are staged to a temporary file first)
//!
//! Anything else is "not analyzable". Callers treat every [`SourceError`]
//! the same way: the record keeps whatever signature it already had.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::frame::{FfmpegExtractor, FrameError, FrameExtractor};
use crate::http_client::{is_remote, HttpClient, HttpError};
use crate::sampler::{PixelGrid, PixelSampler};

/// Default raster extensions
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Default video extensions
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["webm"];

/// Source resolution error types
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Empty image reference")]
    EmptyReference,

    #[error("Unsupported reference type: {0}")]
    Unsupported(String),

    #[error("Image not found: {0}")]
    NotFound(PathBuf),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] HttpError),

    #[error("Decode failed for {reference}: {reason}")]
    Decode { reference: String, reason: String },

    #[error("Frame extraction failed: {0}")]
    Frame(#[from] FrameError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SourceError {
    /// Whether the reference was rejected before any file or network access
    pub fn is_not_analyzable(&self) -> bool {
        matches!(self, SourceError::EmptyReference | SourceError::Unsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

/// Classified image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    LocalImage(PathBuf),
    RemoteImage(String),
    LocalVideo(PathBuf),
    RemoteVideo(String),
    Unsupported,
}

/// Anything that can produce sampled pixels for a reference
pub trait ImageSource {
    fn pixels(&self, reference: &str) -> Result<PixelGrid>;
}

/// Source resolver options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Root against which relative local references are resolved
    pub repo_root: PathBuf,
    /// Raster extensions (lowercase, no dot)
    pub image_extensions: Vec<String>,
    /// Video extensions (lowercase, no dot)
    pub video_extensions: Vec<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            image_extensions: to_owned_list(DEFAULT_IMAGE_EXTENSIONS),
            video_extensions: to_owned_list(DEFAULT_VIDEO_EXTENSIONS),
        }
    }
}

impl SourceOptions {
    /// Create options rooted at `repo_root` with default extension sets
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            ..Default::default()
        }
    }

    fn is_image_ext(&self, ext: &str) -> bool {
        self.image_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    fn is_video_ext(&self, ext: &str) -> bool {
        self.video_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Resolves references to pixel grids
pub struct SourceResolver<E: FrameExtractor = FfmpegExtractor> {
    options: SourceOptions,
    sampler: PixelSampler,
    http: HttpClient,
    extractor: E,
}

impl SourceResolver<FfmpegExtractor> {
    /// Create a resolver using ffmpeg for video frames
    pub fn new(options: SourceOptions, sampler: PixelSampler, http: HttpClient) -> Self {
        Self::with_extractor(options, sampler, http, FfmpegExtractor::default())
    }
}

impl<E: FrameExtractor> SourceResolver<E> {
    /// Create a resolver with a custom frame extractor
    pub fn with_extractor(
        options: SourceOptions,
        sampler: PixelSampler,
        http: HttpClient,
        extractor: E,
    ) -> Self {
        Self {
            options,
            sampler,
            http,
            extractor,
        }
    }

    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    pub fn sampler(&self) -> &PixelSampler {
        &self.sampler
    }

    /// Classify a reference by location and extension
    pub fn classify(&self, reference: &str) -> SourceKind {
        let reference = reference.trim();
        if reference.is_empty() {
            return SourceKind::Unsupported;
        }

        if is_remote(reference) {
            let ext = url_extension(reference).unwrap_or_default();
            return if self.options.is_image_ext(&ext) {
                SourceKind::RemoteImage(reference.to_string())
            } else if self.options.is_video_ext(&ext) {
                SourceKind::RemoteVideo(reference.to_string())
            } else {
                SourceKind::Unsupported
            };
        }

        let path = self.local_path(reference);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        if self.options.is_image_ext(&ext) {
            SourceKind::LocalImage(path)
        } else if self.options.is_video_ext(&ext) {
            SourceKind::LocalVideo(path)
        } else {
            SourceKind::Unsupported
        }
    }

    /// Resolve a reference to sampled pixels
    pub fn resolve(&self, reference: &str) -> Result<PixelGrid> {
        if reference.trim().is_empty() {
            return Err(SourceError::EmptyReference);
        }

        match self.classify(reference) {
            SourceKind::LocalImage(path) => {
                ensure_local(&path)?;
                let bytes = std::fs::read(&path)?;
                self.decode(reference, &bytes)
            }
            SourceKind::RemoteImage(url) => {
                let bytes = self.http.fetch_bytes(&url)?;
                self.decode(reference, &bytes)
            }
            SourceKind::LocalVideo(path) => {
                ensure_local(&path)?;
                let frame = self.extractor.first_frame(&path)?;
                self.decode(reference, &frame)
            }
            SourceKind::RemoteVideo(url) => {
                let frame = self.remote_video_frame(&url)?;
                self.decode(reference, &frame)
            }
            SourceKind::Unsupported => Err(SourceError::Unsupported(reference.to_string())),
        }
    }

    /// Stage a remote video to a temporary file and extract its first frame
    ///
    /// The temporary file is removed when this returns, whatever the outcome.
    fn remote_video_frame(&self, url: &str) -> Result<Vec<u8>> {
        let suffix = url_extension(url)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let mut staged = tempfile::Builder::new()
            .prefix("hue-index-")
            .suffix(&suffix)
            .tempfile()?;

        self.http.download_to(url, staged.as_file_mut())?;
        let frame = self.extractor.first_frame(staged.path())?;
        Ok(frame)
    }

    fn decode(&self, reference: &str, bytes: &[u8]) -> Result<PixelGrid> {
        let image = image::load_from_memory(bytes).map_err(|e| SourceError::Decode {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.sampler.sample(&image))
    }

    fn local_path(&self, reference: &str) -> PathBuf {
        self.options.repo_root.join(reference.trim_start_matches('/'))
    }
}

impl<E: FrameExtractor> ImageSource for SourceResolver<E> {
    fn pixels(&self, reference: &str) -> Result<PixelGrid> {
        self.resolve(reference)
    }
}

fn ensure_local(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SourceError::NotFound(path.to_path_buf()))
    }
}

/// Lowercase extension of the last path segment of a URL, ignoring query and fragment
fn url_extension(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let path = without_fragment.split('?').next().unwrap_or(without_fragment);
    let after_scheme = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    // host-only URLs have no path segment to take an extension from
    let (_, path_part) = after_scheme.split_once('/')?;
    let segment = path_part.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
