//! Video frame extraction module
//!
//! Obtains a single representative frame (the first one) of a video file as
//! encoded raster bytes by running an external tool.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Default frame extraction program
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Frame extraction error types
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Video file not found: {0}")]
    VideoNotFound(PathBuf),

    #[error("External tool error: {0}")]
    ExternalToolError(String),

    #[error("No frame produced for {0}")]
    EmptyFrame(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// Extracts the first frame of a local video file
pub trait FrameExtractor {
    /// Return the first frame as encoded raster bytes (PNG)
    fn first_frame(&self, video_path: &Path) -> Result<Vec<u8>>;
}

/// ffmpeg-based extractor
///
/// Runs `ffmpeg -i <video> -frames:v 1 -f image2pipe -vcodec png -` and reads
/// the PNG from stdout. A non-zero exit status is a failure.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: PathBuf,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG)
    }
}

impl FfmpegExtractor {
    /// Create an extractor invoking `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Program that will be invoked
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Whether the program can be found on PATH (or exists as given)
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn command(&self, video_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-v", "error", "-nostdin", "-i"])
            .arg(video_path)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .stdin(Stdio::null());
        cmd
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn first_frame(&self, video_path: &Path) -> Result<Vec<u8>> {
        if !video_path.is_file() {
            return Err(FrameError::VideoNotFound(video_path.to_path_buf()));
        }

        let output = self.command(video_path).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FrameError::ExternalToolError(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        if output.stdout.is_empty() {
            return Err(FrameError::EmptyFrame(video_path.to_path_buf()));
        }

        Ok(output.stdout)
    }
}
