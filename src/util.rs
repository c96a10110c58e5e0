//! Common utilities for hue-index
//!
//! Small filesystem and formatting helpers shared by the pipeline and the CLI.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `content` to `path` only when the bytes differ from what is there
///
/// Returns `true` when the file was written. Missing parent directories are
/// created.
pub fn write_if_changed<P: AsRef<Path>>(path: P, content: &str) -> io::Result<bool> {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(true)
}

/// `path` relative to `root` when it lies underneath, unchanged otherwise
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Format duration in human-readable format
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
