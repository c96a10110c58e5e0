//! CSV store module
//!
//! Reads a CSV table (local file or HTTP(S) URL) into ordered [`Record`]s and
//! renders records back to CSV text with an explicit column order.
//!
//! Parsing is lenient about ragged rows: missing trailing cells read as empty
//! strings. A table without a header row is malformed.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::http_client::{is_remote, HttpClient, HttpError};
use crate::record::Record;

/// UTF-8 byte order mark
const BOM: char = '\u{feff}';

/// CSV store error types
#[derive(Debug, Error)]
pub enum CsvStoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch CSV: {0}")]
    Fetch(#[from] HttpError),

    #[error("CSV has no header row")]
    MissingHeader,

    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8")]
    Encoding,
}

pub type Result<T> = std::result::Result<T, CsvStoreError>;

/// Parsed CSV table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

/// Where CSV input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvSource {
    Path(PathBuf),
    Url(String),
}

impl CsvSource {
    /// Classify a CSV location; relative paths are joined to `repo_root`
    pub fn parse(location: &str, repo_root: &Path) -> Self {
        let location = location.trim();
        if is_remote(location) {
            CsvSource::Url(location.to_string())
        } else {
            let path = Path::new(location);
            if path.is_absolute() {
                CsvSource::Path(path.to_path_buf())
            } else {
                CsvSource::Path(repo_root.join(path))
            }
        }
    }

    /// Local path, if any
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            CsvSource::Path(p) => Some(p),
            CsvSource::Url(_) => None,
        }
    }

    /// Read the whole source as text
    pub fn read(&self, http: &HttpClient) -> Result<String> {
        match self {
            CsvSource::Path(path) => fs::read_to_string(path).map_err(|source| CsvStoreError::Read {
                path: path.clone(),
                source,
            }),
            CsvSource::Url(url) => Ok(http.fetch_text(url)?),
        }
    }
}

impl std::fmt::Display for CsvSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvSource::Path(p) => write!(f, "{}", p.display()),
            CsvSource::Url(u) => write!(f, "{}", u),
        }
    }
}

/// Parse CSV text into a header row and records
pub fn parse_table(text: &str) -> Result<CsvTable> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvStoreError::MissingHeader);
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (i, header) in headers.iter().enumerate() {
            record.set(header.as_str(), row.get(i).unwrap_or(""));
        }
        records.push(record);
    }

    Ok(CsvTable { headers, records })
}

/// Render records as CSV text with the given column order
///
/// Rows use `\n` terminators; a record missing a column gets an empty cell.
pub fn render_table(columns: &[String], records: &[Record]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvStoreError::Parse(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|_| CsvStoreError::Encoding)
}

/// Read and parse a CSV source
pub fn read_table(source: &CsvSource, http: &HttpClient) -> Result<CsvTable> {
    let text = source.read(http)?;
    parse_table(&text)
}
