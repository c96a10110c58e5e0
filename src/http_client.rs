//! HTTP fetch module
//!
//! Thin wrapper around a `ureq` agent with fixed timeouts and bounded
//! response readers. Used for remote images, remote videos and CSV sources.
//! Requests are never retried.

use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::time::Duration;
use thiserror::Error;

/// Default connect timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default read timeout in seconds
const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Default maximum response size (64 MiB)
const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

/// HTTP error types
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("Response from {0} is not valid UTF-8")]
    InvalidText(String),
}

pub type Result<T> = std::result::Result<T, HttpError>;

/// HTTP client options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds
    pub read_timeout_secs: u64,
    /// Maximum accepted response size in bytes
    pub max_response_bytes: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_READ_TIMEOUT_SECS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

/// Blocking HTTP client
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    max_bytes: usize,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(&HttpOptions::default())
    }
}

impl HttpClient {
    /// Build a client with the given timeouts and size limit
    pub fn new(options: &HttpOptions) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(options.connect_timeout_secs))
            .timeout_read(Duration::from_secs(options.read_timeout_secs))
            .build();
        Self {
            agent,
            max_bytes: options.max_response_bytes,
        }
    }

    /// Maximum accepted response size
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// GET a URL into memory
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url)?;
        read_response_bytes(response, self.max_bytes).map_err(|source| HttpError::Body {
            url: url.to_string(),
            source,
        })
    }

    /// GET a URL as UTF-8 text
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch_bytes(url)?;
        String::from_utf8(bytes).map_err(|_| HttpError::InvalidText(url.to_string()))
    }

    /// GET a URL and stream the body into `writer`
    pub fn download_to<W: Write>(&self, url: &str, writer: &mut W) -> Result<()> {
        let response = self.get(url)?;
        copy_response_to_writer(response, writer, self.max_bytes).map_err(|source| {
            HttpError::Body {
                url: url.to_string(),
                source,
            }
        })
    }

    fn get(&self, url: &str) -> Result<ureq::Response> {
        self.agent
            .get(url)
            .call()
            .map_err(|source| HttpError::Request {
                url: url.to_string(),
                source: Box::new(source),
            })
    }
}

/// Whether a reference points at an HTTP(S) resource
pub fn is_remote(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Read a response into memory, enforcing a maximum byte size.
fn read_response_bytes(response: ureq::Response, max_bytes: usize) -> io::Result<Vec<u8>> {
    check_content_length(&response, max_bytes)?;
    let reader = response.into_reader();
    let mut limited = reader.take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response exceeded {max_bytes} bytes"),
        ));
    }
    Ok(bytes)
}

/// Stream a response to the provided writer, enforcing a maximum byte size.
fn copy_response_to_writer<W: Write>(
    response: ureq::Response,
    writer: &mut W,
    max_bytes: usize,
) -> io::Result<()> {
    check_content_length(&response, max_bytes)?;
    let mut reader = response.into_reader();
    let mut buf = [0u8; 16 * 1024];
    let mut total = 0usize;
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        total += read;
        if total > max_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Response exceeded {max_bytes} bytes"),
            ));
        }
        writer.write_all(&buf[..read])?;
    }
    writer.flush()
}

fn check_content_length(response: &ureq::Response, max_bytes: usize) -> io::Result<()> {
    let Some(length) = response.header("Content-Length") else {
        return Ok(());
    };
    let Ok(length) = length.parse::<u64>() else {
        return Ok(());
    };
    if length > max_bytes as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response too large: {length} bytes"),
        ));
    }
    Ok(())
}
