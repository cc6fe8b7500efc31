//! Streaming archive downloads.
//!
//! Provides a trait-based abstraction for fetching release archives so the
//! update pipeline can be driven by scripted fakes in tests.

use crate::pipeline::CancellationToken;
use log::{debug, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

/// Bytes requested from the response body per read.
pub const CHUNK_SIZE: usize = 256 * 1024;

/// Default connect timeout for archive downloads.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for downloading a remote file to disk.
///
/// Implementations create `dest` before requesting any bytes, report the
/// cumulative byte count through `progress` (never decreasing), and return
/// only after the destination file has been closed. A failed transfer may
/// leave a truncated file behind; callers own its cleanup.
pub trait Downloader: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// `progress` receives `(received, total)` where `total` is the
    /// advertised content length when the server sends one.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Cancelled`] when `cancel` fires mid-transfer,
    /// [`DownloadError::NotFound`] for a 404, [`DownloadError::Http`] for
    /// other transport failures and [`DownloadError::Io`] when `dest`
    /// cannot be written.
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError>;
}

/// Errors arising from archive downloads.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested file was not found (HTTP 404).
    #[error("file not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),

    /// The transfer was cancelled.
    #[error("download cancelled")]
    Cancelled,
}

/// HTTP downloader using `ureq`.
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Create a downloader with the given connect timeout.
    ///
    /// No overall timeout is applied; game archives are large and slow
    /// links must be allowed to finish.
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(connect_timeout))
            .build();
        Self::with_agent(ureq::Agent::new_with_config(config))
    }

    /// Create a downloader around a preconfigured agent.
    #[must_use]
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Downloader for HttpDownloader {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let mut file = File::create(dest)?;
        debug!("downloading {url} to {}", dest.display());

        let response = self.agent.get(url).call().map_err(|e| {
            warn!("download of {url} failed: {e}");
            map_ureq_error(url, &e)
        })?;
        let total = response
            .headers()
            .get(ureq::http::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let mut body = response.into_body();
        let mut reader = body.as_reader();
        let received = copy_in_chunks(&mut reader, &mut file, total, progress, cancel)
            .map_err(|e| match e {
                ChunkError::Cancelled => DownloadError::Cancelled,
                ChunkError::Read(source) => DownloadError::Http {
                    url: url.to_owned(),
                    reason: source.to_string(),
                },
                ChunkError::Write(source) => DownloadError::Io(source),
            })?;
        file.flush()?;
        drop(file);

        debug!("downloaded {received} bytes from {url}");
        Ok(received)
    }
}

enum ChunkError {
    Cancelled,
    Read(std::io::Error),
    Write(std::io::Error),
}

fn copy_in_chunks(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    total: Option<u64>,
    progress: &mut dyn FnMut(u64, Option<u64>),
    cancel: &CancellationToken,
) -> Result<u64, ChunkError> {
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    let mut received = 0_u64;
    loop {
        if cancel.is_cancelled() {
            return Err(ChunkError::Cancelled);
        }
        let read = match reader.read(&mut buffer) {
            Ok(0) => return Ok(received),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChunkError::Read(e)),
        };
        writer
            .write_all(buffer.get(..read).unwrap_or_default())
            .map_err(ChunkError::Write)?;
        received += read as u64;
        progress(received, total);
    }
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
