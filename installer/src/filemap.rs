//! Comparison of a release file map against the files on disk.
//!
//! The release API publishes a CRC32 for every file of a release. Comparing
//! those against the installation shows which files an update would change.
//! The result is informational: updates still replace every file.

use crate::api::FileManifest;
use crate::archive::path::validate_entry_path;
use flate2::Crc;
use log::{debug, warn};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Errors arising from checksumming installed files.
#[derive(Debug, thiserror::Error)]
pub enum FilemapError {
    /// An installed file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Compute the CRC32 of a file as lower-case hex.
///
/// # Errors
///
/// Returns [`FilemapError::Read`] when the file cannot be read.
pub fn file_crc32(path: &Path) -> Result<String, FilemapError> {
    let read_error = |source| FilemapError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let mut crc = Crc::new();
    let mut buffer = vec![0_u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer).map_err(read_error)?;
        match buffer.get(..read) {
            Some(chunk) if !chunk.is_empty() => crc.update(chunk),
            _ => break,
        }
    }
    Ok(format!("{:08x}", crc.sum()))
}

/// List manifest paths that are missing under `root` or whose checksum
/// differs from the published one.
///
/// Checksums are compared case-insensitively, ignoring leading zeros.
/// Paths that would leave `root` are skipped.
///
/// # Errors
///
/// Returns [`FilemapError::Read`] when an existing file cannot be read.
///
/// # Examples
///
/// ```
/// use kfx_installer::api::FileManifest;
/// use kfx_installer::filemap::stale_files;
///
/// let root = tempfile::tempdir().expect("temp dir");
/// std::fs::write(root.path().join("a.txt"), "a").expect("write");
///
/// let mut manifest = FileManifest::new();
/// manifest.insert("/a.txt".to_owned(), "e8b7be43".to_owned());
/// manifest.insert("/b.txt".to_owned(), "1".to_owned());
///
/// assert_eq!(stale_files(root.path(), &manifest).expect("checked"), vec!["b.txt"]);
/// ```
pub fn stale_files(root: &Path, manifest: &FileManifest) -> Result<Vec<String>, FilemapError> {
    let mut stale = Vec::new();
    for (path, expected) in manifest {
        let relative = path.trim_start_matches(['/', '\\']);
        let on_disk = match validate_entry_path(relative) {
            Ok(inside) if inside.as_os_str().is_empty() => continue,
            Ok(inside) => root.join(inside),
            Err(e) => {
                warn!("skipping file list entry: {e}");
                continue;
            }
        };
        if !on_disk.is_file() {
            debug!("missing: {relative}");
            stale.push(relative.to_owned());
            continue;
        }
        let actual = file_crc32(&on_disk)?;
        if normalise_checksum(&actual) != normalise_checksum(expected) {
            debug!("checksum mismatch: {relative} ({actual} != {expected})");
            stale.push(relative.to_owned());
        }
    }
    Ok(stale)
}

fn normalise_checksum(checksum: &str) -> String {
    let trimmed = checksum.trim().trim_start_matches('0');
    trimmed.to_ascii_lowercase()
}
