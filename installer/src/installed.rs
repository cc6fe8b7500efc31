//! Record of the release currently installed in an installation root.
//!
//! The record is written after every successful run to
//! `<root>/.kfx-installed.json` and read back by the commands that compare
//! against the installed build.

use crate::version::{ReleaseChannel, VersionInfo};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the record file inside the installation root.
pub const INSTALLED_FILE_NAME: &str = ".kfx-installed.json";

/// Errors that prevent the installed record from being read or written.
#[derive(Debug, thiserror::Error)]
pub enum InstalledError {
    /// Reading the record failed.
    #[error("failed to read installed record {path}: {source}")]
    Read {
        /// Record path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialising the record failed.
    #[error("failed to serialise installed record: {source}")]
    Serialise {
        /// Underlying serialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// Writing the record failed.
    #[error("failed to write installed record {path}: {source}")]
    Write {
        /// Record path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    channel: String,
    version: String,
    full_string: String,
}

/// Path of the record for `root`.
#[must_use]
pub fn record_path(root: &Path) -> PathBuf {
    root.join(INSTALLED_FILE_NAME)
}

/// Read the installed release for `root`.
///
/// A missing or malformed record yields [`VersionInfo::unknown`], so a
/// fresh or hand-edited installation always looks out of date.
///
/// # Errors
///
/// Returns [`InstalledError::Read`] when the record exists but cannot be
/// read.
pub fn read_installed(root: &Path) -> Result<VersionInfo, InstalledError> {
    let path = record_path(root);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no installed record at {}", path.display());
            return Ok(VersionInfo::unknown());
        }
        Err(source) => return Err(InstalledError::Read { path, source }),
    };

    match serde_json::from_str::<Record>(&content) {
        Ok(record) => Ok(VersionInfo::new(
            ReleaseChannel::from_name(&record.channel),
            record.version,
            record.full_string,
            "",
        )),
        Err(e) => {
            warn!("ignoring malformed installed record {}: {e}", path.display());
            Ok(VersionInfo::unknown())
        }
    }
}

/// Persist `installed` as the release present in `root`.
///
/// # Errors
///
/// Returns [`InstalledError`] when the record cannot be serialised or
/// written.
pub fn record_installed(root: &Path, installed: &VersionInfo) -> Result<(), InstalledError> {
    let record = Record {
        channel: installed.channel().to_string(),
        version: installed.version().to_owned(),
        full_string: installed.full_string().to_owned(),
    };
    let json = serde_json::to_string_pretty(&record)
        .map_err(|source| InstalledError::Serialise { source })?;
    let path = record_path(root);
    std::fs::write(&path, json).map_err(|source| InstalledError::Write { path, source })
}
