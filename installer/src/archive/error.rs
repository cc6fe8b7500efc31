//! Errors arising from archive testing and extraction.

/// Errors arising from archive testing and extraction.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The archive failed its integrity test or could not be decoded.
    #[error("archive is corrupt: {reason}")]
    Corrupt {
        /// Description of the decode or checksum failure.
        reason: String,
    },

    /// Writing an extracted entry to the destination failed.
    #[error("extraction failed: {reason}")]
    ExtractionFailed {
        /// Description of the write failure.
        reason: String,
    },

    /// An entry path attempts to escape the destination directory.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending entry name from the archive.
        path: String,
    },

    /// The operation was cancelled.
    #[error("archive operation cancelled")]
    Cancelled,

    /// The archive file could not be opened.
    #[error("archive I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub(crate) fn corrupt(source: &impl std::fmt::Display) -> Self {
        Self::Corrupt {
            reason: source.to_string(),
        }
    }

    pub(crate) fn extraction_failed(target: &std::path::Path, source: &std::io::Error) -> Self {
        Self::ExtractionFailed {
            reason: format!("{}: {source}", target.display()),
        }
    }
}
