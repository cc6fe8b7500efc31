//! The archive engine abstraction used by the update pipeline.

use super::error::ArchiveError;
use crate::pipeline::CancellationToken;
use std::path::Path;

/// Trait for testing and extracting release archives.
///
/// The pipeline calls both methods from worker threads, so implementations
/// must be shareable across threads.
///
/// # Examples
///
/// ```
/// use kfx_installer::archive::{ArchiveEngine, SevenZipEngine};
///
/// let engine = SevenZipEngine::new();
/// // Use engine.test_and_get_size(path) and engine.extract(..) in production
/// # let _ = &engine as &dyn ArchiveEngine;
/// ```
pub trait ArchiveEngine: Send + Sync {
    /// Read every entry of the archive, verifying checksums, and return
    /// the total uncompressed size in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Corrupt`] when the archive cannot be decoded
    /// or an entry fails its checksum, and [`ArchiveError::Io`] when the
    /// file cannot be opened.
    fn test_and_get_size(&self, archive: &Path) -> Result<u64, ArchiveError>;

    /// Test the archive, then extract every entry beneath `dest`.
    ///
    /// `progress` receives the cumulative number of bytes written. It never
    /// decreases and its final value equals the tested size. Returns the
    /// total number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`ArchiveEngine::test_and_get_size`] without
    /// touching `dest`, [`ArchiveError::PathTraversal`] for entries that
    /// escape `dest`, [`ArchiveError::ExtractionFailed`] when a file cannot
    /// be written and [`ArchiveError::Cancelled`] when `cancel` fires.
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn FnMut(u64),
        cancel: &CancellationToken,
    ) -> Result<u64, ArchiveError>;
}
