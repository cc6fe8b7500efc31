//! Events that drive the pipeline state machine.

use crate::error::FailureKind;

/// Something that happened during a pipeline run.
///
/// Workers report results to the controlling thread, which turns each one
/// into an event and feeds it to [`PipelineState::on`](super::PipelineState::on).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A run was requested.
    Start,
    /// The release plan is known; carries the first archive's URL.
    ManifestResolved {
        /// Download URL of the first archive.
        download_url: String,
    },
    /// The archive has been written to the temporary file.
    DownloadFinished {
        /// Bytes received.
        bytes: u64,
    },
    /// The archive passed its integrity test.
    ArchiveTested {
        /// Total uncompressed size.
        size: u64,
    },
    /// Every entry has been written into the installation.
    ExtractFinished {
        /// Bytes written.
        bytes: u64,
    },
    /// Another archive of a chained release follows.
    NextStep {
        /// Download URL of the next archive.
        download_url: String,
    },
    /// The temporary archive is gone and obsolete files are handled.
    CleanupFinished,
    /// The current stage failed.
    Failed {
        /// Classification of the failure.
        kind: FailureKind,
        /// Human-readable reason.
        reason: String,
    },
}

impl PipelineEvent {
    /// Short name used in logs and transition errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ManifestResolved { .. } => "manifest-resolved",
            Self::DownloadFinished { .. } => "download-finished",
            Self::ArchiveTested { .. } => "archive-tested",
            Self::ExtractFinished { .. } => "extract-finished",
            Self::NextStep { .. } => "next-step",
            Self::CleanupFinished => "cleanup-finished",
            Self::Failed { .. } => "failed",
        }
    }
}
