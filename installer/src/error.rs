//! Error types for the KeeperFX installer.
//!
//! Each module owns a narrow error enum; [`UpdateError`] gathers them for
//! the update pipeline and the CLI. [`UpdateError::kind`] classifies a
//! failure so callers can react without matching on every variant.
//! [`CommandError`] adds the failures of the CLI commands around it.

use crate::api::FetchError;
use crate::archive::ArchiveError;
use crate::config::ConfigError;
use crate::download::DownloadError;
use crate::filemap::FilemapError;
use crate::installed::InstalledError;
use crate::removal::RemovalError;
use crate::version::ReleaseChannel;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A network transfer failed.
    Network,
    /// Release metadata was missing or malformed.
    ManifestParse,
    /// The requested channel is not served by the release API.
    UnsupportedChannel,
    /// The downloaded archive failed its integrity test.
    CorruptArchive,
    /// Extraction could not write into the installation.
    ExtractionFailed,
    /// A local file operation failed.
    Filesystem,
    /// Another pipeline holds the installation.
    Busy,
    /// The run was cancelled.
    Cancelled,
    /// The pipeline was driven incorrectly.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Network => "network error",
            Self::ManifestParse => "invalid release data",
            Self::UnsupportedChannel => "unsupported channel",
            Self::CorruptArchive => "corrupt archive",
            Self::ExtractionFailed => "extraction failed",
            Self::Filesystem => "filesystem error",
            Self::Busy => "installation busy",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal error",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while checking for, installing or applying an
/// update.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// Release metadata could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A release was resolved without a download URL.
    #[error("no download URL for {version}")]
    MissingDownloadUrl {
        /// Display form of the release.
        version: String,
    },

    /// The state machine moved to `Failed` on a regular event.
    #[error("{reason}")]
    StageRejected {
        /// Classification recorded by the state machine.
        kind: FailureKind,
        /// Reason recorded by the state machine.
        reason: String,
    },

    /// The channel cannot be installed or updated.
    #[error("cannot install from the {channel} channel")]
    UnsupportedChannel {
        /// The rejected channel.
        channel: ReleaseChannel,
    },

    /// The archive download failed.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// The archive could not be tested or extracted.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Obsolete files could not be removed.
    #[error(transparent)]
    Removal(#[from] RemovalError),

    /// Another pipeline holds the installation lock.
    #[error("another update is already running in {path}")]
    Busy {
        /// The locked installation root.
        path: PathBuf,
    },

    /// `run` was called while the pipeline was not idle.
    #[error("pipeline is not idle (currently {state})")]
    NotIdle {
        /// Display form of the current state.
        state: String,
    },

    /// An event arrived that the current state does not accept.
    #[error("event {event} is not valid in state {state}")]
    InvalidTransition {
        /// Display form of the current state.
        state: String,
        /// Name of the rejected event.
        event: &'static str,
    },

    /// A worker thread exited without reporting a result.
    #[error("{operation} worker stopped without reporting a result")]
    WorkerLost {
        /// The operation the worker was running.
        operation: &'static str,
    },

    /// The run was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UpdateError {
    /// Classify the failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::error::{FailureKind, UpdateError};
    ///
    /// assert_eq!(UpdateError::Cancelled.kind(), FailureKind::Cancelled);
    /// ```
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Fetch(FetchError::InvalidResponse { .. }) | Self::MissingDownloadUrl { .. } => {
                FailureKind::ManifestParse
            }
            Self::Fetch(FetchError::UnsupportedChannel { .. }) | Self::UnsupportedChannel { .. } => {
                FailureKind::UnsupportedChannel
            }
            Self::Fetch(_) => FailureKind::Network,
            Self::Download(DownloadError::Cancelled) | Self::Archive(ArchiveError::Cancelled) => {
                FailureKind::Cancelled
            }
            Self::Download(DownloadError::Io(_)) => FailureKind::Filesystem,
            Self::Download(_) => FailureKind::Network,
            Self::Archive(ArchiveError::Corrupt { .. }) => FailureKind::CorruptArchive,
            Self::Archive(ArchiveError::ExtractionFailed { .. } | ArchiveError::PathTraversal { .. }) => {
                FailureKind::ExtractionFailed
            }
            Self::Archive(ArchiveError::Io(_)) | Self::Removal(_) | Self::Io(_) => {
                FailureKind::Filesystem
            }
            Self::StageRejected { kind, .. } => *kind,
            Self::Busy { .. } => FailureKind::Busy,
            Self::Cancelled => FailureKind::Cancelled,
            Self::NotIdle { .. } | Self::InvalidTransition { .. } | Self::WorkerLost { .. } => {
                FailureKind::Internal
            }
        }
    }
}

/// Result type alias using [`UpdateError`].
pub type Result<T> = std::result::Result<T, UpdateError>;

/// Errors reported by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The configuration file is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Checking, installing or updating failed.
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// The installed release record could not be read or written.
    #[error(transparent)]
    Installed(#[from] InstalledError),

    /// Installed files could not be verified.
    #[error(transparent)]
    Filemap(#[from] FilemapError),

    /// Neither the command line nor the configuration names an
    /// installation root and the platform offers no default.
    #[error("could not determine an installation root; pass --install-root")]
    NoInstallRoot,

    /// The command needs the installed version but none is recorded.
    #[error("installed KeeperFX version is unknown; pass --current")]
    UnknownInstalledVersion,

    /// Writing command output failed.
    #[error("failed to write output")]
    WriteFailed {
        /// The underlying write error.
        #[source]
        source: std::io::Error,
    },
}

impl From<FetchError> for CommandError {
    fn from(error: FetchError) -> Self {
        Self::Update(UpdateError::Fetch(error))
    }
}
