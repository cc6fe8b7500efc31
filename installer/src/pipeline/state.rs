//! Pipeline states and the transition function.

use super::event::PipelineEvent;
use crate::error::{FailureKind, UpdateError};
use std::fmt;

/// Where a pipeline run currently stands.
///
/// A run moves `Idle → FetchingManifest → Downloading → TestingArchive →
/// Extracting → CleaningUp → Done`, looping from `CleaningUp` back to
/// `Downloading` for chained releases. Any active state may move to
/// `Failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PipelineState {
    /// Ready to start a run.
    #[default]
    Idle,
    /// Resolving which archives to install.
    FetchingManifest,
    /// Downloading an archive to the temporary file.
    Downloading,
    /// Testing the downloaded archive.
    TestingArchive,
    /// Extracting the archive into the installation.
    Extracting,
    /// Removing the temporary archive and obsolete files.
    CleaningUp,
    /// The run completed.
    Done,
    /// The run stopped. Only `restart` leaves this state.
    Failed {
        /// Classification of the failure.
        kind: FailureKind,
        /// Human-readable reason, never empty.
        reason: String,
    },
}

impl PipelineState {
    /// Compute the state that follows `event`.
    ///
    /// This is a pure function; the pipeline applies the returned state.
    /// An empty download URL on `ManifestResolved` or `NextStep` leads to
    /// `Failed` rather than `Downloading`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidTransition`] when the state does not
    /// accept the event.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::pipeline::{PipelineEvent, PipelineState};
    ///
    /// let next = PipelineState::Idle.on(&PipelineEvent::Start).expect("valid");
    /// assert_eq!(next, PipelineState::FetchingManifest);
    /// assert!(PipelineState::Idle.on(&PipelineEvent::CleanupFinished).is_err());
    /// ```
    pub fn on(&self, event: &PipelineEvent) -> Result<Self, UpdateError> {
        use PipelineEvent as E;

        let next = match (self, event) {
            (Self::Idle, E::Start) => Self::FetchingManifest,
            (Self::FetchingManifest, E::ManifestResolved { download_url })
            | (Self::CleaningUp, E::NextStep { download_url }) => {
                if download_url.trim().is_empty() {
                    Self::Failed {
                        kind: FailureKind::ManifestParse,
                        reason: "release has no download URL".to_owned(),
                    }
                } else {
                    Self::Downloading
                }
            }
            (Self::Downloading, E::DownloadFinished { .. }) => Self::TestingArchive,
            (Self::TestingArchive, E::ArchiveTested { .. }) => Self::Extracting,
            (Self::Extracting, E::ExtractFinished { .. }) => Self::CleaningUp,
            (Self::CleaningUp, E::CleanupFinished) => Self::Done,
            (state, E::Failed { kind, reason }) if state.is_active() => Self::Failed {
                kind: *kind,
                reason: if reason.is_empty() {
                    kind.to_string()
                } else {
                    reason.clone()
                },
            },
            (state, event) => {
                return Err(UpdateError::InvalidTransition {
                    state: state.to_string(),
                    event: event.name(),
                });
            }
        };
        Ok(next)
    }

    /// Return true while a run is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done | Self::Failed { .. })
    }

    /// Return true for `Done` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::FetchingManifest => f.write_str("fetching manifest"),
            Self::Downloading => f.write_str("downloading"),
            Self::TestingArchive => f.write_str("testing archive"),
            Self::Extracting => f.write_str("extracting"),
            Self::CleaningUp => f.write_str("cleaning up"),
            Self::Done => f.write_str("done"),
            Self::Failed { kind, reason } => write!(f, "failed ({kind}): {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolved(url: &str) -> PipelineEvent {
        PipelineEvent::ManifestResolved {
            download_url: url.to_owned(),
        }
    }

    fn failed() -> PipelineEvent {
        PipelineEvent::Failed {
            kind: FailureKind::Network,
            reason: "connection reset".to_owned(),
        }
    }

    #[test]
    fn happy_path_reaches_done() {
        let events = [
            PipelineEvent::Start,
            resolved("https://example.test/kfx.7z"),
            PipelineEvent::DownloadFinished { bytes: 10 },
            PipelineEvent::ArchiveTested { size: 20 },
            PipelineEvent::ExtractFinished { bytes: 20 },
            PipelineEvent::CleanupFinished,
        ];
        let mut state = PipelineState::Idle;
        for event in &events {
            state = state.on(event).expect("valid transition");
        }
        assert_eq!(state, PipelineState::Done);
    }

    #[test]
    fn chained_step_returns_to_downloading() {
        let next = PipelineState::CleaningUp
            .on(&PipelineEvent::NextStep {
                download_url: "https://example.test/alpha.7z".to_owned(),
            })
            .expect("valid");
        assert_eq!(next, PipelineState::Downloading);
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("  ")]
    fn empty_download_url_fails(#[case] url: &str) {
        let next = PipelineState::FetchingManifest
            .on(&resolved(url))
            .expect("valid");
        assert!(matches!(
            next,
            PipelineState::Failed {
                kind: FailureKind::ManifestParse,
                ..
            }
        ));
    }

    #[rstest]
    #[case::fetching(PipelineState::FetchingManifest)]
    #[case::downloading(PipelineState::Downloading)]
    #[case::testing(PipelineState::TestingArchive)]
    #[case::extracting(PipelineState::Extracting)]
    #[case::cleaning(PipelineState::CleaningUp)]
    fn active_states_accept_failure(#[case] state: PipelineState) {
        let next = state.on(&failed()).expect("valid");
        assert_eq!(
            next,
            PipelineState::Failed {
                kind: FailureKind::Network,
                reason: "connection reset".to_owned()
            }
        );
    }

    #[rstest]
    #[case::idle_failed(PipelineState::Idle, failed())]
    #[case::done_failed(PipelineState::Done, failed())]
    #[case::idle_download(PipelineState::Idle, PipelineEvent::DownloadFinished { bytes: 1 })]
    #[case::fetch_extract(PipelineState::FetchingManifest, PipelineEvent::ExtractFinished { bytes: 1 })]
    #[case::download_tested(PipelineState::Downloading, PipelineEvent::ArchiveTested { size: 1 })]
    #[case::testing_cleanup(PipelineState::TestingArchive, PipelineEvent::CleanupFinished)]
    #[case::done_start(PipelineState::Done, PipelineEvent::Start)]
    #[case::extracting_next(
        PipelineState::Extracting,
        PipelineEvent::NextStep { download_url: "u".to_owned() }
    )]
    fn rejects_invalid_transitions(#[case] state: PipelineState, #[case] event: PipelineEvent) {
        let result = state.on(&event);
        assert!(
            matches!(result, Err(UpdateError::InvalidTransition { .. })),
            "{state} accepted {}",
            event.name()
        );
    }

    #[test]
    fn failed_state_is_sticky() {
        let state = PipelineState::Failed {
            kind: FailureKind::Busy,
            reason: "locked".to_owned(),
        };
        assert!(state.on(&PipelineEvent::Start).is_err());
        assert!(state.is_terminal());
        assert!(!state.is_active());
    }

    #[test]
    fn empty_failure_reason_is_replaced() {
        let next = PipelineState::Downloading
            .on(&PipelineEvent::Failed {
                kind: FailureKind::CorruptArchive,
                reason: String::new(),
            })
            .expect("valid");
        assert_eq!(next.to_string(), "failed (corrupt archive): corrupt archive");
    }
}
