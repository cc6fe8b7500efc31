//! Shared test utilities for the installer crate.
//!
//! Scripted collaborators let the update pipeline run end to end without
//! network access or real archives. Each fake records how it was called so
//! tests can assert on ordering.

use crate::api::{FetchError, FileManifest, ManifestFetcher};
use crate::archive::{ArchiveEngine, ArchiveError};
use crate::download::{DownloadError, Downloader};
use crate::pipeline::{CancellationToken, PipelineObserver, PipelineState, Progress};
use crate::version::{ReleaseChannel, VersionInfo};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Build release metadata with a download URL.
pub fn release(channel: ReleaseChannel, version: &str, url: &str) -> VersionInfo {
    let full_string = match channel {
        ReleaseChannel::Alpha => format!("{version} Alpha"),
        _ => version.to_owned(),
    };
    VersionInfo::new(channel, version, full_string, url)
}

/// A [`ManifestFetcher`] answering from fixed data.
#[derive(Debug, Default)]
pub struct StaticManifestFetcher {
    stable: Option<VersionInfo>,
    alpha: Option<VersionInfo>,
    files: FileManifest,
    failure: Option<String>,
}

impl StaticManifestFetcher {
    /// A fetcher that knows no releases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `info` as the latest release of its channel.
    pub fn with_release(mut self, info: VersionInfo) -> Self {
        match info.channel() {
            ReleaseChannel::Stable => self.stable = Some(info),
            ReleaseChannel::Alpha => self.alpha = Some(info),
            ReleaseChannel::Unknown | ReleaseChannel::Prototype => {}
        }
        self
    }

    /// Serve `files` for every file-list request.
    pub fn with_files(mut self, files: FileManifest) -> Self {
        self.files = files;
        self
    }

    /// Fail every request with an HTTP error carrying `reason`.
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_owned());
        self
    }

    fn check(&self, channel: ReleaseChannel, url: String) -> Result<(), FetchError> {
        if channel.api_name().is_none() {
            return Err(FetchError::UnsupportedChannel { channel });
        }
        match &self.failure {
            Some(reason) => Err(FetchError::Http {
                url,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl ManifestFetcher for StaticManifestFetcher {
    fn latest_release(&self, channel: ReleaseChannel) -> Result<VersionInfo, FetchError> {
        let url = format!("v1/release/{channel}/latest");
        self.check(channel, url.clone())?;
        let found = match channel {
            ReleaseChannel::Stable => self.stable.clone(),
            ReleaseChannel::Alpha => self.alpha.clone(),
            ReleaseChannel::Unknown | ReleaseChannel::Prototype => None,
        };
        found.ok_or(FetchError::NotFound { url })
    }

    fn file_manifest(
        &self,
        channel: ReleaseChannel,
        version: &str,
    ) -> Result<FileManifest, FetchError> {
        self.check(channel, format!("v1/release/{channel}/{version}/files"))?;
        Ok(self.files.clone())
    }
}

/// How a [`ScriptedDownloader`] behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadScript {
    /// Write the payload and succeed.
    Succeed,
    /// Answer 404 before writing anything.
    NotFound,
    /// Write the first chunk, then fail with an HTTP error.
    FailAfterFirstChunk(String),
    /// Cancel the run after the first chunk.
    CancelAfterFirstChunk,
}

/// A [`Downloader`] that writes a fixed payload in two chunks.
#[derive(Debug)]
pub struct ScriptedDownloader {
    payload: Vec<u8>,
    script: DownloadScript,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDownloader {
    /// Succeed with `payload`.
    pub fn succeeding(payload: &[u8]) -> Self {
        Self::scripted(payload, DownloadScript::Succeed)
    }

    /// Behave according to `script`.
    pub fn scripted(payload: &[u8], script: DownloadScript) -> Self {
        Self {
            payload: payload.to_vec(),
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Downloader for ScriptedDownloader {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn FnMut(u64, Option<u64>),
        cancel: &CancellationToken,
    ) -> Result<u64, DownloadError> {
        let mut file = File::create(dest)?;
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(url.to_owned());
        if self.script == DownloadScript::NotFound {
            return Err(DownloadError::NotFound {
                url: url.to_owned(),
            });
        }

        let total = self.payload.len() as u64;
        let middle = self.payload.len() / 2;
        let (first, second) = self.payload.split_at(middle);
        let mut received = 0;
        for (index, chunk) in [first, second].into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            file.write_all(chunk)?;
            received += chunk.len() as u64;
            progress(received, Some(total));
            if index == 0 {
                match &self.script {
                    DownloadScript::FailAfterFirstChunk(reason) => {
                        return Err(DownloadError::Http {
                            url: url.to_owned(),
                            reason: reason.clone(),
                        });
                    }
                    DownloadScript::CancelAfterFirstChunk => cancel.cancel(),
                    DownloadScript::Succeed | DownloadScript::NotFound => {}
                }
            }
        }
        Ok(received)
    }
}

/// A call made to a [`ScriptedArchiveEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveCall {
    /// `test_and_get_size`, noting whether the archive existed.
    Test {
        /// Archive path.
        archive: PathBuf,
        /// Whether the archive was on disk at the time.
        present: bool,
    },
    /// `extract`.
    Extract {
        /// Archive path.
        archive: PathBuf,
        /// Destination directory.
        dest: PathBuf,
    },
}

/// An [`ArchiveEngine`] that "extracts" a fixed set of files.
#[derive(Debug, Default)]
pub struct ScriptedArchiveEngine {
    files: Vec<(String, Vec<u8>)>,
    test_failure: Option<String>,
    extract_failure: Option<String>,
    calls: Mutex<Vec<ArchiveCall>>,
}

impl ScriptedArchiveEngine {
    /// Extract `files` (relative path, contents) on success.
    pub fn with_files(files: &[(&str, &[u8])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, contents)| ((*name).to_owned(), contents.to_vec()))
                .collect(),
            ..Self::default()
        }
    }

    /// Report the archive as corrupt.
    pub fn failing_test(mut self, reason: &str) -> Self {
        self.test_failure = Some(reason.to_owned());
        self
    }

    /// Fail after writing the first file.
    pub fn failing_extract(mut self, reason: &str) -> Self {
        self.extract_failure = Some(reason.to_owned());
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<ArchiveCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn size(&self) -> u64 {
        self.files.iter().map(|(_, c)| c.len() as u64).sum()
    }

    fn tested(&self, archive: &Path) -> Result<u64, ArchiveError> {
        match &self.test_failure {
            Some(reason) => Err(ArchiveError::Corrupt {
                reason: reason.clone(),
            }),
            None if archive.exists() => Ok(self.size()),
            None => Err(ArchiveError::Io(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            ))),
        }
    }
}

impl ArchiveEngine for ScriptedArchiveEngine {
    fn test_and_get_size(&self, archive: &Path) -> Result<u64, ArchiveError> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(ArchiveCall::Test {
            archive: archive.to_path_buf(),
            present: archive.exists(),
        });
        self.tested(archive)
    }

    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn FnMut(u64),
        cancel: &CancellationToken,
    ) -> Result<u64, ArchiveError> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(ArchiveCall::Extract {
            archive: archive.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        self.tested(archive)?;

        let mut processed = 0;
        for (index, (name, contents)) in self.files.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ArchiveError::Cancelled);
            }
            if let Some(reason) = self.extract_failure.as_ref().filter(|_| index > 0) {
                return Err(ArchiveError::ExtractionFailed {
                    reason: reason.clone(),
                });
            }
            let target = dest.join(name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, contents)?;
            processed += contents.len() as u64;
            progress(processed);
        }
        if let Some(reason) = &self.extract_failure {
            return Err(ArchiveError::ExtractionFailed {
                reason: reason.clone(),
            });
        }
        Ok(processed)
    }
}

/// A [`PipelineObserver`] that records everything it is told.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// States entered, in order.
    pub states: Vec<PipelineState>,
    /// Progress reports, in order.
    pub progress: Vec<Progress>,
    /// Status messages, in order.
    pub messages: Vec<String>,
    /// File lists offered for removal.
    pub removal_offers: Vec<Vec<String>>,
    /// Answer given to removal prompts.
    pub confirm_removals: bool,
}

impl RecordingObserver {
    /// An observer that accepts removal prompts.
    pub fn confirming() -> Self {
        Self {
            confirm_removals: true,
            ..Self::default()
        }
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_state(&mut self, state: &PipelineState) {
        self.states.push(state.clone());
    }

    fn on_progress(&mut self, progress: &Progress) {
        self.progress.push(*progress);
    }

    fn on_message(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }

    fn confirm_removal(&mut self, files: &[String]) -> bool {
        self.removal_offers.push(files.to_vec());
        self.confirm_removals
    }
}
