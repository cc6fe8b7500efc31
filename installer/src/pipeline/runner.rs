//! The update pipeline driver.
//!
//! Long-running stages run on worker threads. Each worker streams progress
//! and then exactly one result back over a channel; the controlling thread
//! forwards progress to the observer and feeds results into the state
//! machine.

use super::cancel::CancellationToken;
use super::event::PipelineEvent;
use super::observer::{PipelineObserver, Progress};
use super::plan::{ReleaseStep, UpdateRequest, resolve_plan};
use super::state::PipelineState;
use crate::api::ManifestFetcher;
use crate::archive::ArchiveEngine;
use crate::download::Downloader;
use crate::error::{FailureKind, Result, UpdateError};
use crate::lock::InstallLock;
use crate::removal;
use crate::version::VersionInfo;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

/// Per-installation settings handed to the pipeline at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineContext {
    /// Directory archives are extracted into.
    pub install_root: PathBuf,
    /// Removal manifest to reconcile after the final step. `None` skips
    /// the removal stage.
    pub removal_manifest: Option<PathBuf>,
}

impl PipelineContext {
    /// Context for `install_root` with removal disabled.
    #[must_use]
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            removal_manifest: None,
        }
    }

    /// Enable the removal stage using `manifest`.
    #[must_use]
    pub fn with_removal_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.removal_manifest = Some(manifest.into());
        self
    }

    /// Temporary file an archive from `url` is downloaded to.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::pipeline::PipelineContext;
    /// use std::path::Path;
    ///
    /// let context = PipelineContext::new("/games/keeperfx");
    /// assert_eq!(
    ///     context.temp_archive_path("https://e.test/files/keeperfx_1_2_0.7z?dl=1"),
    ///     Path::new("/games/keeperfx").join("keeperfx_1_2_0.7z.tmp")
    /// );
    /// ```
    #[must_use]
    pub fn temp_archive_path(&self, url: &str) -> PathBuf {
        let without_query = url.split(['?', '#']).next().unwrap_or(url);
        let file_name = without_query
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("release.7z");
        self.install_root.join(format!("{file_name}.tmp"))
    }
}

/// Installs or updates KeeperFX by downloading, testing and extracting
/// release archives.
///
/// # Examples
///
/// ```no_run
/// use kfx_installer::api::HttpManifestFetcher;
/// use kfx_installer::archive::SevenZipEngine;
/// use kfx_installer::download::HttpDownloader;
/// use kfx_installer::pipeline::{PipelineContext, PipelineObserver, UpdatePipeline, UpdateRequest};
/// use kfx_installer::version::ReleaseChannel;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct Quiet;
/// impl PipelineObserver for Quiet {}
///
/// let mut pipeline = UpdatePipeline::new(
///     PipelineContext::new("/games/keeperfx"),
///     Box::new(HttpManifestFetcher::new("https://keeperfx.net/api", Duration::from_secs(30))),
///     Arc::new(HttpDownloader::default()),
///     Arc::new(SevenZipEngine::new()),
/// );
/// let installed = pipeline
///     .run(&UpdateRequest::Install { channel: ReleaseChannel::Stable }, &mut Quiet)
///     .expect("install");
/// println!("installed {installed}");
/// ```
pub struct UpdatePipeline {
    context: PipelineContext,
    fetcher: Box<dyn ManifestFetcher>,
    downloader: Arc<dyn Downloader>,
    archive: Arc<dyn ArchiveEngine>,
    state: PipelineState,
    cancel: CancellationToken,
}

impl UpdatePipeline {
    /// Create an idle pipeline.
    #[must_use]
    pub fn new(
        context: PipelineContext,
        fetcher: Box<dyn ManifestFetcher>,
        downloader: Arc<dyn Downloader>,
        archive: Arc<dyn ArchiveEngine>,
    ) -> Self {
        Self {
            context,
            fetcher,
            downloader,
            archive,
            state: PipelineState::Idle,
            cancel: CancellationToken::new(),
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// The settings the pipeline was created with.
    #[must_use]
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// A token that cancels the current or next run when triggered.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Return to `Idle` after a run finished or failed, clearing any
    /// pending cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidTransition`] while a run is active.
    pub fn restart(&mut self) -> Result<()> {
        if self.state.is_active() {
            return Err(UpdateError::InvalidTransition {
                state: self.state.to_string(),
                event: "restart",
            });
        }
        self.state = PipelineState::Idle;
        self.cancel.reset();
        Ok(())
    }

    /// Execute `request` to completion, returning the release now
    /// installed.
    ///
    /// The installation root is locked for the whole run. Failures leave
    /// the pipeline in `Failed` until [`UpdatePipeline::restart`], and keep
    /// any partially downloaded or tested archive on disk.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::NotIdle`] unless the pipeline is idle,
    /// [`UpdateError::Busy`] when another run holds the installation (the
    /// pipeline stays idle), and the error of the first failing stage
    /// otherwise.
    pub fn run(
        &mut self,
        request: &UpdateRequest,
        observer: &mut dyn PipelineObserver,
    ) -> Result<VersionInfo> {
        if self.state != PipelineState::Idle {
            return Err(UpdateError::NotIdle {
                state: self.state.to_string(),
            });
        }
        let _lock = InstallLock::acquire(&self.context.install_root)?;
        self.apply(&PipelineEvent::Start, observer)?;

        let result = self.execute(request, observer);
        if let Err(error) = &result {
            self.fail(error, observer);
        }
        result
    }

    fn execute(
        &mut self,
        request: &UpdateRequest,
        observer: &mut dyn PipelineObserver,
    ) -> Result<VersionInfo> {
        observer.on_message("Fetching release information");
        let steps = resolve_plan(self.fetcher.as_ref(), request)?;
        if let UpdateRequest::Update { target, .. } = request {
            self.log_file_manifest(target);
        }
        self.check_cancelled()?;

        let mut installed = None;
        for (index, step) in steps.iter().enumerate() {
            let download_url = step.download_url().to_owned();
            let event = if index == 0 {
                PipelineEvent::ManifestResolved { download_url }
            } else {
                PipelineEvent::NextStep { download_url }
            };
            self.apply(&event, observer)?;

            let archive_path = self.context.temp_archive_path(step.download_url());
            if let Err(error) = self.apply_step(step, &archive_path, observer) {
                if archive_path.exists() {
                    info!("keeping {} for inspection", archive_path.display());
                }
                return Err(error);
            }

            discard_archive(&archive_path);
            installed = Some(step.version().clone());
        }

        let installed = installed.ok_or(UpdateError::MissingDownloadUrl {
            version: "empty release plan".to_owned(),
        })?;
        self.reconcile_removals(&installed, observer)?;
        self.apply(&PipelineEvent::CleanupFinished, observer)?;
        observer.on_message(&format!("KeeperFX {installed} installed"));
        info!(
            "installed {installed} into {}",
            self.context.install_root.display()
        );
        Ok(installed)
    }

    /// Download, test and extract one archive, leaving the pipeline in
    /// `CleaningUp`.
    fn apply_step(
        &mut self,
        step: &ReleaseStep,
        archive_path: &Path,
        observer: &mut dyn PipelineObserver,
    ) -> Result<()> {
        observer.on_message(&format!("Downloading {}", step.version()));
        let downloader = Arc::clone(&self.downloader);
        let url = step.download_url().to_owned();
        let dest = archive_path.to_path_buf();
        let cancel = self.cancel.clone();
        let bytes = on_worker("download", observer, move |report| {
            downloader.download(
                &url,
                &dest,
                &mut |received, total| report(Progress::Download { received, total }),
                &cancel,
            )
        })??;
        self.check_cancelled()?;
        self.apply(&PipelineEvent::DownloadFinished { bytes }, observer)?;

        observer.on_message("Testing archive");
        let archive = Arc::clone(&self.archive);
        let source = archive_path.to_path_buf();
        let size = on_worker("test", observer, move |_| archive.test_and_get_size(&source))??;
        self.check_cancelled()?;
        self.apply(&PipelineEvent::ArchiveTested { size }, observer)?;

        observer.on_message("Extracting files");
        let archive = Arc::clone(&self.archive);
        let source = archive_path.to_path_buf();
        let dest = self.context.install_root.clone();
        let cancel = self.cancel.clone();
        let bytes = on_worker("extract", observer, move |report| {
            archive.extract(
                &source,
                &dest,
                &mut |processed| {
                    report(Progress::Extract {
                        processed,
                        total: size,
                    });
                },
                &cancel,
            )
        })??;
        self.check_cancelled()?;
        self.apply(&PipelineEvent::ExtractFinished { bytes }, observer)
    }

    fn reconcile_removals(
        &self,
        installed: &VersionInfo,
        observer: &mut dyn PipelineObserver,
    ) -> Result<()> {
        let Some(manifest) = &self.context.removal_manifest else {
            return Ok(());
        };
        let root = &self.context.install_root;
        let files = removal::resolve(root, manifest, installed.version());
        if files.is_empty() {
            debug!("no obsolete files to remove");
            return Ok(());
        }
        let listed: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        if observer.confirm_removal(&listed) {
            let removed = removal::remove_files(root, &files)?;
            observer.on_message(&format!("Removed {removed} obsolete file(s)"));
        } else {
            info!("keeping {} obsolete file(s)", listed.len());
        }
        Ok(())
    }

    fn log_file_manifest(&self, target: &VersionInfo) {
        match self
            .fetcher
            .file_manifest(target.channel(), target.version())
        {
            Ok(files) => info!("{target} lists {} files", files.len()),
            Err(e) => warn!("file list for {target} unavailable: {e}"),
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(UpdateError::Cancelled);
        }
        Ok(())
    }

    fn apply(&mut self, event: &PipelineEvent, observer: &mut dyn PipelineObserver) -> Result<()> {
        let next = self.state.on(event)?;
        debug!("{} -> {next} on {}", self.state, event.name());
        self.state = next;
        observer.on_state(&self.state);
        if let PipelineState::Failed { kind, reason } = &self.state {
            return Err(UpdateError::StageRejected {
                kind: *kind,
                reason: reason.clone(),
            });
        }
        Ok(())
    }

    fn fail(&mut self, error: &UpdateError, observer: &mut dyn PipelineObserver) {
        if self.state.is_terminal() {
            return;
        }
        let kind = if self.cancel.is_cancelled() {
            FailureKind::Cancelled
        } else {
            error.kind()
        };
        let event = PipelineEvent::Failed {
            kind,
            reason: error.to_string(),
        };
        let next = self.state.on(&event).unwrap_or(PipelineState::Failed {
            kind,
            reason: error.to_string(),
        });
        warn!("update failed in state {}: {error}", self.state);
        self.state = next;
        observer.on_state(&self.state);
    }
}

enum WorkerMessage<T> {
    Progress(Progress),
    Finished(T),
}

/// Run `work` on a worker thread, forwarding its progress reports to
/// `observer` until it posts its result.
fn on_worker<T, F>(operation: &'static str, observer: &mut dyn PipelineObserver, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn Fn(Progress)) -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    let progress_sender = sender.clone();
    let handle = thread::Builder::new()
        .name(format!("kfx-{operation}"))
        .spawn(move || {
            let report = |progress: Progress| {
                // The receiver only disappears once the result is in.
                let _ = progress_sender.send(WorkerMessage::Progress(progress));
            };
            let result = work(&report);
            let _ = sender.send(WorkerMessage::Finished(result));
        })?;

    let mut outcome = None;
    for message in receiver {
        match message {
            WorkerMessage::Progress(progress) => observer.on_progress(&progress),
            WorkerMessage::Finished(result) => outcome = Some(result),
        }
    }
    if handle.join().is_err() {
        warn!("{operation} worker panicked");
    }
    outcome.ok_or(UpdateError::WorkerLost { operation })
}

fn discard_archive(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove {}: {e}", path.display()),
    }
}
