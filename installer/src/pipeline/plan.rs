//! Turning an install or update request into archives to apply.

use crate::api::ManifestFetcher;
use crate::error::{Result, UpdateError};
use crate::version::{ReleaseChannel, VersionInfo, is_higher_or_equal, is_newer};
use log::{debug, info};

/// What the caller wants the pipeline to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateRequest {
    /// Install the latest release of a channel from scratch.
    Install {
        /// Channel to install.
        channel: ReleaseChannel,
    },
    /// Update an existing installation to `target`.
    Update {
        /// The release currently installed.
        installed: VersionInfo,
        /// The release to move to. An empty download URL is resolved by
        /// fetching the latest release of the target's channel.
        target: VersionInfo,
    },
}

/// One archive to download, test and extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseStep {
    version: VersionInfo,
}

impl ReleaseStep {
    /// Wrap a release that has a download URL.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::MissingDownloadUrl`] when the URL is empty.
    pub fn new(version: VersionInfo) -> Result<Self> {
        if version.download_url().trim().is_empty() {
            return Err(UpdateError::MissingDownloadUrl {
                version: version.to_string(),
            });
        }
        Ok(Self { version })
    }

    /// The release this step installs.
    #[must_use]
    pub fn version(&self) -> &VersionInfo {
        &self.version
    }

    /// The archive URL.
    #[must_use]
    pub fn download_url(&self) -> &str {
        self.version.download_url()
    }
}

/// Resolve `request` into an ordered, non-empty list of steps.
///
/// Alpha builds are patches over a stable base, so installing the alpha
/// channel applies the latest stable release first. An alpha update does
/// the same when the installation predates the latest stable release and
/// the target alpha builds on it.
///
/// # Errors
///
/// Returns [`UpdateError::UnsupportedChannel`] for channels the release
/// API does not serve, fetch errors unchanged, and
/// [`UpdateError::MissingDownloadUrl`] for a release without an archive.
pub fn resolve_plan(
    fetcher: &dyn ManifestFetcher,
    request: &UpdateRequest,
) -> Result<Vec<ReleaseStep>> {
    let releases = match request {
        UpdateRequest::Install {
            channel: ReleaseChannel::Stable,
        } => vec![fetcher.latest_release(ReleaseChannel::Stable)?],
        UpdateRequest::Install {
            channel: ReleaseChannel::Alpha,
        } => vec![
            fetcher.latest_release(ReleaseChannel::Stable)?,
            fetcher.latest_release(ReleaseChannel::Alpha)?,
        ],
        UpdateRequest::Install { channel } => {
            return Err(UpdateError::UnsupportedChannel { channel: *channel });
        }
        UpdateRequest::Update { installed, target } => {
            let channel = target.channel();
            if channel.api_name().is_none() {
                return Err(UpdateError::UnsupportedChannel { channel });
            }
            let target = if target.download_url().trim().is_empty() {
                debug!("{target} has no download URL, fetching latest {channel} release");
                fetcher.latest_release(channel)?
            } else {
                target.clone()
            };
            if channel == ReleaseChannel::Alpha {
                alpha_update_releases(fetcher, installed, target)?
            } else {
                vec![target]
            }
        }
    };
    releases.into_iter().map(ReleaseStep::new).collect()
}

/// Releases to apply for an alpha update, prefixed with the latest stable
/// release when the installation is older than the stable base the alpha
/// was built on.
fn alpha_update_releases(
    fetcher: &dyn ManifestFetcher,
    installed: &VersionInfo,
    target: VersionInfo,
) -> Result<Vec<VersionInfo>> {
    let stable = fetcher.latest_release(ReleaseChannel::Stable)?;
    let behind_stable = !is_higher_or_equal(installed.version(), stable.version());
    if behind_stable && is_newer(target.version(), stable.version()) {
        info!("applying stable {stable} before alpha {target}");
        Ok(vec![stable, target])
    } else {
        Ok(vec![target])
    }
}
