//! Release metadata fetching over HTTP.
//!
//! Provides a trait-based abstraction over the release API so the update
//! pipeline can be exercised without network access.

use super::error::FetchError;
use super::response::{FileManifest, parse_file_manifest, parse_latest_release};
use crate::version::{ReleaseChannel, VersionInfo};
use log::{debug, warn};
use std::time::Duration;

/// The public KeeperFX API.
pub const DEFAULT_API_ENDPOINT: &str = "https://keeperfx.net/api";

/// Trait for fetching release metadata.
///
/// # Examples
///
/// ```
/// use kfx_installer::api::HttpManifestFetcher;
/// use std::time::Duration;
///
/// let fetcher = HttpManifestFetcher::new("https://keeperfx.net/api", Duration::from_secs(30));
/// assert_eq!(
///     fetcher.endpoint_url("/api/v1/release/stable/latest"),
///     "https://keeperfx.net/api/v1/release/stable/latest"
/// );
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ManifestFetcher {
    /// Fetch the latest release of `channel`, including its download URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the channel is not served, or
    /// the response does not match the expected schema.
    fn latest_release(&self, channel: ReleaseChannel) -> Result<VersionInfo, FetchError>;

    /// Fetch the path→checksum map for `version` on `channel`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not echo
    /// back the requested channel and version.
    fn file_manifest(
        &self,
        channel: ReleaseChannel,
        version: &str,
    ) -> Result<FileManifest, FetchError>;
}

/// [`ManifestFetcher`] backed by a blocking `ureq` agent.
pub struct HttpManifestFetcher {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpManifestFetcher {
    /// Create a fetcher for the API rooted at `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Build the absolute URL for an API path.
    ///
    /// A leading `/api` and leading slashes are stripped so both
    /// `v1/release/...` and `/api/v1/release/...` resolve the same way.
    #[must_use]
    pub fn endpoint_url(&self, path: &str) -> String {
        let path = path.strip_prefix("/api").unwrap_or(path);
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.endpoint)
    }

    fn get_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .header("Content-Type", "application/json")
            .call()
            .map_err(|e| {
                warn!("request to {url} failed: {e}");
                map_ureq_error(url, &e)
            })?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

impl ManifestFetcher for HttpManifestFetcher {
    fn latest_release(&self, channel: ReleaseChannel) -> Result<VersionInfo, FetchError> {
        let name = channel
            .api_name()
            .ok_or(FetchError::UnsupportedChannel { channel })?;
        let url = self.endpoint_url(&format!("v1/release/{name}/latest"));
        let body = self.get_text(&url)?;
        let info = parse_latest_release(&body, channel, &url)?;
        debug!("{channel} download URL: {}", info.download_url());
        Ok(info)
    }

    fn file_manifest(
        &self,
        channel: ReleaseChannel,
        version: &str,
    ) -> Result<FileManifest, FetchError> {
        let name = channel
            .api_name()
            .ok_or(FetchError::UnsupportedChannel { channel })?;
        let url = self.endpoint_url(&format!("v1/release/{name}/{version}/files"));
        let body = self.get_text(&url)?;
        parse_file_manifest(&body, channel, version, &url)
    }
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
