//! Deciding whether a newer release is available.

use crate::api::{FetchError, ManifestFetcher};
use crate::version::{ReleaseChannel, VersionInfo, is_newer};
use log::info;

/// Return the latest release of `channel` when it should replace
/// `installed`.
///
/// An update exists when the installed build is on a different channel
/// (switching channels always reinstalls) or the latest version is newer.
///
/// # Errors
///
/// Propagates fetch failures unchanged.
pub fn check_for_update(
    fetcher: &dyn ManifestFetcher,
    installed: &VersionInfo,
    channel: ReleaseChannel,
) -> Result<Option<VersionInfo>, FetchError> {
    let latest = fetcher.latest_release(channel)?;
    if installed.channel() != latest.channel() || is_newer(latest.version(), installed.version()) {
        info!("update available: {installed} -> {latest}");
        return Ok(Some(latest));
    }
    info!("{installed} is up to date");
    Ok(None)
}
