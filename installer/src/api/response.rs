//! Parsing and validation of release API responses.
//!
//! Parsing never panics: malformed JSON, missing objects, and responses
//! that echo back a different channel or version all produce
//! [`FetchError::InvalidResponse`].

use super::error::FetchError;
use crate::version::{ReleaseChannel, VersionInfo};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Relative path → checksum map for one release.
pub type FileManifest = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct ReleaseBody {
    #[serde(default)]
    version: String,
    #[serde(default)]
    download_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestReleaseBody {
    release: Option<ReleaseBody>,
    alpha_build: Option<ReleaseBody>,
}

#[derive(Debug, Deserialize)]
struct FileListBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    release_type: String,
    #[serde(default)]
    version: String,
    files: Option<BTreeMap<String, serde_json::Value>>,
}

/// Parse a `v1/release/{channel}/latest` response.
///
/// Stable releases live under `release`, alpha builds under `alpha_build`.
///
/// # Errors
///
/// Returns [`FetchError::UnsupportedChannel`] for channels the API does not
/// serve and [`FetchError::InvalidResponse`] when the expected object is
/// missing or the JSON is malformed.
///
/// # Examples
///
/// ```
/// use kfx_installer::api::response::parse_latest_release;
/// use kfx_installer::version::ReleaseChannel;
///
/// let json = r#"{"release":{"version":"1.2.0","download_url":"https://example.test/kfx-1.2.0.7z"}}"#;
/// let info = parse_latest_release(json, ReleaseChannel::Stable, "latest").expect("valid");
/// assert_eq!(info.version(), "1.2.0");
/// ```
pub fn parse_latest_release(
    json: &str,
    channel: ReleaseChannel,
    url: &str,
) -> Result<VersionInfo, FetchError> {
    let invalid = |reason: String| FetchError::InvalidResponse {
        url: url.to_owned(),
        reason,
    };

    let body: LatestReleaseBody =
        serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;

    let (release, full_string_suffix) = match channel {
        ReleaseChannel::Stable => (body.release, ""),
        ReleaseChannel::Alpha => (body.alpha_build, " Alpha"),
        ReleaseChannel::Unknown | ReleaseChannel::Prototype => {
            return Err(FetchError::UnsupportedChannel { channel });
        }
    };
    let release = release.ok_or_else(|| invalid(format!("missing {channel} release object")))?;
    if release.version.is_empty() {
        return Err(invalid("release has no version".to_owned()));
    }

    let full_string = format!("{}{full_string_suffix}", release.version);
    Ok(VersionInfo::new(
        channel,
        release.version,
        full_string,
        release.download_url,
    ))
}

/// Parse a `v1/release/{channel}/{version}/files` response.
///
/// Non-string checksum values become empty strings.
///
/// # Errors
///
/// Returns [`FetchError::InvalidResponse`] unless `success` is true, the
/// echoed `release_type` and `version` match the request, and a `files`
/// object is present.
pub fn parse_file_manifest(
    json: &str,
    channel: ReleaseChannel,
    version: &str,
    url: &str,
) -> Result<FileManifest, FetchError> {
    let invalid = |reason: String| FetchError::InvalidResponse {
        url: url.to_owned(),
        reason,
    };
    let channel_name = channel
        .api_name()
        .ok_or(FetchError::UnsupportedChannel { channel })?;

    let body: FileListBody = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;

    if !body.success {
        return Err(invalid("success flag not set".to_owned()));
    }
    if body.release_type != channel_name {
        return Err(invalid(format!(
            "release type {:?} does not match {channel_name:?}",
            body.release_type
        )));
    }
    if body.version != version {
        return Err(invalid(format!(
            "version {:?} does not match {version:?}",
            body.version
        )));
    }
    let files = body
        .files
        .ok_or_else(|| invalid("missing files object".to_owned()))?;

    Ok(files
        .into_iter()
        .map(|(path, checksum)| {
            let checksum = checksum.as_str().unwrap_or_default().to_owned();
            (path, checksum)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "https://api.example.test/v1/release";

    fn files_json() -> String {
        concat!(
            r#"{"success":true,"release_type":"stable","version":"1.2.0","#,
            r#""files":{"/keeperfx.exe":"1a2b3c","/data/creature.cfg":"00ff"}}"#,
        )
        .to_owned()
    }

    #[test]
    fn parses_latest_stable() {
        let json = r#"{"release":{"version":"1.2.0","download_url":"https://example.test/a.7z"}}"#;
        let info = parse_latest_release(json, ReleaseChannel::Stable, URL).expect("valid");
        assert_eq!(info.channel(), ReleaseChannel::Stable);
        assert_eq!(info.version(), "1.2.0");
        assert_eq!(info.full_string(), "1.2.0");
        assert_eq!(info.download_url(), "https://example.test/a.7z");
    }

    #[test]
    fn parses_latest_alpha_from_alpha_build_object() {
        let json =
            r#"{"alpha_build":{"version":"1.2.0.4500","download_url":"https://example.test/b.7z"}}"#;
        let info = parse_latest_release(json, ReleaseChannel::Alpha, URL).expect("valid");
        assert_eq!(info.channel(), ReleaseChannel::Alpha);
        assert_eq!(info.full_string(), "1.2.0.4500 Alpha");
    }

    #[rstest]
    #[case::not_json("{not json")]
    #[case::array("[]")]
    #[case::wrong_object(r#"{"alpha_build":{"version":"1.0.0","download_url":""}}"#)]
    #[case::empty_version(r#"{"release":{"version":"","download_url":"x"}}"#)]
    fn rejects_invalid_latest_responses(#[case] json: &str) {
        let result = parse_latest_release(json, ReleaseChannel::Stable, URL);
        assert!(
            matches!(result, Err(FetchError::InvalidResponse { .. })),
            "unexpected result: {result:?}"
        );
    }

    #[test]
    fn rejects_prototype_channel() {
        let result = parse_latest_release("{}", ReleaseChannel::Prototype, URL);
        assert!(matches!(
            result,
            Err(FetchError::UnsupportedChannel {
                channel: ReleaseChannel::Prototype
            })
        ));
    }

    #[test]
    fn parses_file_manifest() {
        let files =
            parse_file_manifest(&files_json(), ReleaseChannel::Stable, "1.2.0", URL).expect("valid");
        assert_eq!(files.len(), 2);
        assert_eq!(files.get("/keeperfx.exe").map(String::as_str), Some("1a2b3c"));
    }

    #[rstest]
    #[case::wrong_version("1.2.1", ReleaseChannel::Stable)]
    #[case::wrong_channel("1.2.0", ReleaseChannel::Alpha)]
    fn rejects_mismatched_echo(#[case] version: &str, #[case] channel: ReleaseChannel) {
        let result = parse_file_manifest(&files_json(), channel, version, URL);
        assert!(matches!(result, Err(FetchError::InvalidResponse { .. })));
    }

    #[rstest]
    #[case::no_success(r#"{"release_type":"stable","version":"1.2.0","files":{}}"#)]
    #[case::no_files(r#"{"success":true,"release_type":"stable","version":"1.2.0"}"#)]
    #[case::files_not_object(
        r#"{"success":true,"release_type":"stable","version":"1.2.0","files":[]}"#
    )]
    fn rejects_incomplete_file_lists(#[case] json: &str) {
        let result = parse_file_manifest(json, ReleaseChannel::Stable, "1.2.0", URL);
        assert!(result.is_err());
    }

    #[test]
    fn non_string_checksums_become_empty() {
        let json = r#"{"success":true,"release_type":"alpha","version":"1.0.0.1","files":{"a":5}}"#;
        let files =
            parse_file_manifest(json, ReleaseChannel::Alpha, "1.0.0.1", URL).expect("valid");
        assert_eq!(files.get("a").map(String::as_str), Some(""));
    }
}
