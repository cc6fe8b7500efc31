//! Parsed version metadata for an installed or downloadable game build.

use super::channel::ReleaseChannel;
use super::compare::is_higher_or_equal;
use super::functionality::Functionality;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Version metadata for one game build.
///
/// Values are immutable once built; a reload replaces the whole value.
/// An unparseable version string yields [`VersionInfo::unknown`], which is
/// distinct from a genuine `0.0.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInfo {
    channel: ReleaseChannel,
    version: String,
    full_string: String,
    download_url: String,
}

impl VersionInfo {
    /// Build version metadata from its parts.
    #[must_use]
    pub fn new(
        channel: ReleaseChannel,
        version: impl Into<String>,
        full_string: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            version: version.into(),
            full_string: full_string.into(),
            download_url: download_url.into(),
        }
    }

    /// The sentinel for a version string that could not be parsed.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Parse a product version string such as `1.2.3` or
    /// `1.2.3.4567 Alpha`.
    ///
    /// A bare `x.y.z[.w]` string is a stable release and is truncated to
    /// its first three components. Otherwise the channel is inferred from
    /// the words `alpha` or `prototype`. Strings without a version number
    /// produce [`VersionInfo::unknown`].
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::version::{ReleaseChannel, VersionInfo};
    ///
    /// let stable = VersionInfo::parse("1.2.0.4000");
    /// assert_eq!(stable.channel(), ReleaseChannel::Stable);
    /// assert_eq!(stable.version(), "1.2.0");
    ///
    /// let alpha = VersionInfo::parse("1.2.0.4412 Alpha");
    /// assert_eq!(alpha.channel(), ReleaseChannel::Alpha);
    /// assert_eq!(alpha.version(), "1.2.0.4412");
    ///
    /// assert!(VersionInfo::parse("garbage").is_unknown());
    /// ```
    #[must_use]
    pub fn parse(version_string: &str) -> Self {
        let Some(found) = version_pattern().and_then(|re| re.find(version_string)) else {
            log::debug!("no version number found in {version_string:?}");
            return Self::unknown();
        };
        let version = found.as_str();

        if version == version_string {
            let stable: Vec<&str> = version.split('.').take(3).collect();
            let stable = stable.join(".");
            return Self::new(ReleaseChannel::Stable, stable.clone(), stable, "");
        }

        let lowered = version_string.to_lowercase();
        let channel = if lowered.contains("alpha") {
            ReleaseChannel::Alpha
        } else if lowered.contains("prototype") {
            ReleaseChannel::Prototype
        } else {
            ReleaseChannel::Unknown
        };
        Self::new(channel, version, version_string, "")
    }

    /// Return a copy carrying the given download URL.
    #[must_use]
    pub fn with_download_url(mut self, download_url: impl Into<String>) -> Self {
        self.download_url = download_url.into();
        self
    }

    /// Return true for the unparseable-version sentinel.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.version.is_empty()
    }

    /// The release channel.
    #[must_use]
    pub fn channel(&self) -> ReleaseChannel {
        self.channel
    }

    /// The dotted numeric version (e.g. `1.2.3` or `1.2.3.4`).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The full version string as reported by its source.
    #[must_use]
    pub fn full_string(&self) -> &str {
        &self.full_string
    }

    /// The archive download URL, empty when not known.
    #[must_use]
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Human-readable version, suffixed with ` Alpha` for alpha builds.
    #[must_use]
    pub fn display_string(&self) -> String {
        match self.channel {
            ReleaseChannel::Alpha => format!("{} Alpha", self.version),
            _ => self.version.clone(),
        }
    }

    /// Return true when this build supports the given functionality.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::version::{Functionality, VersionInfo};
    ///
    /// let info = VersionInfo::parse("1.1.0");
    /// assert!(info.has_functionality(Functionality::DirectEnetConnect));
    /// assert!(!info.has_functionality(Functionality::EnetIpv6Support));
    /// ```
    #[must_use]
    pub fn has_functionality(&self, functionality: Functionality) -> bool {
        is_higher_or_equal(&self.version, functionality.minimum_version())
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("unknown version");
        }
        f.write_str(&self.display_string())
    }
}

fn version_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+(?:\.[0-9]+)?").ok())
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::stable_three("1.2.3", ReleaseChannel::Stable, "1.2.3")]
    #[case::stable_truncated("1.2.3.4000", ReleaseChannel::Stable, "1.2.3")]
    #[case::alpha("1.2.3.4412 Alpha", ReleaseChannel::Alpha, "1.2.3.4412")]
    #[case::alpha_lowercase("alpha 1.2.3.4412", ReleaseChannel::Alpha, "1.2.3.4412")]
    #[case::prototype("1.2.3.4412 Prototype", ReleaseChannel::Prototype, "1.2.3.4412")]
    #[case::other_suffix("1.2.3 custom", ReleaseChannel::Unknown, "1.2.3")]
    fn parses_version_strings(
        #[case] input: &str,
        #[case] channel: ReleaseChannel,
        #[case] version: &str,
    ) {
        let info = VersionInfo::parse(input);
        assert_eq!(info.channel(), channel);
        assert_eq!(info.version(), version);
        assert!(!info.is_unknown());
    }

    #[test]
    fn stable_full_string_is_truncated_version() {
        let info = VersionInfo::parse("1.2.3.4000");
        assert_eq!(info.full_string(), "1.2.3");
    }

    #[test]
    fn alpha_full_string_keeps_source_text() {
        let info = VersionInfo::parse("1.2.3.4412 Alpha");
        assert_eq!(info.full_string(), "1.2.3.4412 Alpha");
        assert_eq!(info.display_string(), "1.2.3.4412 Alpha");
    }

    #[rstest]
    #[case("")]
    #[case("garbage")]
    #[case("1.2")]
    fn unparseable_strings_are_unknown(#[case] input: &str) {
        let info = VersionInfo::parse(input);
        assert!(info.is_unknown());
        assert_eq!(info, VersionInfo::unknown());
        assert_eq!(info.to_string(), "unknown version");
    }

    #[test]
    fn zero_version_is_not_unknown() {
        let info = VersionInfo::parse("0.0.0");
        assert!(!info.is_unknown());
        assert_ne!(info, VersionInfo::unknown());
    }

    #[test]
    fn with_download_url_sets_url() {
        let info = VersionInfo::parse("1.2.3").with_download_url("https://example.test/a.7z");
        assert_eq!(info.download_url(), "https://example.test/a.7z");
    }
}
