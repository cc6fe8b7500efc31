//! Release channel of a game build.

use std::fmt;

/// Distribution track a game build belongs to.
///
/// # Examples
///
/// ```
/// use kfx_installer::version::ReleaseChannel;
///
/// assert_eq!(ReleaseChannel::from_name("Alpha"), ReleaseChannel::Alpha);
/// assert_eq!(ReleaseChannel::from_name("nightly"), ReleaseChannel::Unknown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReleaseChannel {
    /// The channel could not be determined.
    #[default]
    Unknown,
    /// Tagged stable releases.
    Stable,
    /// Alpha patches built on top of a stable release.
    Alpha,
    /// Prototype builds shared for testing.
    Prototype,
}

impl ReleaseChannel {
    /// Parse a channel name case-insensitively; unknown names map to
    /// [`ReleaseChannel::Unknown`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "stable" => Self::Stable,
            "alpha" => Self::Alpha,
            "prototype" => Self::Prototype,
            _ => Self::Unknown,
        }
    }

    /// Return the path segment the release API uses for this channel.
    ///
    /// Only stable and alpha builds are served by the API.
    #[must_use]
    pub const fn api_name(self) -> Option<&'static str> {
        match self {
            Self::Stable => Some("stable"),
            Self::Alpha => Some("alpha"),
            Self::Unknown | Self::Prototype => None,
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::Stable => "stable",
            Self::Alpha => "alpha",
            Self::Prototype => "prototype",
        };
        f.write_str(name)
    }
}
