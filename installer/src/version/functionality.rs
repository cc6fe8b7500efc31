//! Launcher features that depend on a minimum game version.

/// Version used for features the game does not support yet.
const NOT_YET_SUPPORTED: &str = "999.999.999";

/// A launcher feature gated on the installed game version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Functionality {
    /// The `-connect` parameter for direct ENet connections.
    DirectEnetConnect,
    /// Passing an absolute path to `-config`.
    AbsoluteConfigPath,
    /// Starting a campaign straight from the launcher.
    StartCampaignDirectly,
    /// Loading a save straight from the launcher.
    LoadSaveDirectly,
    /// IPv6 addresses for ENet connections.
    EnetIpv6Support,
}

impl Functionality {
    /// The first game version that supports this feature.
    #[must_use]
    pub const fn minimum_version(self) -> &'static str {
        match self {
            Self::DirectEnetConnect => "1.0.0",
            // Disabled while multiple installations share one config.
            Self::AbsoluteConfigPath => NOT_YET_SUPPORTED,
            Self::StartCampaignDirectly | Self::LoadSaveDirectly | Self::EnetIpv6Support => {
                NOT_YET_SUPPORTED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionInfo;

    #[test]
    fn direct_connect_requires_one_point_zero() {
        assert!(!VersionInfo::parse("0.5.0").has_functionality(Functionality::DirectEnetConnect));
        assert!(VersionInfo::parse("1.0.0").has_functionality(Functionality::DirectEnetConnect));
    }

    #[test]
    fn unsupported_features_are_gated_for_real_versions() {
        let info = VersionInfo::parse("1.3.1.4500 Alpha");
        assert!(!info.has_functionality(Functionality::LoadSaveDirectly));
        assert!(!info.has_functionality(Functionality::AbsoluteConfigPath));
    }

    #[test]
    fn unknown_version_has_no_gated_features() {
        assert!(!VersionInfo::unknown().has_functionality(Functionality::DirectEnetConnect));
    }
}
