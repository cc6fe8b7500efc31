//! Platform directory lookup.
//!
//! Wrapped in a trait so configuration loading can be tested against a
//! temporary directory instead of the user's real profile.

use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Source of per-user directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory holding `launcher.toml`.
    fn config_dir(&self) -> Option<PathBuf>;

    /// Default installation root when none is configured.
    fn default_install_root(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
///
/// # Examples
///
/// ```
/// use kfx_installer::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs;
/// if let Some(config) = dirs.config_dir() {
///     assert!(config.is_absolute());
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBaseDirs;

impl SystemBaseDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("net", "KeeperFX", "kfx-installer")
    }
}

impl BaseDirs for SystemBaseDirs {
    fn config_dir(&self) -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn default_install_root(&self) -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.data_dir().join("KeeperFX"))
    }
}
