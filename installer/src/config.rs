//! Launcher configuration.
//!
//! Settings live in `launcher.toml` inside the platform config directory.
//! Every field is optional; a missing file yields the defaults. The API
//! endpoint can be overridden with `KFX_API_ENDPOINT` and command-line
//! flags override both.

use crate::api::client::DEFAULT_API_ENDPOINT;
use crate::dirs::BaseDirs;
use crate::removal::REMOVAL_MANIFEST_FILE;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "launcher.toml";

/// Environment variable overriding [`LauncherConfig::api_endpoint`].
pub const API_ENDPOINT_ENV: &str = "KFX_API_ENDPOINT";

/// Errors arising from loading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration TOML.
    #[error("invalid configuration in {path}: {reason}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        reason: String,
    },
}

/// Settings for installing and updating KeeperFX.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Base URL of the release API.
    pub api_endpoint: String,
    /// Installation root. Falls back to the platform data directory.
    pub install_root: Option<PathBuf>,
    /// Removal manifest path, relative to the installation root unless
    /// absolute.
    pub removal_manifest: PathBuf,
    /// Whether to offer removal of obsolete files after an update.
    pub apply_removals: bool,
    /// Connect timeout for archive downloads, in seconds.
    pub connect_timeout_secs: u64,
    /// Overall timeout for release API requests, in seconds.
    pub api_timeout_secs: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_owned(),
            install_root: None,
            removal_manifest: PathBuf::from(REMOVAL_MANIFEST_FILE),
            apply_removals: true,
            connect_timeout_secs: 30,
            api_timeout_secs: 30,
        }
    }
}

impl LauncherConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::config::LauncherConfig;
    /// use std::path::Path;
    ///
    /// let config = LauncherConfig::from_toml("apply_removals = false", Path::new("launcher.toml"))
    ///     .expect("valid config");
    /// assert!(!config.apply_removals);
    /// assert_eq!(config.api_timeout_secs, 30);
    /// ```
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load configuration from `path`, returning defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!("loading configuration from {}", path.display());
                Self::from_toml(&text, path)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load `launcher.toml` from the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but is invalid.
    pub fn load_default(dirs: &dyn BaseDirs) -> Result<Self, ConfigError> {
        match dirs.config_dir() {
            Some(dir) => Self::load(&dir.join(CONFIG_FILE_NAME)),
            None => Ok(Self::default()),
        }
    }

    /// Apply `KFX_API_ENDPOINT` when it is set to a non-blank value.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(API_ENDPOINT_ENV) {
            let endpoint = endpoint.trim();
            if !endpoint.is_empty() {
                debug!("API endpoint overridden by {API_ENDPOINT_ENV}");
                self.api_endpoint = endpoint.to_owned();
            }
        }
        self
    }

    /// Resolve the installation root, preferring the configured value.
    #[must_use]
    pub fn resolve_install_root(&self, dirs: &dyn BaseDirs) -> Option<PathBuf> {
        self.install_root
            .clone()
            .or_else(|| dirs.default_install_root())
    }

    /// Path of the removal manifest for `root`, or `None` when removals
    /// are disabled.
    #[must_use]
    pub fn removal_manifest_path(&self, root: &Path) -> Option<PathBuf> {
        self.apply_removals
            .then(|| root.join(&self.removal_manifest))
    }

    /// Connect timeout for archive downloads.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Overall timeout for release API requests.
    #[must_use]
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}
