//! CLI argument definitions for the KeeperFX installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::version::ReleaseChannel;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// Install and update KeeperFX.
#[derive(Parser, Debug)]
#[command(name = "kfx-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Install and update KeeperFX.\n\n",
    "Releases are fetched from the KeeperFX release API, downloaded as 7z ",
    "archives, tested, and extracted over the installation root. Alpha ",
    "installs apply the latest stable release first and the alpha patch on ",
    "top of it.\n\n",
    "Settings are read from launcher.toml in the platform configuration ",
    "directory. KFX_API_ENDPOINT overrides the configured API endpoint and ",
    "command-line flags override both.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install the latest stable release:\n",
    "    $ kfx-installer --install-root ~/games/keeperfx install\n\n",
    "  Switch an installation to the alpha channel:\n",
    "    $ kfx-installer update --channel alpha\n\n",
    "  List obsolete files without deleting them:\n",
    "    $ kfx-installer files-to-remove\n\n",
    "  Check installed files against the release file list:\n",
    "    $ kfx-installer verify --json",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// KeeperFX installation directory [default: from config, then platform-specific].
    #[arg(long, global = true, value_name = "DIR")]
    pub install_root: Option<Utf8PathBuf>,

    /// Configuration file [default: launcher.toml in the config directory].
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Release API base URL.
    #[arg(long, global = true, value_name = "URL")]
    pub api_endpoint: Option<String>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only print warnings, errors and prompts.
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Log level selected by `-q` and `-v`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::cli::GlobalArgs;
    /// use log::LevelFilter;
    ///
    /// assert_eq!(GlobalArgs::default().log_filter(), LevelFilter::Info);
    /// let verbose = GlobalArgs { verbosity: 1, ..GlobalArgs::default() };
    /// assert_eq!(verbose.log_filter(), LevelFilter::Debug);
    /// ```
    #[must_use]
    pub fn log_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Report whether a newer release is available.
    Check(CheckArgs),

    /// Install the latest release of a channel.
    Install(InstallArgs),

    /// Update the installation when a newer release is available.
    Update(UpdateArgs),

    /// List obsolete files that apply to the installed version.
    FilesToRemove(ReportArgs),

    /// Compare installed files against the release file list.
    Verify(ReportArgs),
}

/// Release channels the API serves.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelArg {
    /// Tagged stable releases.
    Stable,
    /// Alpha patches over the latest stable release.
    Alpha,
}

impl From<ChannelArg> for ReleaseChannel {
    fn from(channel: ChannelArg) -> Self {
        match channel {
            ChannelArg::Stable => Self::Stable,
            ChannelArg::Alpha => Self::Alpha,
        }
    }
}

/// Arguments for the check command.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Channel to check [default: the installed channel, else stable].
    #[arg(long, value_enum)]
    pub channel: Option<ChannelArg>,

    /// Treat this version as installed instead of reading the install record.
    #[arg(long, value_name = "VERSION")]
    pub current: Option<String>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the install command.
#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Channel to install.
    #[arg(long, value_enum, default_value_t = ChannelArg::Stable)]
    pub channel: ChannelArg,

    /// Delete obsolete files without asking.
    #[arg(short, long)]
    pub yes: bool,
}

impl Default for InstallArgs {
    fn default() -> Self {
        Self {
            channel: ChannelArg::Stable,
            yes: false,
        }
    }
}

/// Arguments for the update command.
#[derive(Args, Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Channel to update from [default: the installed channel, else stable].
    #[arg(long, value_enum)]
    pub channel: Option<ChannelArg>,

    /// Treat this version as installed instead of reading the install record.
    #[arg(long, value_name = "VERSION")]
    pub current: Option<String>,

    /// Delete obsolete files without asking.
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the read-only report commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Treat this version as installed instead of reading the install record.
    #[arg(long, value_name = "VERSION")]
    pub current: Option<String>,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
