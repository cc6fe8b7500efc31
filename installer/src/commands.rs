//! Subcommand handlers.
//!
//! Each handler receives its collaborators explicitly so the binary stays a
//! thin layer of wiring. Report commands write to the given `stdout`
//! (human-readable by default, JSON with `--json`); install and update
//! report through a [`PipelineObserver`].

use crate::api::ManifestFetcher;
use crate::cli::{ChannelArg, CheckArgs, InstallArgs, ReportArgs, UpdateArgs};
use crate::config::LauncherConfig;
use crate::error::CommandError;
use crate::filemap::stale_files;
use crate::installed::{read_installed, record_installed};
use crate::pipeline::{PipelineObserver, UpdatePipeline, UpdateRequest};
use crate::removal;
use crate::update_check::check_for_update;
use crate::version::{ReleaseChannel, VersionInfo};
use log::{debug, info};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// The installed release: `--current` when given, else the install record.
///
/// # Errors
///
/// Returns [`CommandError::Installed`] when the record cannot be read.
pub fn installed_version(root: &Path, current: Option<&str>) -> Result<VersionInfo, CommandError> {
    match current {
        Some(version) => Ok(VersionInfo::parse(version)),
        None => Ok(read_installed(root)?),
    }
}

/// Channel a check or update should follow.
///
/// An explicit request wins; otherwise the installed channel is kept when
/// the API serves it, falling back to stable.
///
/// # Examples
///
/// ```
/// use kfx_installer::commands::target_channel;
/// use kfx_installer::version::{ReleaseChannel, VersionInfo};
///
/// let alpha = VersionInfo::parse("1.2.0.4100 Alpha");
/// assert_eq!(target_channel(None, &alpha), ReleaseChannel::Alpha);
/// assert_eq!(target_channel(None, &VersionInfo::unknown()), ReleaseChannel::Stable);
/// ```
#[must_use]
pub fn target_channel(requested: Option<ChannelArg>, installed: &VersionInfo) -> ReleaseChannel {
    match requested {
        Some(channel) => channel.into(),
        None if installed.channel().api_name().is_some() => installed.channel(),
        None => ReleaseChannel::Stable,
    }
}

fn write_output(stdout: &mut dyn Write, output: &str) -> Result<(), CommandError> {
    writeln!(stdout, "{output}").map_err(|source| CommandError::WriteFailed { source })
}

fn to_json(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_owned())
}

#[derive(Debug, Serialize)]
struct CheckReport {
    installed: String,
    channel: String,
    latest: Option<String>,
    update_available: bool,
}

/// Report whether a newer release is available.
///
/// # Errors
///
/// Returns [`CommandError`] when the release API cannot be queried or the
/// output cannot be written.
pub fn run_check(
    fetcher: &dyn ManifestFetcher,
    root: &Path,
    args: &CheckArgs,
    stdout: &mut dyn Write,
) -> Result<(), CommandError> {
    let installed = installed_version(root, args.current.as_deref())?;
    let channel = target_channel(args.channel, &installed);
    let latest = check_for_update(fetcher, &installed, channel)?;

    let output = if args.json {
        to_json(&CheckReport {
            installed: installed.to_string(),
            channel: channel.to_string(),
            latest: latest.as_ref().map(VersionInfo::display_string),
            update_available: latest.is_some(),
        })
    } else {
        match &latest {
            Some(latest) => format!("Update available: {installed} -> {latest}"),
            None => format!("KeeperFX {installed} is up to date"),
        }
    };
    write_output(stdout, &output)
}

/// Install the latest release of the requested channel and record it.
///
/// # Errors
///
/// Returns [`CommandError`] when the pipeline fails or the install record
/// cannot be written.
pub fn run_install(
    pipeline: &mut UpdatePipeline,
    args: &InstallArgs,
    observer: &mut dyn PipelineObserver,
) -> Result<VersionInfo, CommandError> {
    let request = UpdateRequest::Install {
        channel: args.channel.into(),
    };
    let installed = pipeline.run(&request, observer)?;
    record_installed(&pipeline.context().install_root, &installed)?;
    Ok(installed)
}

/// Update to the latest release when one is available.
///
/// Returns the newly installed release, or `None` when already current.
///
/// # Errors
///
/// Returns [`CommandError`] when the check or the pipeline fails, or the
/// install record cannot be read or written.
pub fn run_update(
    fetcher: &dyn ManifestFetcher,
    pipeline: &mut UpdatePipeline,
    args: &UpdateArgs,
    observer: &mut dyn PipelineObserver,
) -> Result<Option<VersionInfo>, CommandError> {
    let root = pipeline.context().install_root.clone();
    let installed = installed_version(&root, args.current.as_deref())?;
    let channel = target_channel(args.channel, &installed);
    let Some(target) = check_for_update(fetcher, &installed, channel)? else {
        observer.on_message(&format!("KeeperFX {installed} is up to date"));
        return Ok(None);
    };

    info!("updating {installed} to {target}");
    let updated = pipeline.run(&UpdateRequest::Update { installed, target }, observer)?;
    record_installed(&root, &updated)?;
    Ok(Some(updated))
}

fn known_installed(root: &Path, current: Option<&str>) -> Result<VersionInfo, CommandError> {
    let installed = installed_version(root, current)?;
    if installed.is_unknown() {
        return Err(CommandError::UnknownInstalledVersion);
    }
    Ok(installed)
}

#[derive(Debug, Serialize)]
struct RemovalReport {
    installed: String,
    files: Vec<String>,
}

/// List obsolete files that apply to the installed version, without
/// deleting them.
///
/// # Errors
///
/// Returns [`CommandError::UnknownInstalledVersion`] when the installed
/// version cannot be determined, or a write failure.
pub fn run_files_to_remove(
    config: &LauncherConfig,
    root: &Path,
    args: &ReportArgs,
    stdout: &mut dyn Write,
) -> Result<(), CommandError> {
    let installed = known_installed(root, args.current.as_deref())?;
    let manifest = root.join(&config.removal_manifest);
    debug!("reading removal manifest {}", manifest.display());
    let files: Vec<String> = removal::resolve(root, &manifest, installed.version())
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let output = if args.json {
        to_json(&RemovalReport {
            installed: installed.to_string(),
            files,
        })
    } else if files.is_empty() {
        format!("No obsolete files for KeeperFX {installed}.")
    } else {
        let mut output = format!("Obsolete files for KeeperFX {installed}:\n");
        for file in &files {
            output.push_str(&format!("  - {file}\n"));
        }
        output.trim_end().to_owned()
    };
    write_output(stdout, &output)
}

#[derive(Debug, Serialize)]
struct VerifyReport {
    installed: String,
    checked: usize,
    stale: Vec<String>,
}

/// Compare installed files against the release file list.
///
/// Missing files and checksum mismatches are reported; nothing is
/// repaired.
///
/// # Errors
///
/// Returns [`CommandError`] when the installed version is unknown, the
/// file list cannot be fetched, an installed file cannot be read, or the
/// output cannot be written.
pub fn run_verify(
    fetcher: &dyn ManifestFetcher,
    root: &Path,
    args: &ReportArgs,
    stdout: &mut dyn Write,
) -> Result<(), CommandError> {
    let installed = known_installed(root, args.current.as_deref())?;
    let manifest = fetcher.file_manifest(installed.channel(), installed.version())?;
    let stale = stale_files(root, &manifest)?;

    let output = if args.json {
        to_json(&VerifyReport {
            installed: installed.to_string(),
            checked: manifest.len(),
            stale,
        })
    } else if stale.is_empty() {
        format!("All {} files match KeeperFX {installed}.", manifest.len())
    } else {
        let mut output = format!(
            "{} of {} files differ from KeeperFX {installed}:\n",
            stale.len(),
            manifest.len()
        );
        for file in &stale {
            output.push_str(&format!("  - {file}\n"));
        }
        output.trim_end().to_owned()
    };
    write_output(stdout, &output)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
