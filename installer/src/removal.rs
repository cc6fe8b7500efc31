//! Version-gated removal of obsolete game files.
//!
//! A release may ship a `files-to-remove.txt` manifest listing files that
//! older releases installed but newer ones no longer need:
//!
//! ```text
//! # comment
//! [1.0.0]
//! data/old.dat
//! [1.2.0]
//! fxdata\legacy.lua
//! ```
//!
//! Paths under a `[version]` header apply once the installed version has
//! reached that version. Resolving the manifest is a pure read; deletion
//! happens only through [`remove_files`] after the caller has confirmed
//! the list.

use crate::version::is_lower_or_equal;
use log::{debug, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File name of the removal manifest inside the installation root.
pub const REMOVAL_MANIFEST_FILE: &str = "files-to-remove.txt";

/// Section version assigned to malformed headers. No real installation
/// reaches it, so the section is skipped.
const INACTIVE_SECTION: &str = "999.999.999.999";

/// One path line of a removal manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRule {
    /// Version of the section header above the path. Empty for paths that
    /// precede every header.
    pub introduced_before_version: String,
    /// The path exactly as written in the manifest.
    pub relative_path: String,
}

/// Errors arising from removing files.
#[derive(Debug, thiserror::Error)]
pub enum RemovalError {
    /// A listed file exists but could not be deleted.
    #[error("failed to remove {path}: {source}")]
    Remove {
        /// The file that could not be removed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Parse manifest text into rules, in file order.
///
/// Lines are trimmed; blank lines and `#` comments are ignored. A header
/// that is not a 2–4 component dotted version deactivates its section.
///
/// # Examples
///
/// ```
/// use kfx_installer::removal::parse_manifest;
///
/// let rules = parse_manifest("[1.0.0]\nfoo.txt\n[oops]\nbar.txt\n");
/// assert_eq!(rules[0].introduced_before_version, "1.0.0");
/// assert_eq!(rules[1].introduced_before_version, "999.999.999.999");
/// ```
#[must_use]
pub fn parse_manifest(text: &str) -> Vec<RemovalRule> {
    let mut section = String::new();
    let mut rules = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = if is_section_version(header) {
                header.to_owned()
            } else {
                debug!("invalid version header in {REMOVAL_MANIFEST_FILE}: {header:?}");
                INACTIVE_SECTION.to_owned()
            };
            continue;
        }
        rules.push(RemovalRule {
            introduced_before_version: section.clone(),
            relative_path: line.to_owned(),
        });
    }
    rules
}

/// Return the normalised paths that apply to `installed_version`.
///
/// Duplicates are dropped, keeping the first occurrence. Paths that would
/// escape the installation root are skipped with a warning.
#[must_use]
pub fn active_paths(text: &str, installed_version: &str) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for rule in parse_manifest(text) {
        if !is_lower_or_equal(&rule.introduced_before_version, installed_version) {
            continue;
        }
        let Some(path) = normalise_path(&rule.relative_path) else {
            warn!(
                "ignoring removal entry outside the installation: {}",
                rule.relative_path
            );
            continue;
        };
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

/// Resolve the removal manifest at `manifest` against the installation at
/// `root`, returning the listed paths that currently exist.
///
/// A manifest that cannot be read yields an empty list.
///
/// # Examples
///
/// ```
/// use kfx_installer::removal::resolve;
///
/// let root = tempfile::tempdir().expect("temp dir");
/// std::fs::write(root.path().join("foo.txt"), "old").expect("write");
/// let manifest = root.path().join("files-to-remove.txt");
/// std::fs::write(&manifest, "[1.0.0]\nfoo.txt\n[2.0.0]\nbar.txt\n").expect("write");
///
/// let files = resolve(root.path(), &manifest, "1.5.0");
/// assert_eq!(files, vec![std::path::PathBuf::from("foo.txt")]);
/// ```
#[must_use]
pub fn resolve(root: &Path, manifest: &Path, installed_version: &str) -> Vec<PathBuf> {
    let text = match std::fs::read_to_string(manifest) {
        Ok(text) => text,
        Err(e) => {
            debug!("no removal manifest at {}: {e}", manifest.display());
            return Vec::new();
        }
    };
    active_paths(&text, installed_version)
        .into_iter()
        .map(|path| path.split('/').collect::<PathBuf>())
        .filter(|relative| root.join(relative).exists())
        .collect()
}

/// Delete `files` (relative to `root`), returning how many were removed.
///
/// Files that have already disappeared are skipped. Directories are never
/// deleted: they are skipped with a warning and their contents are left
/// alone.
///
/// # Errors
///
/// Returns [`RemovalError::Remove`] for the first file that exists but
/// cannot be deleted; files after it are left in place.
pub fn remove_files(root: &Path, files: &[PathBuf]) -> Result<usize, RemovalError> {
    let mut removed = 0;
    for relative in files {
        let path = root.join(relative);
        let result = match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                warn!("not removing directory {}", path.display());
                continue;
            }
            Ok(_) => std::fs::remove_file(&path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("already gone: {}", path.display());
                continue;
            }
            Err(e) => Err(e),
        };
        result.map_err(|source| RemovalError::Remove {
            path: path.clone(),
            source,
        })?;
        info!("removed {}", relative.display());
        removed += 1;
    }
    Ok(removed)
}

fn is_section_version(header: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d+\.\d+(\.\d+){0,2}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(header))
}

/// Normalise a manifest path to `/`-separated form relative to the root.
///
/// Returns `None` when `..` segments climb above the root or nothing is
/// left after normalisation.
fn normalise_path(raw: &str) -> Option<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            normal => segments.push(normal),
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
