//! Archive entry path validation.
//!
//! Entry names come from untrusted archives. Names are split on both `/`
//! and `\` so archives built on Windows resolve the same way everywhere.

use super::error::ArchiveError;
use std::path::PathBuf;

/// Convert an archive entry name into a relative path below the
/// destination directory.
///
/// Empty and `.` segments are dropped.
///
/// # Errors
///
/// Returns [`ArchiveError::PathTraversal`] for absolute names, drive
/// prefixes and names containing `..` segments.
///
/// # Examples
///
/// ```
/// use kfx_installer::archive::path::validate_entry_path;
/// use std::path::PathBuf;
///
/// let path = validate_entry_path(r"data\creature.cfg").expect("safe path");
/// assert_eq!(path, PathBuf::from("data").join("creature.cfg"));
/// assert!(validate_entry_path("../escape.txt").is_err());
/// ```
pub fn validate_entry_path(name: &str) -> Result<PathBuf, ArchiveError> {
    let traversal = || ArchiveError::PathTraversal {
        path: name.to_owned(),
    };

    if name.starts_with('/') || name.starts_with('\\') {
        return Err(traversal());
    }

    let mut relative = PathBuf::new();
    for (index, segment) in name.split(['/', '\\']).enumerate() {
        match segment {
            "" | "." => {}
            ".." => return Err(traversal()),
            drive if index == 0 && drive.ends_with(':') => return Err(traversal()),
            normal => relative.push(normal),
        }
    }
    Ok(relative)
}
