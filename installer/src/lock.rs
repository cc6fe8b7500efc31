//! Exclusive lock on an installation root.
//!
//! Two pipelines writing into the same installation would interleave
//! extracted files, so each run holds an advisory lock on a marker file in
//! the root for its whole duration.

use crate::error::{Result, UpdateError};
use fs2::FileExt;
use log::debug;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Name of the lock file created inside the installation root.
pub const LOCK_FILE_NAME: &str = ".kfx-installer.lock";

/// Held while a pipeline runs against an installation root.
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Take the lock for `root`, creating the root if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Busy`] when another process or pipeline holds
    /// the lock, and [`UpdateError::Io`] when the lock file cannot be
    /// created.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::lock::InstallLock;
    ///
    /// let root = tempfile::tempdir().expect("temp dir");
    /// let held = InstallLock::acquire(root.path()).expect("first lock");
    /// assert!(InstallLock::acquire(root.path()).is_err());
    /// drop(held);
    /// assert!(InstallLock::acquire(root.path()).is_ok());
    /// ```
    pub fn acquire(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.try_lock_exclusive().map_err(|e| {
            debug!("lock {} unavailable: {e}", path.display());
            UpdateError::Busy {
                path: root.to_path_buf(),
            }
        })?;
        debug!("acquired {}", path.display());
        Ok(Self { file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("failed to unlock {}: {e}", self.path.display());
        }
    }
}
