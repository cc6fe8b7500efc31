//! 7z archive engine backed by the `sevenz-rust` crate.

use super::backend::{self, Backend};
use super::engine::ArchiveEngine;
use super::error::ArchiveError;
use super::path::validate_entry_path;
use crate::pipeline::CancellationToken;
use log::{debug, info};
use sevenz_rust::{Password, SevenZReader};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

/// Bytes decoded per read while testing or extracting.
const CHUNK_SIZE: usize = 64 * 1024;

/// Default [`ArchiveEngine`] for 7z release archives.
///
/// All instances share the process-wide [`Backend`], so at most one
/// archive operation runs at a time.
#[derive(Debug)]
pub struct SevenZipEngine {
    backend: &'static Backend,
}

impl SevenZipEngine {
    /// Create an engine bound to the process-wide backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            backend: backend::shared(),
        }
    }
}

impl Default for SevenZipEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveEngine for SevenZipEngine {
    fn test_and_get_size(&self, archive: &Path) -> Result<u64, ArchiveError> {
        let _slot = self.backend.begin_operation();
        let size = verify(archive, &CancellationToken::new())?;
        info!("archive {} tested OK ({size} bytes)", archive.display());
        Ok(size)
    }

    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        progress: &mut dyn FnMut(u64),
        cancel: &CancellationToken,
    ) -> Result<u64, ArchiveError> {
        let _slot = self.backend.begin_operation();
        let size = verify(archive, cancel)?;
        debug!(
            "extracting {} ({size} bytes) into {}",
            archive.display(),
            dest.display()
        );
        fs::create_dir_all(dest).map_err(|e| ArchiveError::extraction_failed(dest, &e))?;
        let written = unpack(archive, dest, progress, cancel)?;
        info!("extracted {written} bytes into {}", dest.display());
        Ok(written)
    }
}

fn open(archive: &Path) -> Result<SevenZReader<File>, ArchiveError> {
    let file = File::open(archive)?;
    let len = file.metadata()?.len();
    SevenZReader::new(file, len, Password::empty()).map_err(|e| ArchiveError::corrupt(&e))
}

/// Decode every entry without writing anything, returning the total
/// uncompressed size. Entry names are validated here so that extraction
/// never starts on an archive it would have to abandon half way.
fn verify(archive: &Path, cancel: &CancellationToken) -> Result<u64, ArchiveError> {
    let mut reader = open(archive)?;
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    let mut total = 0_u64;
    let mut failure = None;

    let walked = reader.for_each_entries(|entry, data| {
        let checked = validate_entry_path(entry.name()).and_then(|_| {
            if entry.is_directory() {
                return Ok(0);
            }
            copy_entry(data, None, &mut buffer, cancel, &mut |_| {})
        });
        match checked {
            Ok(read) => {
                total += read;
                Ok(true)
            }
            Err(e) => {
                failure = Some(e);
                Ok(false)
            }
        }
    });

    if let Some(error) = failure {
        return Err(error);
    }
    walked.map_err(|e| ArchiveError::corrupt(&e))?;
    Ok(total)
}

fn unpack(
    archive: &Path,
    dest: &Path,
    progress: &mut dyn FnMut(u64),
    cancel: &CancellationToken,
) -> Result<u64, ArchiveError> {
    let mut reader = open(archive)?;
    let mut buffer = vec![0_u8; CHUNK_SIZE];
    let mut processed = 0_u64;
    let mut failure = None;

    let walked = reader.for_each_entries(|entry, data| {
        let written = validate_entry_path(entry.name()).and_then(|relative| {
            let target = dest.join(relative);
            if entry.is_directory() {
                fs::create_dir_all(&target)
                    .map_err(|e| ArchiveError::extraction_failed(&target, &e))?;
                return Ok(0);
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| ArchiveError::extraction_failed(parent, &e))?;
            }
            let mut file =
                File::create(&target).map_err(|e| ArchiveError::extraction_failed(&target, &e))?;
            let base = processed;
            let copied = copy_entry(
                data,
                Some((&mut file, &target)),
                &mut buffer,
                cancel,
                &mut |entry_bytes| progress(base + entry_bytes),
            )?;
            file.flush()
                .map_err(|e| ArchiveError::extraction_failed(&target, &e))?;
            Ok(copied)
        });
        match written {
            Ok(bytes) => {
                processed += bytes;
                Ok(true)
            }
            Err(e) => {
                failure = Some(e);
                Ok(false)
            }
        }
    });

    if let Some(error) = failure {
        return Err(error);
    }
    walked.map_err(|e| ArchiveError::corrupt(&e))?;
    Ok(processed)
}

/// Copy one entry in chunks, optionally into `sink`, reporting the bytes
/// copied so far for this entry.
fn copy_entry(
    data: &mut dyn Read,
    mut sink: Option<(&mut File, &Path)>,
    buffer: &mut [u8],
    cancel: &CancellationToken,
    progress: &mut dyn FnMut(u64),
) -> Result<u64, ArchiveError> {
    let mut copied = 0_u64;
    loop {
        if cancel.is_cancelled() {
            return Err(ArchiveError::Cancelled);
        }
        let read = match data.read(buffer) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ArchiveError::corrupt(&e)),
        };
        if let Some((file, target)) = sink.as_mut() {
            file.write_all(buffer.get(..read).unwrap_or_default())
                .map_err(|e| ArchiveError::extraction_failed(target, &e))?;
        }
        copied += read as u64;
        progress(copied);
    }
}

#[cfg(test)]
#[path = "sevenz_tests.rs"]
mod tests;
