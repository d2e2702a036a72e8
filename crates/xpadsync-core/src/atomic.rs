//! Atomic file writes
//!
//! Content is written to a sibling temporary file, flushed to disk, and then
//! renamed over the target. Readers of the directory see either the old file
//! or the complete new one. Temporary files carry [`TEMP_SUFFIX`] so leftovers
//! from a crash can be recognized and removed.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};

use crate::error::Result;

/// Suffix marking in-flight temporary files
pub const TEMP_SUFFIX: &str = ".xpadsync-tmp";

/// Whether a path names one of our temporary files
#[must_use]
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEMP_SUFFIX))
}

/// Temporary path used while writing `dest`
fn temp_path_for(dest: &Path) -> Result<PathBuf> {
    let file_name = dest
        .file_name()
        .with_context(|| format!("Destination has no file name: {}", dest.display()))?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(format!(".{}", std::process::id()));
    temp_name.push(TEMP_SUFFIX);
    Ok(dest.with_file_name(temp_name))
}

/// Write `bytes` to `dest` atomically
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or any write,
/// flush, or rename fails. The temporary file is removed on failure.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp = temp_path_for(dest)?;
    let result = write_and_rename(&temp, dest, bytes);
    if result.is_err() && temp.exists() {
        let _ = fs::remove_file(&temp);
    }
    result
}

fn write_and_rename(temp: &Path, dest: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(temp)
        .with_context(|| format!("Failed to create temporary file: {}", temp.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write temporary file: {}", temp.display()))?;
    file.sync_all()
        .with_context(|| format!("Failed to flush temporary file: {}", temp.display()))?;
    drop(file);

    fs::rename(temp, dest).with_context(|| {
        format!("Failed to rename {} to {}", temp.display(), dest.display())
    })?;
    Ok(())
}

/// Remove leftover temporary files from a directory
///
/// Returns the removed paths. A missing directory is not an error.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn remove_stale_temp_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("Failed to read entry in: {}", dir.display()))?;
        let path = entry.path();
        if !is_temp_file(&path) || !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed stale temporary file");
                removed.push(path);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale temporary file"),
        }
    }
    Ok(removed)
}
