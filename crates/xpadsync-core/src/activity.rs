//! Append-only activity log
//!
//! One tab-separated line per sync decision:
//! `<timestamp>\t<DECISION>\t<source path>\t<destination name>`.
//! Rotation is left to external tooling.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::sync::SyncDecision;

/// Handle to the activity log file
#[derive(Debug)]
pub struct ActivityLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ActivityLog {
    /// Open the log for appending, creating it and its directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open activity log: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Location of the log file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one decision line
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be written.
    pub fn record(
        &self,
        at: DateTime<Utc>,
        decision: SyncDecision,
        source_path: &Path,
        destination_name: &str,
    ) -> Result<()> {
        let line = format!(
            "{}\t{}\t{}\t{}\n",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            decision.label(),
            source_path.display(),
            destination_name
        );

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to append to activity log: {}", self.path.display()))?;
        Ok(())
    }
}

/// One parsed activity log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    /// Decision time
    pub at: DateTime<Utc>,
    /// Decision label, e.g. `UPDATE`
    pub decision: String,
    /// Source path as logged
    pub source_path: PathBuf,
    /// Destination file name
    pub destination_name: String,
}

/// Read back every well-formed line of an activity log
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_entries(path: &Path) -> Result<Vec<ActivityEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read activity log: {}", path.display()))?;

    Ok(content
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, '\t');
            let at = DateTime::parse_from_rfc3339(fields.next()?).ok()?;
            Some(ActivityEntry {
                at: at.with_timezone(&Utc),
                decision: fields.next()?.to_string(),
                source_path: PathBuf::from(fields.next()?),
                destination_name: fields.next()?.to_string(),
            })
        })
        .collect())
}
