//! Per-file evaluation: decide, materialize, record

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::actions::{SyncActionResolver, SyncDecision};
use super::executor::FileOperationExecutor;
use super::{SkipReason, SyncOutcome};
use crate::activity::ActivityLog;
use crate::config::{DeletePolicy, Settings};
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::journal::{Journal, TrackedNote};
use crate::naming::NamingPolicy;

/// Main sync engine
///
/// Side effects of one evaluation happen in a fixed order: output file write
/// or delete, then journal upsert, then activity log append. A crash between
/// steps leaves the journal behind the output directory, never ahead of it.
#[derive(Debug)]
pub struct SyncEngine {
    executor: FileOperationExecutor,
    naming: NamingPolicy,
    skip_empty: bool,
    max_file_size: u64,
    journal: Arc<Journal>,
    activity: Arc<ActivityLog>,
    /// Held while a new destination name is chosen and claimed
    naming_lock: Mutex<()>,
}

impl SyncEngine {
    /// Create an engine writing into `settings.output_dir`
    #[must_use]
    pub fn new(settings: &Settings, journal: Arc<Journal>, activity: Arc<ActivityLog>) -> Self {
        Self {
            executor: FileOperationExecutor::new(settings.output_dir.clone(), settings.on_delete),
            naming: settings.naming.clone(),
            skip_empty: settings.skip_empty,
            max_file_size: settings.max_file_size,
            journal,
            activity,
            naming_lock: Mutex::new(()),
        }
    }

    /// Journal backing this engine
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Evaluate one source path and apply the resulting decision
    ///
    /// A forced evaluation rewrites the destination even when the content is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the output file,
    /// journal, or activity log cannot be written. Nothing is recorded in the
    /// journal for a failed output write, so the next trigger retries it.
    pub fn evaluate_and_sync(&self, source_path: &Path, force: bool) -> Result<SyncOutcome> {
        let content = match self.read_source(source_path)? {
            SourceRead::Present(bytes) => Some(bytes),
            SourceRead::Missing => None,
            SourceRead::TooLarge(len) => {
                warn!(
                    path = %source_path.display(),
                    bytes = len,
                    limit = self.max_file_size,
                    "source exceeds size limit, skipping"
                );
                return Ok(SyncOutcome::Skipped(SkipReason::TooLarge));
            }
        };

        if self.skip_empty
            && let Some(bytes) = &content
            && bytes.iter().all(u8::is_ascii_whitespace)
        {
            debug!(path = %source_path.display(), "empty source, skipping");
            return Ok(SyncOutcome::Skipped(SkipReason::Empty));
        }

        let fingerprint = content.as_deref().map(Fingerprint::of);
        let tracked = self.journal.get(source_path);
        let destination_present = tracked
            .as_ref()
            .is_some_and(|n| !n.deleted && self.executor.exists(&n.destination_name));

        let Some(decision) = SyncActionResolver::resolve(
            tracked.as_ref(),
            fingerprint.as_ref(),
            force,
            destination_present,
        ) else {
            return Ok(SyncOutcome::Skipped(match tracked {
                Some(_) => SkipReason::AlreadyDeleted,
                None => SkipReason::NotTracked,
            }));
        };

        let now = Utc::now();
        let destination_name = match (decision, fingerprint, content) {
            (SyncDecision::Create, Some(fingerprint), Some(bytes)) => {
                self.create(source_path, tracked.as_ref(), fingerprint, &bytes, now)?
            }
            (SyncDecision::Update, Some(fingerprint), Some(bytes)) => {
                let note = tracked.context("update without a journal entry")?;
                self.executor.write(&note.destination_name, &bytes)?;
                self.journal.upsert(TrackedNote {
                    fingerprint,
                    last_synced_at: now,
                    ..note.clone()
                })?;
                note.destination_name
            }
            (SyncDecision::Unchanged, _, _) => tracked
                .context("unchanged without a journal entry")?
                .destination_name,
            (SyncDecision::Delete, None, None) => {
                let note = tracked.context("delete without a journal entry")?;
                if self.executor.remove(&note.destination_name)? {
                    debug!(file = %note.destination_name, "removed output file");
                }
                self.journal.upsert(TrackedNote {
                    deleted: true,
                    last_synced_at: now,
                    ..note.clone()
                })?;
                note.destination_name
            }
            (decision, _, _) => anyhow::bail!(
                "inconsistent decision {decision} for {}",
                source_path.display()
            ),
        };

        self.activity
            .record(now, decision, source_path, &destination_name)?;

        if decision.touches_output() {
            info!(
                decision = %decision,
                path = %source_path.display(),
                file = %destination_name,
                "synced"
            );
        } else {
            debug!(path = %source_path.display(), "unchanged");
        }

        Ok(SyncOutcome::Synced {
            decision,
            destination_name,
        })
    }

    fn create(
        &self,
        source_path: &Path,
        tombstone: Option<&TrackedNote>,
        fingerprint: Fingerprint,
        bytes: &[u8],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let _guard = self.naming_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let taken = self.journal.names_claimed_by_others(
            source_path,
            self.executor.on_delete() == DeletePolicy::Retain,
        );
        let candidate = match tombstone {
            Some(note) => note.destination_name.clone(),
            None => match self.untracked_output(source_path, &taken)? {
                Some(name) => {
                    info!(
                        path = %source_path.display(),
                        file = %name,
                        "adopting untracked output file"
                    );
                    name
                }
                None => self
                    .naming
                    .derive_name(source_path, creation_time(source_path).unwrap_or(now)),
            },
        };

        let (name, disambiguated) = NamingPolicy::disambiguate(&candidate, &taken);
        if disambiguated {
            warn!(
                path = %source_path.display(),
                wanted = %candidate,
                chosen = %name,
                "destination name already claimed by another note"
            );
        }

        self.executor.write(&name, bytes)?;
        self.journal.upsert(TrackedNote {
            source_path: source_path.to_path_buf(),
            fingerprint,
            destination_name: name.clone(),
            last_synced_at: now,
            deleted: false,
        })?;
        Ok(name)
    }

    /// Read a source, checking its size before buffering it
    fn read_source(&self, source_path: &Path) -> Result<SourceRead> {
        let context = || format!("Failed to read source: {}", source_path.display());

        match fs::metadata(source_path) {
            Ok(metadata) if metadata.len() > self.max_file_size => {
                return Ok(SourceRead::TooLarge(metadata.len()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SourceRead::Missing),
            Err(e) => return Err(e).with_context(context),
        }

        match fs::read(source_path) {
            // The file may have grown since the metadata check
            Ok(bytes) if bytes.len() as u64 > self.max_file_size => {
                Ok(SourceRead::TooLarge(bytes.len() as u64))
            }
            Ok(bytes) => Ok(SourceRead::Present(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SourceRead::Missing),
            Err(e) => Err(e).with_context(context),
        }
    }

    /// An output file written for `source_path` that no journal entry claims
    ///
    /// Left behind when a run stopped between the output write and the
    /// journal upsert. Its timestamp may not match the source's current
    /// creation time, so it is matched on everything but the timestamp.
    fn untracked_output(
        &self,
        source_path: &Path,
        taken: &HashSet<String>,
    ) -> Result<Option<String>> {
        Ok(self
            .executor
            .list()?
            .into_iter()
            .find(|name| !taken.contains(name) && self.naming.is_derived_from(name, source_path)))
    }
}

/// Source file contents as seen by one evaluation
enum SourceRead {
    Present(Vec<u8>),
    Missing,
    TooLarge(u64),
}

/// Creation time of a file, falling back to its modification time
fn creation_time(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}
