//! Durable per-note sync state
//!
//! The journal maps each source path to the last state that was successfully
//! materialized for it. Entries are never removed; a vanished source is kept
//! as a tombstone (`deleted = true`) so the file doubles as an audit trail.
//!
//! On disk the journal is a single JSON document replaced through
//! [`write_atomic`](crate::atomic::write_atomic) on every upsert. A journal
//! that exists but cannot be parsed is a [`FatalError`] and is never treated
//! as empty.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::atomic::write_atomic;
use crate::error::{FatalError, Result};
use crate::fingerprint::Fingerprint;

/// On-disk format version
const JOURNAL_VERSION: u32 = 1;

/// Sync state of one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedNote {
    /// Absolute path in the source directory
    pub source_path: PathBuf,
    /// Digest of the last synced content
    pub fingerprint: Fingerprint,
    /// File name used in the output directory
    pub destination_name: String,
    /// Time of the last successful sync decision
    pub last_synced_at: DateTime<Utc>,
    /// Set once the source file has disappeared
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalDocument {
    version: u32,
    notes: Vec<TrackedNote>,
}

/// Key-value store of [`TrackedNote`]s keyed by source path
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    notes: RwLock<BTreeMap<PathBuf, TrackedNote>>,
    writer: Mutex<()>,
}

impl Journal {
    /// Load the journal at `path`, starting empty if it does not exist
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::JournalCorrupt`] if the file cannot be parsed and
    /// [`FatalError::JournalUnreadable`] if it cannot be read.
    pub fn open(path: &Path) -> Result<Self> {
        let notes = match fs::read(path) {
            Ok(bytes) => Self::parse(path, &bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no journal found, starting empty");
                BTreeMap::new()
            }
            Err(source) => {
                return Err(FatalError::JournalUnreadable {
                    path: path.to_path_buf(),
                    source,
                }
                .into());
            }
        };

        debug!(path = %path.display(), entries = notes.len(), "journal loaded");

        Ok(Self {
            path: path.to_path_buf(),
            notes: RwLock::new(notes),
            writer: Mutex::new(()),
        })
    }

    fn parse(path: &Path, bytes: &[u8]) -> Result<BTreeMap<PathBuf, TrackedNote>> {
        let corrupt = |source| FatalError::JournalCorrupt {
            path: path.to_path_buf(),
            source,
        };

        let document: JournalDocument = serde_json::from_slice(bytes).map_err(corrupt)?;
        if document.version != JOURNAL_VERSION {
            return Err(corrupt(serde::de::Error::custom(format!(
                "unsupported journal version {}",
                document.version
            )))
            .into());
        }

        let mut notes = BTreeMap::new();
        for note in document.notes {
            let key = note.source_path.clone();
            if notes.insert(key, note).is_some() {
                return Err(corrupt(serde::de::Error::custom(
                    "duplicate entry for one source path",
                ))
                .into());
            }
        }
        Ok(notes)
    }

    /// Location of the journal file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the entry for a source path
    #[must_use]
    pub fn get(&self, source_path: &Path) -> Option<TrackedNote> {
        self.notes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source_path)
            .cloned()
    }

    /// Insert or replace an entry and persist the journal
    ///
    /// The new document is written to disk before it becomes visible to
    /// [`get`](Self::get) and [`snapshot`](Self::snapshot). Upserts are
    /// serialized across the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be written; the in-memory state
    /// is left unchanged in that case.
    pub fn upsert(&self, note: TrackedNote) -> Result<()> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = self
            .notes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        next.insert(note.source_path.clone(), note);

        let document = JournalDocument {
            version: JOURNAL_VERSION,
            notes: next.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&document).context("Failed to serialize journal")?;
        write_atomic(&self.path, &bytes)
            .with_context(|| format!("Failed to write journal: {}", self.path.display()))?;

        *self.notes.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(())
    }

    /// All entries ordered by source path
    #[must_use]
    pub fn snapshot(&self) -> Vec<TrackedNote> {
        self.notes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Destination names claimed by notes other than `except`
    ///
    /// Live notes always claim their name. Tombstoned notes claim it only
    /// when `include_tombstones` is set, i.e. when their output file is kept.
    #[must_use]
    pub fn names_claimed_by_others(&self, except: &Path, include_tombstones: bool) -> HashSet<String> {
        self.notes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|n| n.source_path != except && (include_tombstones || !n.deleted))
            .map(|n| n.destination_name.clone())
            .collect()
    }

    /// Number of entries, tombstones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the journal has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_fatal;
    use crate::fingerprint::fingerprint;
    use tempfile::TempDir;

    fn note(path: &str, content: &[u8], name: &str) -> TrackedNote {
        TrackedNote {
            source_path: PathBuf::from(path),
            fingerprint: fingerprint(content),
            destination_name: name.to_string(),
            last_synced_at: Utc::now(),
            deleted: false,
        }
    }

    #[test]
    fn test_missing_journal_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let journal = Journal::open(&tmp.path().join("journal.json")).unwrap();

        assert!(journal.is_empty());
        assert!(!tmp.path().join("journal.json").exists());
    }

    #[test]
    fn test_upsert_persists_and_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.json");

        let journal = Journal::open(&path).unwrap();
        let entry = note("/src/a.md", b"Hello", "xpad_note_a.md");
        journal.upsert(entry.clone()).unwrap();

        let reloaded = Journal::open(&path).unwrap();
        assert_eq!(reloaded.get(Path::new("/src/a.md")), Some(entry));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_existing_entry() {
        let tmp = TempDir::new().unwrap();
        let journal = Journal::open(&tmp.path().join("journal.json")).unwrap();

        journal.upsert(note("/src/a.md", b"one", "a.md")).unwrap();
        let mut updated = note("/src/a.md", b"two", "a.md");
        updated.deleted = true;
        journal.upsert(updated.clone()).unwrap();

        assert_eq!(journal.len(), 1);
        assert_eq!(journal.get(Path::new("/src/a.md")), Some(updated));
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let tmp = TempDir::new().unwrap();
        let journal = Journal::open(&tmp.path().join("journal.json")).unwrap();

        journal.upsert(note("/src/b.md", b"b", "b.md")).unwrap();
        journal.upsert(note("/src/a.md", b"a", "a.md")).unwrap();

        let paths: Vec<_> = journal.snapshot().into_iter().map(|n| n.source_path).collect();
        assert_eq!(paths, vec![PathBuf::from("/src/a.md"), PathBuf::from("/src/b.md")]);
    }

    #[test]
    fn test_corrupt_journal_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.json");
        fs::write(&path, "{ this is not json").unwrap();

        let err = Journal::open(&path).unwrap_err();

        assert!(is_fatal(&err));
        assert!(err.to_string().contains("corrupt"));
        assert!(err.to_string().contains("journal.json"));
        // The corrupt file is left for the operator
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ this is not json");
    }

    #[test]
    fn test_duplicate_entries_are_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.json");
        let entry = note("/src/a.md", b"a", "a.md");
        let document = JournalDocument {
            version: JOURNAL_VERSION,
            notes: vec![entry.clone(), entry],
        };
        fs::write(&path, serde_json::to_vec(&document).unwrap()).unwrap();

        assert!(is_fatal(&Journal::open(&path).unwrap_err()));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.json");
        fs::write(&path, r#"{"version": 99, "notes": []}"#).unwrap();

        assert!(is_fatal(&Journal::open(&path).unwrap_err()));
    }

    #[test]
    fn test_names_claimed_by_others() {
        let tmp = TempDir::new().unwrap();
        let journal = Journal::open(&tmp.path().join("journal.json")).unwrap();

        journal.upsert(note("/src/a.md", b"a", "a.md")).unwrap();
        let mut gone = note("/src/b.md", b"b", "b.md");
        gone.deleted = true;
        journal.upsert(gone).unwrap();

        let live_only = journal.names_claimed_by_others(Path::new("/src/c.md"), false);
        assert_eq!(live_only, HashSet::from(["a.md".to_string()]));

        let with_tombstones = journal.names_claimed_by_others(Path::new("/src/a.md"), true);
        assert_eq!(with_tombstones, HashSet::from(["b.md".to_string()]));
    }

    #[test]
    fn test_concurrent_upserts_all_land() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("journal.json");
        let journal = std::sync::Arc::new(Journal::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let journal = journal.clone();
                std::thread::spawn(move || {
                    let p = format!("/src/{i}.md");
                    journal.upsert(note(&p, p.as_bytes(), &format!("{i}.md"))).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(journal.len(), 8);
        assert_eq!(Journal::open(&path).unwrap().len(), 8);
    }
}
