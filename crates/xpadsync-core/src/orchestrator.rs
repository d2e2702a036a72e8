//! Run orchestration
//!
//! A [`RunOrchestrator`] owns one loaded journal and one engine. It drives
//! either a single pass over the source directory or a continuous monitor
//! pipeline:
//!
//! ```text
//! watcher ──bounded queue──▶ coalescer ──shard by path──▶ N workers ──▶ engine
//! ```
//!
//! Settled signals for one path always land on the same worker, so
//! evaluations of one path never overlap and run in signal order.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::activity::ActivityLog;
use crate::atomic::remove_stale_temp_files;
use crate::coalescer::{Coalescer, RawEvent, SettledSignal};
use crate::config::Settings;
use crate::error::{FatalError, Result};
use crate::journal::Journal;
use crate::sync::{RunReport, SyncEngine};
use crate::watcher::{DirectoryWatcher, PathFilter};

/// Read-only view of the mirror's state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Configured source directory
    pub source_dir: PathBuf,
    /// Whether the source directory exists
    pub source_exists: bool,
    /// Configured output directory
    pub output_dir: PathBuf,
    /// Whether the output directory exists
    pub output_exists: bool,
    /// Journal file location
    pub journal_path: PathBuf,
    /// Notes currently in the source directory, if it exists
    pub source_files: Option<usize>,
    /// Journal entries
    pub tracked: usize,
    /// Entries that are not tombstoned
    pub live: usize,
    /// Tombstoned entries
    pub deleted: usize,
    /// Destination names of live entries whose output file is missing
    pub missing_outputs: Vec<String>,
    /// Most recent sync time across all entries
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Drives one-shot and continuous runs
#[derive(Debug)]
pub struct RunOrchestrator {
    settings: Settings,
    filter: PathFilter,
    engine: SyncEngine,
}

impl RunOrchestrator {
    /// Load the journal and prepare an engine
    ///
    /// The journal is loaded before anything touches the output directory,
    /// so a corrupt journal aborts the run with the output left as it was.
    /// Leftover temp files from an interrupted run are removed afterwards.
    ///
    /// # Errors
    ///
    /// Returns a [`FatalError`] if the journal cannot be loaded or the source
    /// directory is missing, or an error if the activity log cannot be opened.
    pub fn new(mut settings: Settings) -> Result<Self> {
        let journal = Arc::new(Journal::open(&settings.journal_path)?);

        settings.source_dir = dunce::canonicalize(&settings.source_dir)
            .ok()
            .filter(|path| path.is_dir())
            .ok_or_else(|| FatalError::SourceUnavailable {
                path: settings.source_dir.clone(),
            })?;

        for dir in [Some(settings.output_dir.as_path()), settings.journal_path.parent()]
            .into_iter()
            .flatten()
        {
            let removed = remove_stale_temp_files(dir)?;
            if !removed.is_empty() {
                info!(dir = %dir.display(), count = removed.len(), "cleaned up interrupted writes");
            }
        }

        let activity = Arc::new(ActivityLog::open(&settings.activity_log)?);
        let filter = PathFilter::new(
            settings.source_dir.clone(),
            settings.pattern_matcher()?,
            settings.recursive,
        );
        let engine = SyncEngine::new(&settings, journal, activity);

        debug!(
            source = %settings.source_dir.display(),
            output = %settings.output_dir.display(),
            "orchestrator ready"
        );

        Ok(Self {
            settings,
            filter,
            engine,
        })
    }

    /// Settings in effect, with the source directory canonicalized
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Engine used for evaluations
    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Evaluate every note once
    ///
    /// Live journal entries whose source has vanished while nothing was
    /// watching are evaluated too, so deletions are not missed. Per-file
    /// failures are recorded in the report and do not stop the pass.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::SourceUnavailable`] if the source directory has
    /// disappeared, or an error if it cannot be listed.
    pub fn sync_once(&self, force: bool) -> Result<RunReport> {
        let events = DirectoryWatcher::enumerate(&self.filter)?;
        info!(count = events.len(), force, "syncing source directory");

        let mut report = RunReport::default();
        let mut seen = HashSet::with_capacity(events.len());
        for event in events {
            self.evaluate(&event.path, force, &mut report);
            seen.insert(event.path);
        }

        for note in self.engine.journal().snapshot() {
            if note.deleted || seen.contains(&note.source_path) || !self.filter.matches(&note.source_path) {
                continue;
            }
            debug!(path = %note.source_path.display(), "reconciling vanished note");
            self.evaluate(&note.source_path, force, &mut report);
        }

        Ok(report)
    }

    /// Sync once, then follow changes until `shutdown` is set
    ///
    /// The subscription is installed before the initial pass, so an edit
    /// made while the pass is running is queued and evaluated afterwards.
    ///
    /// # Errors
    ///
    /// Returns a [`FatalError`] if the change subscription or the initial
    /// pass fails.
    pub fn monitor(&self, shutdown: &AtomicBool) -> Result<RunReport> {
        let (tx, rx) = mpsc::sync_channel(self.settings.event_queue_capacity);
        let _watcher = DirectoryWatcher::subscribe(self.filter.clone(), tx)?;

        let mut report = self.sync_once(false)?;
        info!(
            source = %self.settings.source_dir.display(),
            debounce_ms = self.settings.debounce.as_millis(),
            "monitoring for changes"
        );

        report.merge(self.run_pipeline(&rx, shutdown));
        info!("monitor stopped");
        Ok(report)
    }

    /// Debounce `events` and evaluate settled paths on worker threads
    ///
    /// Returns when `shutdown` is set or the event channel closes. In-flight
    /// evaluations finish; unsettled and queued paths are dropped.
    pub fn run_pipeline(&self, events: &Receiver<RawEvent>, shutdown: &AtomicBool) -> RunReport {
        let workers = self.settings.workers.max(1);

        thread::scope(|scope| {
            let mut shards: Vec<Sender<SettledSignal>> = Vec::with_capacity(workers);
            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let (tx, rx) = mpsc::channel::<SettledSignal>();
                shards.push(tx);
                handles.push(scope.spawn(move || self.worker(id, &rx, shutdown)));
            }

            Coalescer::new(self.settings.debounce).run(events, shutdown, |signal| {
                let shard = shard_for(&signal.path, workers);
                if shards[shard].send(signal).is_err() {
                    warn!(shard, "worker has stopped, dropping signal");
                }
            });
            drop(shards);

            let mut report = RunReport::default();
            for handle in handles {
                match handle.join() {
                    Ok(worker_report) => report.merge(worker_report),
                    Err(_) => error!("sync worker panicked"),
                }
            }
            report
        })
    }

    /// Summarize the mirror's state without changing anything
    ///
    /// # Errors
    ///
    /// Returns a [`FatalError`] if the journal exists but cannot be loaded.
    pub fn status(settings: &Settings) -> Result<StatusReport> {
        let journal = Journal::open(&settings.journal_path)?;
        let notes = journal.snapshot();

        let source_files = match dunce::canonicalize(&settings.source_dir) {
            Ok(root) if root.is_dir() => {
                let filter = PathFilter::new(root, settings.pattern_matcher()?, settings.recursive);
                Some(DirectoryWatcher::enumerate(&filter)?.len())
            }
            _ => None,
        };

        let live: Vec<_> = notes.iter().filter(|n| !n.deleted).collect();
        let missing_outputs = live
            .iter()
            .filter(|n| !settings.output_dir.join(&n.destination_name).exists())
            .map(|n| n.destination_name.clone())
            .collect();

        Ok(StatusReport {
            source_dir: settings.source_dir.clone(),
            source_exists: source_files.is_some(),
            output_dir: settings.output_dir.clone(),
            output_exists: settings.output_dir.is_dir(),
            journal_path: settings.journal_path.clone(),
            source_files,
            tracked: notes.len(),
            live: live.len(),
            deleted: notes.len() - live.len(),
            missing_outputs,
            last_synced_at: notes.iter().map(|n| n.last_synced_at).max(),
        })
    }

    fn worker(&self, id: usize, signals: &Receiver<SettledSignal>, shutdown: &AtomicBool) -> RunReport {
        let mut report = RunReport::default();
        while let Ok(signal) = signals.recv() {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }
            debug!(worker = id, path = %signal.path.display(), "evaluating");
            self.evaluate(&signal.path, false, &mut report);
        }
        report
    }

    fn evaluate(&self, path: &Path, force: bool, report: &mut RunReport) {
        match self.engine.evaluate_and_sync(path, force) {
            Ok(outcome) => report.record(&outcome),
            Err(e) => {
                error!(path = %path.display(), error = %format!("{e:#}"), "sync failed");
                report.record_error(path, &e);
            }
        }
    }
}

fn shard_for(path: &Path, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}
