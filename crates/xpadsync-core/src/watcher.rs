//! Source directory enumeration and change subscription
//!
//! Both entry points apply the same [`PathFilter`], so a file that a one-shot
//! run would evaluate is exactly a file whose changes the watcher forwards.

use std::path::{Path, PathBuf};
use std::sync::mpsc::SyncSender;

use anyhow::Context;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::atomic::is_temp_file;
use crate::coalescer::{RawEvent, RawEventKind};
use crate::config::PatternMatcher;
use crate::error::{FatalError, Result};

/// Decides which paths under the source root are notes
#[derive(Debug, Clone)]
pub struct PathFilter {
    root: PathBuf,
    patterns: PatternMatcher,
    recursive: bool,
}

impl PathFilter {
    /// Create a filter rooted at `root`
    #[must_use]
    pub fn new(root: PathBuf, patterns: PatternMatcher, recursive: bool) -> Self {
        Self {
            root,
            patterns,
            recursive,
        }
    }

    /// Source root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether subdirectories are followed
    #[must_use]
    pub const fn recursive(&self) -> bool {
        self.recursive
    }

    /// Whether `path` names a note file
    ///
    /// The path need not exist; deleted notes still match. Directories,
    /// in-flight temp files, and paths outside the root never match.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.as_os_str().is_empty() || is_temp_file(path) || path.is_dir() {
            return false;
        }
        if !self.recursive && relative.components().count() != 1 {
            return false;
        }
        self.patterns.should_include(relative, false)
    }
}

/// Entry points for observing the source directory
pub struct DirectoryWatcher;

impl DirectoryWatcher {
    /// List every note currently in the source directory
    ///
    /// Results are sorted by path and reported as synthetic `Modified` events.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::SourceUnavailable`] if the root is not a
    /// directory, or an error if it cannot be read.
    pub fn enumerate(filter: &PathFilter) -> Result<Vec<RawEvent>> {
        ensure_directory(filter.root())?;

        let max_depth = if filter.recursive() { usize::MAX } else { 1 };
        let mut paths = Vec::new();
        for entry in WalkDir::new(filter.root())
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(e).with_context(|| {
                        format!("Failed to read source directory: {}", filter.root().display())
                    });
                }
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && filter.matches(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        debug!(count = paths.len(), root = %filter.root().display(), "enumerated notes");
        Ok(paths
            .into_iter()
            .map(|path| RawEvent::now(path, RawEventKind::Modified))
            .collect())
    }

    /// Subscribe to changes under the source directory
    ///
    /// Matching events are sent to `events`; the sender blocks when the
    /// queue is full. The subscription lasts as long as the returned watcher.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::SourceUnavailable`] if the root is not a
    /// directory, or [`FatalError::WatchFailed`] if the OS subscription
    /// cannot be set up.
    pub fn subscribe(filter: PathFilter, events: SyncSender<RawEvent>) -> Result<RecommendedWatcher> {
        ensure_directory(filter.root())?;

        let root = filter.root().to_path_buf();
        let mode = if filter.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for raw in map_notify_event(event) {
                        if !filter.matches(&raw.path) {
                            continue;
                        }
                        trace!(path = %raw.path.display(), kind = ?raw.kind, "raw event");
                        if events.send(raw).is_err() {
                            debug!("watch event dropped because the coalescer has stopped");
                            return;
                        }
                    }
                }
                Err(e) => warn!(error = %e, "watch backend error"),
            }
        })
        .map_err(|source| FatalError::WatchFailed {
            path: root.clone(),
            source,
        })?;

        watcher
            .watch(&root, mode)
            .map_err(|source| FatalError::WatchFailed {
                path: root.clone(),
                source,
            })?;

        debug!(root = %root.display(), ?mode, "watching source directory");
        Ok(watcher)
    }
}

fn ensure_directory(root: &Path) -> Result<()> {
    if root.is_dir() {
        Ok(())
    } else {
        Err(FatalError::SourceUnavailable {
            path: root.to_path_buf(),
        }
        .into())
    }
}

/// Translate one backend event into per-path raw events
///
/// Access notifications are dropped: the engine reads sources while syncing
/// and must not retrigger itself.
fn map_notify_event(event: Event) -> Vec<RawEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => RawEventKind::Created,
        EventKind::Modify(ModifyKind::Name(_)) => RawEventKind::Renamed,
        EventKind::Modify(_) => RawEventKind::Modified,
        EventKind::Remove(_) => RawEventKind::Deleted,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| RawEvent::now(path, kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};
    use std::fs;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn filter(root: &Path) -> PathFilter {
        PathFilter::new(root.to_path_buf(), PatternMatcher::default(), false)
    }

    fn names(events: &[RawEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| e.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_enumerate_lists_sorted_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.md"), "b").unwrap();
        fs::write(tmp.path().join("a.md"), "a").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/c.md"), "c").unwrap();

        let events = DirectoryWatcher::enumerate(&filter(tmp.path())).unwrap();

        assert_eq!(names(&events), vec!["a.md", "b.md"]);
        assert!(events.iter().all(|e| e.kind == RawEventKind::Modified));
    }

    #[test]
    fn test_enumerate_recursive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.md"), "a").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/c.md"), "c").unwrap();

        let filter = PathFilter::new(tmp.path().to_path_buf(), PatternMatcher::default(), true);
        let events = DirectoryWatcher::enumerate(&filter).unwrap();

        assert_eq!(names(&events), vec!["a.md", "c.md"]);
    }

    #[test]
    fn test_enumerate_applies_patterns_and_skips_temp_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("content-1"), "a").unwrap();
        fs::write(tmp.path().join("info-1"), "b").unwrap();
        fs::write(tmp.path().join(".content-2.42.xpadsync-tmp"), "c").unwrap();

        let patterns =
            PatternMatcher::with_patterns(&["content-*".to_string()], &[]).unwrap();
        let filter = PathFilter::new(tmp.path().to_path_buf(), patterns, false);

        let events = DirectoryWatcher::enumerate(&filter).unwrap();
        assert_eq!(names(&events), vec!["content-1"]);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");

        let err = DirectoryWatcher::enumerate(&filter(&missing)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FatalError>(),
            Some(FatalError::SourceUnavailable { .. })
        ));

        let (tx, _rx) = mpsc::sync_channel(4);
        let err = DirectoryWatcher::subscribe(filter(&missing), tx).unwrap_err();
        assert!(crate::error::is_fatal(&err));
    }

    #[test]
    fn test_filter_matches_deleted_paths() {
        let tmp = TempDir::new().unwrap();
        let filter = filter(tmp.path());

        assert!(filter.matches(&tmp.path().join("gone.md")));
        assert!(!filter.matches(&tmp.path().join("sub/gone.md")));
        assert!(!filter.matches(Path::new("/elsewhere/gone.md")));
        assert!(!filter.matches(tmp.path()));
    }

    #[test]
    fn test_map_notify_event_kinds() {
        let path = PathBuf::from("/n/a.md");
        let map = |kind| map_notify_event(Event::new(kind).add_path(path.clone()));

        assert_eq!(map(EventKind::Create(CreateKind::File))[0].kind, RawEventKind::Created);
        assert_eq!(
            map(EventKind::Modify(ModifyKind::Data(DataChange::Content)))[0].kind,
            RawEventKind::Modified
        );
        assert_eq!(
            map(EventKind::Modify(ModifyKind::Name(RenameMode::To)))[0].kind,
            RawEventKind::Renamed
        );
        assert_eq!(map(EventKind::Remove(RemoveKind::File))[0].kind, RawEventKind::Deleted);
        assert!(map(EventKind::Access(AccessKind::Any)).is_empty());
    }

    #[test]
    fn test_subscribe_forwards_changes() {
        let tmp = TempDir::new().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        let (tx, rx) = mpsc::sync_channel(64);

        let _watcher = DirectoryWatcher::subscribe(filter(&root), tx).unwrap();
        fs::write(root.join("today.md"), "hello").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = false;
        while Instant::now() < deadline {
            if let Ok(event) = rx.recv_timeout(Duration::from_millis(100)) {
                if event.path == root.join("today.md") {
                    seen = true;
                    break;
                }
            }
        }
        assert!(seen, "no event for today.md");
    }
}
