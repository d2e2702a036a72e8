//! Event debouncing for file system watching
//!
//! Each path is either idle or pending with a deadline. An event for an idle
//! path makes it pending with `deadline = observed_at + window`; a further
//! event while pending pushes the deadline out again. Once a deadline passes
//! with no new events, one [`SettledSignal`] is emitted and the path goes back
//! to idle. Paths are debounced independently.
//!
//! The state machine ([`Coalescer::observe`], [`Coalescer::take_settled`]) is
//! plain data so it can be driven with synthetic instants; [`Coalescer::run`]
//! wraps it in a loop over the watcher channel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// Longest the run loop sleeps before re-checking for shutdown
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Kind of raw filesystem change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    /// File appeared
    Created,
    /// File content or metadata changed
    Modified,
    /// File disappeared
    Deleted,
    /// File was renamed from or to this path
    Renamed,
}

/// One filesystem notification for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Affected path
    pub path: PathBuf,
    /// What happened
    pub kind: RawEventKind,
    /// When the event was received
    pub observed_at: Instant,
}

impl RawEvent {
    /// Event observed now
    #[must_use]
    pub fn now(path: PathBuf, kind: RawEventKind) -> Self {
        Self {
            path,
            kind,
            observed_at: Instant::now(),
        }
    }
}

/// A path whose edits have stopped for a full debounce window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledSignal {
    /// Path to evaluate
    pub path: PathBuf,
    /// Deadline that elapsed
    pub settled_at: Instant,
}

/// Debounces raw events per path
#[derive(Debug)]
pub struct Coalescer {
    window: Duration,
    /// Deadline of every pending path
    pending: HashMap<PathBuf, Instant>,
}

impl Coalescer {
    /// Create a coalescer with the given debounce window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record an event, starting or extending the path's deadline
    pub fn observe(&mut self, event: &RawEvent) {
        let deadline = event.observed_at + self.window;
        let slot = self.pending.entry(event.path.clone()).or_insert(deadline);
        if deadline > *slot {
            *slot = deadline;
        }
        trace!(path = %event.path.display(), kind = ?event.kind, "event coalesced");
    }

    /// Earliest pending deadline
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().min().copied()
    }

    /// Remove and return every path whose deadline is at or before `now`,
    /// earliest first
    pub fn take_settled(&mut self, now: Instant) -> Vec<SettledSignal> {
        let mut settled: Vec<SettledSignal> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, deadline)| SettledSignal {
                path: path.clone(),
                settled_at: *deadline,
            })
            .collect();

        for signal in &settled {
            self.pending.remove(&signal.path);
        }
        settled.sort_by(|a, b| a.settled_at.cmp(&b.settled_at).then_with(|| a.path.cmp(&b.path)));
        settled
    }

    /// Number of pending paths
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop every pending deadline without emitting signals
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Consume events until the channel closes or `shutdown` is set
    ///
    /// Settled signals are handed to `emit` in deadline order. Pending paths
    /// are discarded on exit; they are picked up by the next one-shot run.
    pub fn run(
        mut self,
        events: &Receiver<RawEvent>,
        shutdown: &AtomicBool,
        mut emit: impl FnMut(SettledSignal),
    ) {
        loop {
            if shutdown.load(Ordering::SeqCst) {
                break;
            }

            let timeout = self
                .next_deadline()
                .map_or(SHUTDOWN_POLL, |deadline| {
                    deadline.saturating_duration_since(Instant::now())
                })
                .min(SHUTDOWN_POLL);

            match events.recv_timeout(timeout) {
                Ok(event) => self.observe(&event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            for signal in self.take_settled(Instant::now()) {
                debug!(path = %signal.path.display(), "settled");
                emit(signal);
            }
        }

        let dropped = self.cancel_all();
        if dropped > 0 {
            debug!(dropped, "discarded unsettled paths on shutdown");
        }
    }
}
