//! Per-file synchronization engine
//!
//! This module turns one source path into one [`SyncDecision`] and applies
//! it against the output directory, the journal, and the activity log.
//! Batch and continuous runs are driven from [`crate::orchestrator`].

mod actions;
mod engine;
mod executor;
mod reporting;

use std::collections::HashMap;
use std::path::Path;

pub use actions::{SyncActionResolver, SyncDecision};
pub use engine::SyncEngine;
pub use executor::FileOperationExecutor;
pub use reporting::SyncReporter;

/// Why an evaluation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Source is empty or whitespace-only
    Empty,
    /// Source exceeds the configured size limit
    TooLarge,
    /// Source is missing and was never synced
    NotTracked,
    /// Source is missing and its entry is already tombstoned
    AlreadyDeleted,
}

impl SkipReason {
    /// Human-readable reason
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Empty => "empty note",
            Self::TooLarge => "too large",
            Self::NotTracked => "not tracked",
            Self::AlreadyDeleted => "already deleted",
        }
    }
}

/// Result of evaluating one source path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A decision was made and applied
    Synced {
        /// The decision taken
        decision: SyncDecision,
        /// Destination file name involved
        destination_name: String,
    },
    /// Nothing was done
    Skipped(SkipReason),
}

impl SyncOutcome {
    /// The decision, if one was made
    #[must_use]
    pub const fn decision(&self) -> Option<SyncDecision> {
        match self {
            Self::Synced { decision, .. } => Some(*decision),
            Self::Skipped(_) => None,
        }
    }
}

/// Statistics of a run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Notes synced for the first time
    pub created: usize,
    /// Notes rewritten
    pub updated: usize,
    /// Notes whose content matched the journal
    pub unchanged: usize,
    /// Notes tombstoned
    pub deleted: usize,
    /// Evaluations that did nothing
    pub skipped: usize,
    /// Skip reasons with counts
    pub skip_reasons: HashMap<String, usize>,
    /// Per-file errors, one line each
    pub errors: Vec<String>,
}

impl RunReport {
    /// Count one evaluation outcome
    pub fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Synced { decision, .. } => match decision {
                SyncDecision::Create => self.created += 1,
                SyncDecision::Update => self.updated += 1,
                SyncDecision::Unchanged => self.unchanged += 1,
                SyncDecision::Delete => self.deleted += 1,
            },
            SyncOutcome::Skipped(reason) => {
                self.skipped += 1;
                *self
                    .skip_reasons
                    .entry(reason.describe().to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    /// Record a failed evaluation
    pub fn record_error(&mut self, path: &Path, error: &anyhow::Error) {
        self.errors.push(format!("{}: {error:#}", path.display()));
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
        for (reason, count) in other.skip_reasons {
            *self.skip_reasons.entry(reason).or_insert(0) += count;
        }
        self.errors.extend(other.errors);
    }

    /// Operations that touched the output directory
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Whether every evaluation succeeded
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
