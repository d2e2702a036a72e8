//! Sync decision logic

use crate::fingerprint::Fingerprint;
use crate::journal::TrackedNote;

/// Outcome of comparing a source file against its journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncDecision {
    /// First sync of a path, or revival of a tombstoned one
    Create,
    /// Content changed, or a forced rewrite
    Update,
    /// Content matches the last sync
    Unchanged,
    /// Source disappeared
    Delete,
}

impl SyncDecision {
    /// Upper-case label used in the activity log
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Unchanged => "UNCHANGED",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the decision writes to or deletes from the output directory
    #[must_use]
    pub const fn touches_output(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl std::fmt::Display for SyncDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Resolves source state and journal state into a decision
pub struct SyncActionResolver;

impl SyncActionResolver {
    /// Decide what to do for one source path
    ///
    /// - `tracked`: the journal entry, if any
    /// - `current`: fingerprint of the source, `None` if it no longer exists
    /// - `force`: bypass the unchanged short-circuit
    /// - `destination_present`: whether the tracked destination file exists
    ///
    /// Returns `None` when there is nothing to do: the source is missing and
    /// either was never tracked or is already tombstoned.
    #[must_use]
    pub fn resolve(
        tracked: Option<&TrackedNote>,
        current: Option<&Fingerprint>,
        force: bool,
        destination_present: bool,
    ) -> Option<SyncDecision> {
        match (tracked, current) {
            (None, None) => None,
            (Some(note), None) => (!note.deleted).then_some(SyncDecision::Delete),
            (None, Some(_)) => Some(SyncDecision::Create),
            (Some(note), Some(_)) if note.deleted => Some(SyncDecision::Create),
            (Some(note), Some(fingerprint)) => {
                if force || note.fingerprint != *fingerprint || !destination_present {
                    Some(SyncDecision::Update)
                } else {
                    Some(SyncDecision::Unchanged)
                }
            }
        }
    }
}
