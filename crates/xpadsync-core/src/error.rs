//! Error types
//!
//! Most fallible operations return [`Result`], an `anyhow` alias carrying the
//! offending path in its context chain. Conditions that must stop the process
//! are raised as a [`FatalError`] so callers can tell them apart from
//! per-file failures with `downcast_ref`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `anyhow::Error`
pub type Result<T> = anyhow::Result<T>;

/// Conditions under which the sync invariants cannot be upheld
#[derive(Debug, Error)]
pub enum FatalError {
    /// The journal exists but could not be parsed
    #[error(
        "journal at {path} is corrupt and was not loaded; repair or move it aside before running again"
    )]
    JournalCorrupt {
        /// Journal file location
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// The journal exists but could not be read
    #[error("journal at {path} could not be read")]
    JournalUnreadable {
        /// Journal file location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The source directory is missing or not a directory
    #[error("source directory {path} does not exist or is not a directory")]
    SourceUnavailable {
        /// Configured source directory
        path: PathBuf,
    },

    /// The OS-level change subscription could not be established
    #[error("failed to watch source directory {path}")]
    WatchFailed {
        /// Directory that was to be watched
        path: PathBuf,
        /// Notification backend error
        #[source]
        source: notify::Error,
    },
}

/// Whether an error chain contains a [`FatalError`]
#[must_use]
pub fn is_fatal(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<FatalError>())
}
