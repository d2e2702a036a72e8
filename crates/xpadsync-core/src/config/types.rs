//! Configuration types and structures

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What happens to the output file of a note whose source disappeared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Remove the output file
    #[default]
    Remove,
    /// Keep the output file; only the journal entry is tombstoned
    Retain,
}

/// Configuration as read from a TOML file
///
/// Every scalar is optional so that files can be layered; unset values fall
/// back to the defaults in [`Settings`](super::Settings).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the notes to mirror
    pub source_dir: Option<PathBuf>,

    /// Cloud-synced directory the notes are written into
    pub output_dir: Option<PathBuf>,

    /// Journal file location
    pub journal_path: Option<PathBuf>,

    /// Activity log location
    pub activity_log: Option<PathBuf>,

    /// Quiet period after the last change before a note is synced
    pub debounce_ms: Option<u64>,

    /// Filename allowlist (gitignore-style globs); empty means every file
    #[serde(default)]
    pub include: Vec<String>,

    /// Patterns excluded even when allowlisted
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Descend into subdirectories of the source directory
    pub recursive: Option<bool>,

    /// Handling of output files for deleted notes
    pub on_delete: Option<DeletePolicy>,

    /// Skip sources that are empty or whitespace-only
    pub skip_empty: Option<bool>,

    /// Skip sources larger than this many megabytes
    pub max_file_size_mb: Option<u64>,

    /// Destination name prefix
    pub prefix: Option<String>,

    /// `strftime` format of the timestamp in destination names
    pub timestamp_format: Option<String>,

    /// Maximum length of the name slug
    pub slug_max_length: Option<usize>,

    /// Extension for sources that have none
    pub default_extension: Option<String>,

    /// Evaluation threads in monitor mode
    pub workers: Option<usize>,

    /// Capacity of the watcher event queue
    pub event_queue_capacity: Option<usize>,
}
