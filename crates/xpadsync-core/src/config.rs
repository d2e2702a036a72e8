//! Configuration file parsing, merging, and filename filtering
//!
//! This module handles:
//! - Config file discovery from the CLI flag, the working directory, and XDG
//! - TOML parsing with serde
//! - Layering of config files with precedence rules
//! - Gitignore-style allowlist matching
//! - Resolution of defaults into [`Settings`] and validation

mod discovery;
mod merge;
mod patterns;
mod types;
mod validation;

#[cfg(test)]
mod integration_tests;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

pub use discovery::{ConfigDiscovery, ConfigFiles, PROJECT_CONFIG_NAME};
pub use merge::ConfigMerger;
pub use patterns::PatternMatcher;
pub use types::{Config, DeletePolicy};
pub use validation::ConfigValidator;

use crate::error::Result;
use crate::naming::NamingPolicy;

const DEFAULT_SOURCE_DIR: &str = "~/.config/xpad";
const DEFAULT_OUTPUT_DIR: &str = "~/GoogleDrive/XpadSync";
const JOURNAL_FILE_NAME: &str = ".xpad_sync_metadata.json";
const ACTIVITY_LOG_FILE_NAME: &str = "xpad_sync.log";
const DEFAULT_DEBOUNCE_MS: u64 = 2000;
const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
const DEFAULT_WORKERS: usize = 2;
const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Configuration manager that coordinates discovery, parsing, merging, and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load and merge configuration from all sources
    ///
    /// With `no_config` set, discovery is skipped and defaults are used.
    ///
    /// # Errors
    ///
    /// Returns an error if config files are invalid or cannot be read.
    pub fn load(cli_config_path: Option<&Path>, no_config: bool) -> Result<Config> {
        if no_config {
            return Ok(Config::default());
        }

        let config_files = ConfigDiscovery::discover(cli_config_path);
        let merged = ConfigMerger::merge(&config_files)?;
        ConfigValidator::validate(&merged)?;

        Ok(merged)
    }
}

/// Fully resolved settings consumed by the sync core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the notes to mirror
    pub source_dir: PathBuf,
    /// Cloud-synced output directory
    pub output_dir: PathBuf,
    /// Journal file location
    pub journal_path: PathBuf,
    /// Activity log location
    pub activity_log: PathBuf,
    /// Debounce window
    pub debounce: Duration,
    /// Filename allowlist
    pub include: Vec<String>,
    /// Exclusion patterns
    pub ignore: Vec<String>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Output handling for deleted notes
    pub on_delete: DeletePolicy,
    /// Skip empty or whitespace-only sources
    pub skip_empty: bool,
    /// Largest source size in bytes that is synced
    pub max_file_size: u64,
    /// Destination naming settings
    pub naming: NamingPolicy,
    /// Evaluation threads in monitor mode
    pub workers: usize,
    /// Capacity of the watcher event queue
    pub event_queue_capacity: usize,
}

impl Settings {
    /// Default settings for a given source/output pair
    #[must_use]
    pub fn for_dirs(source_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            journal_path: output_dir.join(JOURNAL_FILE_NAME),
            activity_log: output_dir.join(ACTIVITY_LOG_FILE_NAME),
            source_dir,
            output_dir,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            include: Vec::new(),
            ignore: Vec::new(),
            recursive: false,
            on_delete: DeletePolicy::default(),
            skip_empty: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            naming: NamingPolicy::default(),
            workers: DEFAULT_WORKERS,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }

    /// Apply defaults to a parsed configuration and validate the result
    ///
    /// # Errors
    ///
    /// Returns an error if a `~` path cannot be expanded or the resolved
    /// settings are invalid.
    pub fn resolve(config: &Config) -> Result<Self> {
        let source_dir = expand_home(
            config
                .source_dir
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_SOURCE_DIR)),
        )?;
        let output_dir = expand_home(
            config
                .output_dir
                .as_deref()
                .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR)),
        )?;

        let mut settings = Self::for_dirs(source_dir, output_dir);

        if let Some(path) = &config.journal_path {
            settings.journal_path = expand_home(path)?;
        }
        if let Some(path) = &config.activity_log {
            settings.activity_log = expand_home(path)?;
        }
        if let Some(ms) = config.debounce_ms {
            settings.debounce = Duration::from_millis(ms);
        }
        settings.include.clone_from(&config.include);
        settings.ignore.clone_from(&config.ignore);
        settings.recursive = config.recursive.unwrap_or(settings.recursive);
        settings.on_delete = config.on_delete.unwrap_or(settings.on_delete);
        settings.skip_empty = config.skip_empty.unwrap_or(settings.skip_empty);
        if let Some(mb) = config.max_file_size_mb {
            settings.max_file_size = mb.saturating_mul(1024 * 1024);
        }
        if let Some(prefix) = &config.prefix {
            settings.naming.prefix.clone_from(prefix);
        }
        if let Some(format) = &config.timestamp_format {
            settings.naming.timestamp_format.clone_from(format);
        }
        if let Some(len) = config.slug_max_length {
            settings.naming.slug_max_length = len;
        }
        if let Some(ext) = &config.default_extension {
            settings.naming.default_extension = ext.trim_start_matches('.').to_string();
        }
        settings.workers = config.workers.unwrap_or(settings.workers);
        settings.event_queue_capacity = config
            .event_queue_capacity
            .unwrap_or(settings.event_queue_capacity);

        ConfigValidator::validate_settings(&settings)?;
        Ok(settings)
    }

    /// Compile the filename allowlist
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid.
    pub fn pattern_matcher(&self) -> Result<PatternMatcher> {
        PatternMatcher::with_patterns(&self.include, &self.ignore)
    }
}

/// Expand a leading `~` to the user's home directory
///
/// # Errors
///
/// Returns an error if the path starts with `~` and no home directory is known.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = dirs::home_dir()
        .with_context(|| format!("Failed to determine home directory for {}", path.display()))?;
    Ok(home.join(rest))
}
