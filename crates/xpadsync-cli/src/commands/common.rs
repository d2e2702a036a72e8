//! Common types and utilities for command execution

use std::path::{Path, PathBuf};

use anyhow::Context;
use xpadsync_core::config::{ConfigManager, Settings};

/// Options shared by every command
pub struct CommandOptions<'a> {
    /// Only report errors
    pub quiet: bool,
    /// Path to custom config file
    pub config_path: Option<&'a Path>,
    /// Skip loading all config files
    pub no_config: bool,
    /// Source directory override
    pub source: Option<PathBuf>,
    /// Output directory override
    pub output: Option<PathBuf>,
    /// Journal location override
    pub journal: Option<PathBuf>,
    /// Debounce window override
    pub debounce_ms: Option<u64>,
}

impl CommandOptions<'_> {
    /// Load config files, apply flag overrides, and resolve settings
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is invalid or the resolved settings
    /// fail validation.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut config = ConfigManager::load(self.config_path, self.no_config)
            .context("Failed to load configuration")?;

        if let Some(source) = &self.source {
            config.source_dir = Some(source.clone());
        }
        if let Some(output) = &self.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(journal) = &self.journal {
            config.journal_path = Some(journal.clone());
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = Some(ms);
        }

        Settings::resolve(&config).context("Invalid configuration")
    }
}
