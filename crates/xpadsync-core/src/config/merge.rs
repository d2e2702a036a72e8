//! Configuration merging with precedence rules
//!
//! # Merging Semantics
//!
//! - **Scalars**: a value set in a higher-precedence file replaces the lower one
//! - **Pattern lists** (`include`, `ignore`): additive across all files

use std::fs;
use std::path::Path;

use anyhow::Context;

use super::discovery::ConfigFiles;
use super::types::Config;
use crate::error::Result;

/// Configuration merger
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge discovered config files
    ///
    /// Precedence order (highest to lowest):
    /// 1. CLI config
    /// 2. `.xpadsync.toml`
    /// 3. Global config
    ///
    /// # Errors
    ///
    /// Returns an error if config files cannot be read or parsed.
    pub fn merge(files: &ConfigFiles) -> Result<Config> {
        let mut merged = Config::default();

        // Lowest precedence first
        for path in [&files.global, &files.project, &files.cli].into_iter().flatten() {
            let config = Self::load(path)?;
            Self::overlay(&mut merged, config);
        }

        Ok(merged)
    }

    /// Parse a single config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `top` over `base`
    pub fn overlay(base: &mut Config, top: Config) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut base.source_dir, top.source_dir);
        take(&mut base.output_dir, top.output_dir);
        take(&mut base.journal_path, top.journal_path);
        take(&mut base.activity_log, top.activity_log);
        take(&mut base.debounce_ms, top.debounce_ms);
        take(&mut base.recursive, top.recursive);
        take(&mut base.on_delete, top.on_delete);
        take(&mut base.skip_empty, top.skip_empty);
        take(&mut base.max_file_size_mb, top.max_file_size_mb);
        take(&mut base.prefix, top.prefix);
        take(&mut base.timestamp_format, top.timestamp_format);
        take(&mut base.slug_max_length, top.slug_max_length);
        take(&mut base.default_extension, top.default_extension);
        take(&mut base.workers, top.workers);
        take(&mut base.event_queue_capacity, top.event_queue_capacity);

        base.include.extend(top.include);
        base.ignore.extend(top.ignore);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeletePolicy;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_merge_no_files() {
        let config = ConfigMerger::merge(&ConfigFiles::default()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_merge_precedence() {
        let tmp = TempDir::new().unwrap();

        let global = tmp.path().join("global.toml");
        fs::write(
            &global,
            r#"
output_dir = "/global/out"
debounce_ms = 1000
include = ["content-*"]
"#,
        )
        .unwrap();

        let cli = tmp.path().join("cli.toml");
        fs::write(
            &cli,
            r#"
debounce_ms = 5000
include = ["*.md"]
on_delete = "retain"
"#,
        )
        .unwrap();

        let files = ConfigFiles {
            cli: Some(cli),
            project: None,
            global: Some(global),
        };
        let config = ConfigMerger::merge(&files).unwrap();

        assert_eq!(config.output_dir, Some(PathBuf::from("/global/out")));
        assert_eq!(config.debounce_ms, Some(5000));
        assert_eq!(config.on_delete, Some(DeletePolicy::Retain));
        assert_eq!(config.include, vec!["content-*".to_string(), "*.md".to_string()]);
    }

    #[test]
    fn test_merge_missing_cli_file_errors() {
        let tmp = TempDir::new().unwrap();
        let files = ConfigFiles {
            cli: Some(tmp.path().join("missing.toml")),
            ..ConfigFiles::default()
        };

        let err = ConfigMerger::merge(&files).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_merge_invalid_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("bad.toml");
        fs::write(&bad, "debounce_ms = [").unwrap();

        let err = ConfigMerger::load(&bad).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
