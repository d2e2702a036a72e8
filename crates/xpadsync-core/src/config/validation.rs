//! Configuration validation and error reporting

use chrono::format::{Item, StrftimeItems};

use super::Settings;
use super::types::Config;
use crate::error::Result;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a parsed configuration before defaults are applied
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(config: &Config) -> Result<()> {
        for pattern in &config.include {
            if pattern.trim().is_empty() {
                anyhow::bail!("Include pattern cannot be empty");
            }
        }

        for pattern in &config.ignore {
            if pattern.trim().is_empty() {
                anyhow::bail!("Ignore pattern cannot be empty");
            }
        }

        if config.prefix.as_deref().is_some_and(|p| p.trim().is_empty()) {
            anyhow::bail!("Destination prefix cannot be empty");
        }

        if let Some(format) = config.timestamp_format.as_deref() {
            Self::validate_timestamp_format(format)?;
        }

        Ok(())
    }

    /// Validate fully resolved settings
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate_settings(settings: &Settings) -> Result<()> {
        if settings.debounce.is_zero() {
            anyhow::bail!("Debounce window must be greater than zero");
        }

        if settings.workers == 0 {
            anyhow::bail!("At least one worker is required");
        }

        if settings.event_queue_capacity == 0 {
            anyhow::bail!("Event queue capacity must be greater than zero");
        }

        Self::validate_timestamp_format(&settings.naming.timestamp_format)?;

        if settings.naming.slug_max_length == 0 {
            anyhow::bail!("Slug length must be greater than zero");
        }

        if settings.naming.default_extension.trim().is_empty()
            || settings.naming.default_extension.contains(['/', '.'])
        {
            anyhow::bail!(
                "Invalid default extension: '{}'",
                settings.naming.default_extension
            );
        }

        let source = &settings.source_dir;
        let output = &settings.output_dir;
        if source.starts_with(output) || output.starts_with(source) {
            anyhow::bail!(
                "Source directory {} and output directory {} must not overlap",
                source.display(),
                output.display()
            );
        }

        Ok(())
    }

    fn validate_timestamp_format(format: &str) -> Result<()> {
        if format.contains('/') {
            anyhow::bail!("Timestamp format cannot contain path separators");
        }
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("Invalid timestamp format: '{format}'");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_validate_empty_config() {
        assert!(ConfigValidator::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_pattern() {
        let config = Config {
            include: vec!["   ".to_string()],
            ..Config::default()
        };

        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_empty_prefix() {
        let config = Config {
            prefix: Some(String::new()),
            ..Config::default()
        };
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_validate_default_settings() {
        let settings = Settings::for_dirs(PathBuf::from("/notes"), PathBuf::from("/drive/out"));
        assert!(ConfigValidator::validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_validate_zero_debounce() {
        let mut settings = Settings::for_dirs(PathBuf::from("/notes"), PathBuf::from("/out"));
        settings.debounce = Duration::ZERO;

        let err = ConfigValidator::validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("Debounce"));
    }

    #[test]
    fn test_validate_overlapping_dirs() {
        let nested = Settings::for_dirs(PathBuf::from("/notes"), PathBuf::from("/notes/out"));
        assert!(ConfigValidator::validate_settings(&nested).is_err());

        let same = Settings::for_dirs(PathBuf::from("/notes"), PathBuf::from("/notes"));
        assert!(ConfigValidator::validate_settings(&same).is_err());

        let siblings = Settings::for_dirs(PathBuf::from("/notes"), PathBuf::from("/notes-out"));
        assert!(ConfigValidator::validate_settings(&siblings).is_ok());
    }

    #[test]
    fn test_validate_timestamp_format() {
        let invalid = Config {
            timestamp_format: Some("%Q".to_string()),
            ..Config::default()
        };
        let err = ConfigValidator::validate(&invalid).unwrap_err();
        assert!(err.to_string().contains("Invalid timestamp format"));

        let slashed = Config {
            timestamp_format: Some("%Y/%m".to_string()),
            ..Config::default()
        };
        assert!(ConfigValidator::validate(&slashed).is_err());

        let valid = Config {
            timestamp_format: Some("%Y-%m-%d_%H%M".to_string()),
            ..Config::default()
        };
        assert!(ConfigValidator::validate(&valid).is_ok());

        let mut settings = Settings::for_dirs(PathBuf::from("/a"), PathBuf::from("/b"));
        settings.naming.timestamp_format = "%Q".to_string();
        assert!(ConfigValidator::validate_settings(&settings).is_err());
    }

    #[test]
    fn test_validate_zero_workers() {
        let mut settings = Settings::for_dirs(PathBuf::from("/a"), PathBuf::from("/b"));
        settings.workers = 0;
        assert!(ConfigValidator::validate_settings(&settings).is_err());
    }
}
