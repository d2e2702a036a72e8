//! Integration tests for configuration module

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use super::{ConfigManager, DeletePolicy, Settings};

#[test]
fn test_full_config_workflow() {
    let tmp = TempDir::new().unwrap();
    let config_file = tmp.path().join("config.toml");

    fs::write(
        &config_file,
        r#"
source_dir = "/home/robin/.config/xpad"
output_dir = "/home/robin/GoogleDrive/XpadSync"
debounce_ms = 5000
include = ["content-*"]
ignore = ["*.bak"]
on_delete = "retain"
recursive = false
prefix = "xpad_note_"
workers = 4
"#,
    )
    .unwrap();

    let config = ConfigManager::load(Some(&config_file), false).unwrap();
    let settings = Settings::resolve(&config).unwrap();

    assert_eq!(settings.source_dir, PathBuf::from("/home/robin/.config/xpad"));
    assert_eq!(settings.debounce, Duration::from_secs(5));
    assert_eq!(settings.on_delete, DeletePolicy::Retain);
    assert_eq!(settings.workers, 4);

    let matcher = settings.pattern_matcher().unwrap();
    assert!(matcher.should_include(&PathBuf::from("content-ABC"), false));
    assert!(!matcher.should_include(&PathBuf::from("content-ABC.bak"), false));
    assert!(!matcher.should_include(&PathBuf::from("info-ABC"), false));
}

#[test]
fn test_invalid_config_validation() {
    let tmp = TempDir::new().unwrap();
    let config_file = tmp.path().join("config.toml");

    fs::write(&config_file, r#"include = [""]"#).unwrap();

    let result = ConfigManager::load(Some(&config_file), false);

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("cannot be empty"));
}

#[test]
fn test_no_config_ignores_cli_path() {
    let tmp = TempDir::new().unwrap();
    let config_file = tmp.path().join("config.toml");
    fs::write(&config_file, "this is not toml").unwrap();

    assert!(ConfigManager::load(Some(&config_file), true).is_ok());
}
