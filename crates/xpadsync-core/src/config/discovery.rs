//! Configuration file discovery from multiple locations

use std::path::{Path, PathBuf};

/// Name of the per-directory config file
pub const PROJECT_CONFIG_NAME: &str = ".xpadsync.toml";

/// Configuration file locations in order of precedence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFiles {
    /// Config from CLI flag (highest precedence)
    pub cli: Option<PathBuf>,
    /// `.xpadsync.toml` in the current directory or a parent
    pub project: Option<PathBuf>,
    /// Global XDG config
    pub global: Option<PathBuf>,
}

/// Config file discovery
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Discover all available configuration files
    ///
    /// An explicit CLI path is returned as given, even if it does not exist,
    /// so that a typo surfaces as a read error instead of being ignored.
    #[must_use]
    pub fn discover(cli_path: Option<&Path>) -> ConfigFiles {
        ConfigFiles {
            cli: cli_path.map(Path::to_path_buf),
            project: std::env::current_dir()
                .ok()
                .and_then(|cwd| Self::find_upward(&cwd, PROJECT_CONFIG_NAME)),
            global: Self::find_global_config(),
        }
    }

    /// Find a file in `start` or one of its parent directories
    #[must_use]
    pub fn find_upward(start: &Path, name: &str) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Find global config in XDG config directory
    fn find_global_config() -> Option<PathBuf> {
        let global_config = dirs::config_dir()?.join("xpadsync").join("config.toml");
        global_config.is_file().then_some(global_config)
    }
}
