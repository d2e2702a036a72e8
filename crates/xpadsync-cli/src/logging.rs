//! Tracing subscriber setup
//!
//! Priority, highest first: `XPADSYNC_LOG`, `RUST_LOG`, then the
//! `--verbose`/`--quiet` flags. Logs go to stderr so that command output on
//! stdout stays clean.

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const LOG_ENV_VAR: &str = "XPADSYNC_LOG";
const TARGET_PREFIX: &str = "xpadsync";

/// Verbosity level derived from CLI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `--quiet`: errors only
    Quiet,
    /// Default: sync decisions and warnings
    Normal,
    /// `--verbose`: debug output
    Verbose,
}

impl Verbosity {
    /// Determine verbosity from the parsed flags; verbose wins over quiet
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    fn directive(self) -> String {
        match self {
            Self::Quiet => Level::ERROR.to_string(),
            Self::Normal => format!("{},{TARGET_PREFIX}=info", Level::WARN),
            Self::Verbose => format!("{},{TARGET_PREFIX}=debug", Level::INFO),
        }
    }
}

/// Install the global subscriber
///
/// Call once, before configuration is loaded.
pub fn init(verbosity: Verbosity) {
    let use_ansi = std::io::IsTerminal::is_terminal(&std::io::stderr());
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(verbosity == Verbosity::Verbose);

    let _ = tracing_subscriber::registry()
        .with(build_env_filter(verbosity))
        .with(fmt_layer.compact())
        .try_init();
}

fn build_env_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV_VAR)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::try_new(verbosity.directive()).unwrap_or_else(|_| EnvFilter::new("warn"))
}
