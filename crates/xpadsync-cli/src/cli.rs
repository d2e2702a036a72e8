use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Xpad Note Mirror
///
/// Mirror xpad sticky notes into a cloud-synced folder as individually named files
#[derive(Parser, Debug)]
#[command(name = "xpadsync")]
#[command(about, long_about = None, version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use specific config file
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Ignore all config files
    #[arg(long, global = true, conflicts_with = "config")]
    pub no_config: bool,

    /// Override source directory (default: ~/.config/xpad)
    #[arg(long, global = true, value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Override output directory (default: ~/GoogleDrive/XpadSync)
    #[arg(long, global = true, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override journal location (default: <output>/.xpad_sync_metadata.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub journal: Option<PathBuf>,

    /// Override debounce window in milliseconds (default: 2000)
    #[arg(long, global = true, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync every note once and exit
    Sync {
        /// Rewrite every note even if unchanged
        #[arg(long)]
        force: bool,
    },

    /// Sync once, then keep watching for changes until interrupted
    Monitor,

    /// Show mirror status without making changes
    Status,
}
