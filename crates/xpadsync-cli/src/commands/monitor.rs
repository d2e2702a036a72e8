use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use tracing::info;
use xpadsync_core::orchestrator::RunOrchestrator;
use xpadsync_core::sync::SyncReporter;

use super::common::CommandOptions;

pub struct Monitor;

impl Monitor {
    pub fn execute(options: &CommandOptions<'_>) -> anyhow::Result<()> {
        let settings = options.settings()?;
        let orchestrator = RunOrchestrator::new(settings)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("shutdown requested");
            flag.store(true, Ordering::SeqCst);
        })
        .context("Failed to install signal handler")?;

        let report = orchestrator.monitor(&shutdown)?;

        if !options.quiet {
            print!("{}", SyncReporter::generate_summary(&report));
        }

        Ok(())
    }
}
