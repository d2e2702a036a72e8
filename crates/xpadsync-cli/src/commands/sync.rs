use anyhow::Context;
use xpadsync_core::orchestrator::RunOrchestrator;
use xpadsync_core::sync::SyncReporter;

use super::common::CommandOptions;

pub struct SyncOnce;

impl SyncOnce {
    pub fn execute(options: &CommandOptions<'_>, force: bool) -> anyhow::Result<()> {
        let settings = options.settings()?;
        let orchestrator = RunOrchestrator::new(settings)?;

        let report = orchestrator
            .sync_once(force)
            .context("Sync run failed")?;

        if !options.quiet {
            print!("{}", SyncReporter::generate_summary(&report));
        }

        Ok(())
    }
}
