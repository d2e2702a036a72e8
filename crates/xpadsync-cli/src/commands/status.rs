use xpadsync_core::orchestrator::RunOrchestrator;
use xpadsync_core::sync::SyncReporter;

use super::common::CommandOptions;

pub struct Status;

impl Status {
    pub fn execute(options: &CommandOptions<'_>) -> anyhow::Result<()> {
        let settings = options.settings()?;
        let status = RunOrchestrator::status(&settings)?;

        print!("{}", SyncReporter::generate_status(&status));
        Ok(())
    }
}
