//! Init command - create the ledger database.
//!
//! The controller itself never creates the ledger (a missing ledger is
//! fatal for a run), so a deployment bootstraps with this once.

use crate::config::PipelineConfig;
use driftwatch_db::LedgerDb;

/// Execute the init command.
pub fn run(config: &PipelineConfig) -> anyhow::Result<()> {
    let rt = super::runtime()?;
    rt.block_on(async {
        let db = LedgerDb::open(&config.paths.ledger_db).await?;
        db.close().await;
        Ok::<_, anyhow::Error>(())
    })?;

    println!("Ledger ready at {}", config.paths.ledger_db.display());
    Ok(())
}
