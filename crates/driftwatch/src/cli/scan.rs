//! Scan command - preview arrival detection.
//!
//! Runs the same detection the controller would, but invokes no stage and
//! writes nothing.

use crate::arrival;
use crate::config::PipelineConfig;
use anyhow::Context;
use driftwatch_db::LedgerDb;
use serde::Serialize;
use std::collections::BTreeSet;

/// Arguments for the scan command
#[derive(Debug, clap::Args)]
pub struct ScanArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ScanReport {
    source_dir: String,
    extension: String,
    known_files: usize,
    new_files: Vec<String>,
}

/// Execute the scan command.
pub fn run(config: &PipelineConfig, args: ScanArgs) -> anyhow::Result<()> {
    let rt = super::runtime()?;
    let known: BTreeSet<String> = rt.block_on(async {
        let db = LedgerDb::open_existing(&config.paths.ledger_db)
            .await
            .with_context(|| {
                format!(
                    "Cannot open ledger at {} (run `driftwatch init` first?)",
                    config.paths.ledger_db.display()
                )
            })?;
        let known = db.read_ingested_files().await?;
        db.close().await;
        Ok::<_, anyhow::Error>(known)
    })?;

    let fresh = arrival::detect_new_files(
        &config.source.input_dir,
        &config.source.extension,
        &known,
    )?;

    if args.json {
        let report = ScanReport {
            source_dir: config.source.input_dir.display().to_string(),
            extension: config.source.extension.clone(),
            known_files: known.len(),
            new_files: fresh.iter().cloned().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if fresh.is_empty() {
        println!(
            "No unseen .{} files under {} ({} already ingested)",
            config.source.extension,
            config.source.input_dir.display(),
            known.len()
        );
    } else {
        for name in &fresh {
            println!("{name}");
        }
        println!(
            "{} unseen .{} file(s) under {}",
            fresh.len(),
            config.source.extension,
            config.source.input_dir.display()
        );
    }

    Ok(())
}
