//! History command - list the score ledger.

use crate::config::PipelineConfig;
use anyhow::Context;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use driftwatch_db::{format_date, LedgerDb, ScoreRecord};

/// Arguments for the history command
#[derive(Debug, clap::Args)]
pub struct HistoryArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show only the most recent N records
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Execute the history command.
pub fn run(config: &PipelineConfig, args: HistoryArgs) -> anyhow::Result<()> {
    let rt = super::runtime()?;
    let mut history: Vec<ScoreRecord> = rt.block_on(async {
        let db = LedgerDb::open_existing(&config.paths.ledger_db)
            .await
            .with_context(|| {
                format!(
                    "Cannot open ledger at {} (run `driftwatch init` first?)",
                    config.paths.ledger_db.display()
                )
            })?;
        let history = db.read_score_history().await?;
        db.close().await;
        Ok::<_, anyhow::Error>(history)
    })?;

    if let Some(limit) = args.limit {
        let start = history.len().saturating_sub(limit);
        history.drain(..start);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("Score ledger is empty.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Date", "Score", ""]);

    let mut previous: Option<f64> = None;
    for record in &history {
        let marker = match previous {
            Some(prev) if record.score < prev => "drift",
            _ => "",
        };
        table.add_row(vec![
            format_date(&record.recorded_at),
            format!("{:.4}", record.score),
            marker.to_string(),
        ]);
        previous = Some(record.score);
    }

    println!("{table}");
    println!("{} record(s)", history.len());

    Ok(())
}
