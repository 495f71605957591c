//! Config command - show the resolved configuration.

use crate::config::PipelineConfig;
use crate::stage::Stage;

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Execute the config command.
pub fn run(config: &PipelineConfig, args: ConfigArgs) -> anyhow::Result<()> {
    if args.json {
        let stages: serde_json::Map<String, serde_json::Value> = [
            Stage::Ingestion,
            Stage::Training,
            Stage::Scoring,
            Stage::Deployment,
            Stage::Reporting,
        ]
        .into_iter()
        .map(|stage| {
            let spec = config.stages.command(stage);
            (
                stage.as_str().to_string(),
                serde_json::json!({
                    "program": spec.program,
                    "args": spec.args,
                }),
            )
        })
        .collect();

        let out = serde_json::json!({
            "source": {
                "input_dir": config.source.input_dir.to_string_lossy(),
                "extension": config.source.extension,
            },
            "paths": {
                "ingest_dir": config.paths.ingest_dir.to_string_lossy(),
                "model_dir": config.paths.model_dir.to_string_lossy(),
                "deploy_dir": config.paths.deploy_dir.to_string_lossy(),
                "ledger_db": config.paths.ledger_db.to_string_lossy(),
                "ledger_exists": config.paths.ledger_db.exists(),
                "deployed_model": config.deployed_model_path().to_string_lossy(),
            },
            "stages": stages,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("DRIFTWATCH CONFIGURATION");
    println!("========================");
    println!();
    println!("Source dir:  {}", config.source.input_dir.display());
    println!("Extension:   .{}", config.source.extension);
    println!();
    println!("Ingest dir:  {}", config.paths.ingest_dir.display());
    println!("Model dir:   {}", config.paths.model_dir.display());
    println!("Deploy dir:  {}", config.paths.deploy_dir.display());
    println!(
        "Ledger:      {} ({})",
        config.paths.ledger_db.display(),
        if config.paths.ledger_db.exists() {
            "exists"
        } else {
            "not found"
        }
    );
    println!();
    println!("Stages:");
    for stage in [
        Stage::Ingestion,
        Stage::Training,
        Stage::Scoring,
        Stage::Deployment,
        Stage::Reporting,
    ] {
        let spec = config.stages.command(stage);
        println!("  {:<11} {} {}", stage, spec.program, spec.args.join(" "));
    }

    Ok(())
}
