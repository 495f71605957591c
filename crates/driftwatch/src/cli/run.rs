//! Run command - one controller invocation.

use crate::config::PipelineConfig;
use crate::controller::{Controller, RunOutcome, TracingObserver};
use crate::stage::ProcessStageRunner;

/// Execute the run command.
///
/// Errors bubble up as `PipelineError` inside the `anyhow` chain so the
/// binary can map them to per-kind exit codes.
pub fn run(config: &PipelineConfig) -> anyhow::Result<()> {
    let rt = super::runtime()?;
    rt.block_on(run_async(config))
}

async fn run_async(config: &PipelineConfig) -> anyhow::Result<()> {
    let runner = ProcessStageRunner::new(config.stages.clone());
    let controller = Controller::new(config.clone(), runner, Box::new(TracingObserver));

    let outcome = controller.run().await?;

    match outcome {
        RunOutcome::NoNewData => println!("No new data; nothing to do."),
        RunOutcome::NoDrift => println!("New data scored; no drift, deployed model kept."),
        RunOutcome::Done => {
            println!("Drift detected; model retrained, redeployed, and reported.")
        }
    }

    Ok(())
}
