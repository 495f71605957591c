//! Pipeline stages and the subprocess-backed step invoker.
//!
//! Stages are a closed set: dispatch goes through the [`Stage`] enum and one
//! [`StageRunner`] interface, so adding a stage is an explicit code change
//! rather than an arbitrary command string.

use crate::config::StagesConfig;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// How many trailing stderr lines a [`StepFailure`] diagnostic keeps.
const STDERR_TAIL_LINES: usize = 8;

/// A named external pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Ingestion,
    Training,
    Scoring,
    Deployment,
    Reporting,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Ingestion => "ingestion",
            Stage::Training => "training",
            Stage::Scoring => "scoring",
            Stage::Deployment => "deployment",
            Stage::Reporting => "reporting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat string parameter mapping handed to a stage. BTreeMap so iteration
/// order (and thus the child's argv) is deterministic.
pub type StageParams = BTreeMap<String, String>;

/// A stage returned a non-success outcome. Carries the stage name and an
/// opaque diagnostic; never swallowed, always aborts the remaining sequence.
#[derive(Debug, Error)]
#[error("stage {stage} failed: {message}")]
pub struct StepFailure {
    pub stage: Stage,
    pub message: String,
}

/// Step invoker interface.
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Invoke the named stage and block until it completes. No retries.
    async fn run(&self, stage: Stage, params: &StageParams) -> Result<(), StepFailure>;
}

/// Runs each stage as a child process built from its configured command,
/// with parameters appended as `--key value` pairs.
pub struct ProcessStageRunner {
    stages: StagesConfig,
}

impl ProcessStageRunner {
    pub fn new(stages: StagesConfig) -> Self {
        Self { stages }
    }
}

#[async_trait]
impl StageRunner for ProcessStageRunner {
    async fn run(&self, stage: Stage, params: &StageParams) -> Result<(), StepFailure> {
        let spec = self.stages.command(stage);

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        for (key, value) in params {
            cmd.arg(format!("--{key}")).arg(value);
        }

        info!(stage = %stage, program = %spec.program, "Invoking stage");

        let output = cmd.output().await.map_err(|err| StepFailure {
            stage,
            message: format!("failed to spawn '{}': {err}", spec.program),
        })?;

        if !output.stdout.is_empty() {
            debug!(stage = %stage, "stage stdout:\n{}", String::from_utf8_lossy(&output.stdout));
        }
        if !output.stderr.is_empty() {
            debug!(stage = %stage, "stage stderr:\n{}", String::from_utf8_lossy(&output.stderr));
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StepFailure {
                stage,
                message: format!("{}: {}", output.status, stderr_tail(&stderr)),
            });
        }

        info!(stage = %stage, "Stage completed");
        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return "<no stderr>".to_string();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageCommand;

    fn sh(line: &str) -> StageCommand {
        StageCommand {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), line.to_string()],
        }
    }

    fn stages_with_scoring(line: &str) -> StagesConfig {
        StagesConfig {
            ingestion: sh("exit 0"),
            training: sh("exit 0"),
            scoring: sh(line),
            deployment: sh("exit 0"),
            reporting: sh("exit 0"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_zero_is_success() {
        let runner = ProcessStageRunner::new(stages_with_scoring("exit 0"));
        runner
            .run(Stage::Scoring, &StageParams::new())
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_carries_stage_and_stderr() {
        let runner =
            ProcessStageRunner::new(stages_with_scoring("echo 'model file missing' >&2; exit 3"));
        let err = runner
            .run(Stage::Scoring, &StageParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Scoring);
        assert!(err.message.contains("model file missing"), "{}", err.message);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unspawnable_program_is_a_step_failure() {
        let mut stages = stages_with_scoring("exit 0");
        stages.training = StageCommand {
            program: "/nonexistent/driftwatch-trainer".to_string(),
            args: vec![],
        };
        let runner = ProcessStageRunner::new(stages);
        let err = runner
            .run(Stage::Training, &StageParams::new())
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Training);
        assert!(err.message.contains("failed to spawn"), "{}", err.message);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn params_become_sorted_cli_flags() {
        // The probe exits non-zero unless both flags arrive in sorted order.
        let probe = r#"test "$1" = "--a_key" && test "$2" = "1" && test "$3" = "--b_key" && test "$4" = "2""#;
        let stages = StagesConfig {
            ingestion: StageCommand {
                program: "/bin/sh".to_string(),
                args: vec!["-c".to_string(), probe.to_string(), "probe".to_string()],
            },
            training: sh("exit 0"),
            scoring: sh("exit 0"),
            deployment: sh("exit 0"),
            reporting: sh("exit 0"),
        };
        let params = StageParams::from([
            ("b_key".to_string(), "2".to_string()),
            ("a_key".to_string(), "1".to_string()),
        ]);
        let runner = ProcessStageRunner::new(stages);
        runner.run(Stage::Ingestion, &params).await.unwrap();
    }

    #[test]
    fn stderr_tail_keeps_the_last_lines() {
        let long: String = (0..20).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&long);
        assert!(tail.starts_with("line 12"));
        assert!(tail.ends_with("line 19"));
        assert_eq!(stderr_tail(""), "<no stderr>");
    }
}
