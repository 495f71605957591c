//! Drift decision controller.
//!
//! Sequences one governance pass over the model lifecycle: arrival
//! detection, conditional ingestion, scoring of the deployed model on the
//! fresh data, score comparison, and the fixed retrain sequence when the
//! score degraded. Everything heavier than a branch lives behind the
//! [`StageRunner`] and the ledger store; this module owns only the ordering
//! and the two yes/no gates.

use crate::arrival;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::stage::{Stage, StageParams, StageRunner};
use driftwatch_db::{LedgerDb, ScoreRecord};
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Controller states. `NoNewData`, `NoDrift`, and `Done` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    CheckingArrival,
    Ingesting,
    Scoring,
    Comparing,
    Retraining,
    NoNewData,
    NoDrift,
    Done,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::Start => "START",
            State::CheckingArrival => "CHECKING_ARRIVAL",
            State::Ingesting => "INGESTING",
            State::Scoring => "SCORING",
            State::Comparing => "COMPARING",
            State::Retraining => "RETRAINING",
            State::NoNewData => "NO_NEW_DATA",
            State::NoDrift => "NO_DRIFT",
            State::Done => "DONE",
        }
    }
}

/// Terminal outcome of a clean run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing unseen in the source directory; zero stages invoked.
    NoNewData,
    /// New data scored at least as well as the previous record.
    NoDrift,
    /// Drift declared; retrain sequence completed.
    Done,
}

/// Transient per-invocation flags. Created at the start of a run, mutated
/// only by the controller, discarded when the run ends.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineRunState {
    pub has_new_data: bool,
    pub proceed_to_retrain: bool,
}

/// Observation capability handed to the controller at construction, scoped
/// to one invocation. Keeps the core free of global logger state and lets
/// tests record the exact transition order.
pub trait RunObserver: Send + Sync {
    fn state_entered(&self, state: State) {
        let _ = state;
    }
    fn stage_started(&self, stage: Stage) {
        let _ = stage;
    }
    fn stage_finished(&self, stage: Stage) {
        let _ = stage;
    }
}

/// Forwards controller events to `tracing`.
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn state_entered(&self, state: State) {
        info!(state = state.as_str(), "State entered");
    }

    fn stage_started(&self, stage: Stage) {
        info!(stage = %stage, "Stage started");
    }

    fn stage_finished(&self, stage: Stage) {
        info!(stage = %stage, "Stage finished");
    }
}

/// One-invocation drift controller.
///
/// Single logical thread of control: each stage call blocks until the
/// external stage finishes, and every ledger read opens and closes its own
/// connection so writes committed by a stage in between are visible.
/// Serializing concurrent invocations is the caller's responsibility.
pub struct Controller<R: StageRunner> {
    config: PipelineConfig,
    runner: R,
    observer: Box<dyn RunObserver>,
}

impl<R: StageRunner> Controller<R> {
    pub fn new(config: PipelineConfig, runner: R, observer: Box<dyn RunObserver>) -> Self {
        Self {
            config,
            runner,
            observer,
        }
    }

    /// Execute the state machine to a terminal state.
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let mut flags = PipelineRunState::default();
        let mut state = State::Start;

        loop {
            self.observer.state_entered(state);

            state = match state {
                State::Start => State::CheckingArrival,

                State::CheckingArrival => {
                    let known = self.read_known_files().await?;
                    let fresh = arrival::detect_new_files(
                        &self.config.source.input_dir,
                        &self.config.source.extension,
                        &known,
                    )?;
                    if fresh.is_empty() {
                        info!("No unseen data files; nothing to do");
                        State::NoNewData
                    } else {
                        info!(count = fresh.len(), files = ?fresh, "Unseen data files detected");
                        flags.has_new_data = true;
                        State::Ingesting
                    }
                }

                State::Ingesting => {
                    self.invoke(Stage::Ingestion, &self.config.ingestion_params())
                        .await?;
                    State::Scoring
                }

                State::Scoring => {
                    // The deployed model scores the fresh dataset so the
                    // comparison is apples-to-apples against the previous
                    // record.
                    let params = self
                        .config
                        .scoring_params(&self.config.deployed_model_path());
                    self.invoke(Stage::Scoring, &params).await?;
                    State::Comparing
                }

                State::Comparing => {
                    let history = self.read_score_history().await?;
                    // Last two chronological rows, regardless of which model
                    // produced them. Two scoring runs without an intervening
                    // retrain therefore compare the same model against
                    // itself; a known ambiguity kept as-is.
                    let (previous, current) = match history.as_slice() {
                        [.., previous, current] => (previous, current),
                        _ => {
                            return Err(PipelineError::Precondition {
                                records: history.len(),
                            })
                        }
                    };
                    if current.score >= previous.score {
                        info!(
                            previous = previous.score,
                            current = current.score,
                            "No drift; deployed model holds"
                        );
                        State::NoDrift
                    } else {
                        warn!(
                            previous = previous.score,
                            current = current.score,
                            "Score degraded; drift declared"
                        );
                        flags.proceed_to_retrain = true;
                        State::Retraining
                    }
                }

                State::Retraining => {
                    // Fixed total order. Deployment never precedes a
                    // successful training and scoring pass; reporting never
                    // runs against a model that failed to deploy.
                    self.invoke(Stage::Training, &self.config.training_params())
                        .await?;
                    let provenance = self
                        .config
                        .scoring_params(&self.config.trained_model_path());
                    self.invoke(Stage::Scoring, &provenance).await?;
                    self.invoke(Stage::Deployment, &self.config.deployment_params())
                        .await?;
                    self.invoke(Stage::Reporting, &self.config.reporting_params())
                        .await?;
                    State::Done
                }

                State::NoNewData => {
                    self.finish(&flags);
                    return Ok(RunOutcome::NoNewData);
                }
                State::NoDrift => {
                    self.finish(&flags);
                    return Ok(RunOutcome::NoDrift);
                }
                State::Done => {
                    self.finish(&flags);
                    return Ok(RunOutcome::Done);
                }
            };
        }
    }

    fn finish(&self, flags: &PipelineRunState) {
        info!(
            has_new_data = flags.has_new_data,
            retrained = flags.proceed_to_retrain,
            "Run complete"
        );
    }

    async fn invoke(&self, stage: Stage, params: &StageParams) -> Result<(), PipelineError> {
        self.observer.stage_started(stage);
        self.runner.run(stage, params).await?;
        self.observer.stage_finished(stage);
        Ok(())
    }

    /// Basenames the ingested-file ledger knew before this invocation's
    /// ingestion, read through a fresh connection.
    async fn read_known_files(&self) -> Result<BTreeSet<String>, PipelineError> {
        let db = self.open_ledger().await?;
        let result = db.read_ingested_files().await;
        db.close().await;
        result.map_err(|source| self.store_unavailable(source))
    }

    /// Full score history through a fresh connection, so the scoring stage's
    /// append from earlier in this same invocation is visible.
    async fn read_score_history(&self) -> Result<Vec<ScoreRecord>, PipelineError> {
        let db = self.open_ledger().await?;
        let result = db.read_score_history().await;
        db.close().await;
        result.map_err(|source| self.store_unavailable(source))
    }

    async fn open_ledger(&self) -> Result<LedgerDb, PipelineError> {
        LedgerDb::open_existing(&self.config.paths.ledger_db)
            .await
            .map_err(|source| self.store_unavailable(source))
    }

    fn store_unavailable(&self, source: driftwatch_db::DbError) -> PipelineError {
        PipelineError::StoreUnavailable {
            path: self.config.paths.ledger_db.clone(),
            source,
        }
    }
}
