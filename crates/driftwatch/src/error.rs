//! Error taxonomy for a controller invocation.
//!
//! None of these are retried: each aborts the invocation at the point of
//! failure and carries the failing stage name or resource path so the run
//! can be diagnosed without a debugger. The process exit status is
//! machine-distinguishable per kind.

use crate::stage::StepFailure;
use driftwatch_db::DbError;
use std::path::PathBuf;
use thiserror::Error;

/// A failed controller invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ledger database missing, corrupt, or unreadable.
    #[error("ledger database unavailable at {}: {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: DbError,
    },

    /// Source data directory unavailable, missing, or unreadable.
    #[error("source directory unavailable at {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An invoked stage returned a non-success outcome.
    #[error(transparent)]
    Step(#[from] StepFailure),

    /// Score comparison attempted with fewer than two records.
    #[error("drift comparison needs at least two score records, ledger has {records}")]
    Precondition { records: usize },
}

impl PipelineError {
    /// Process exit status for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::SourceUnavailable { .. } => 2,
            PipelineError::StoreUnavailable { .. } => 3,
            PipelineError::Step(_) => 4,
            PipelineError::Precondition { .. } => 5,
        }
    }
}
