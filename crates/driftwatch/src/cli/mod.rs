//! CLI module for driftwatch
//!
//! One module per subcommand. `run` is the default when no subcommand is
//! given; the rest are operator utilities around the same config and
//! ledger.

pub mod config;
pub mod history;
pub mod init;
pub mod run;
pub mod scan;

/// Build the current-thread runtime a command blocks on.
///
/// Async exists for the ledger layer and stage subprocesses, not for
/// concurrency; one invocation is one logical thread of control.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
