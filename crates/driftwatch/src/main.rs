//! driftwatch - model-operations drift controller
//!
//! One invocation checks the source directory for unseen data, re-scores
//! the deployed model on it, and runs the fixed retrain/redeploy/report
//! sequence when the score degraded. Exits 0 on any clean terminal state;
//! failure kinds map to distinct non-zero codes.

use clap::{Parser, Subcommand};
use driftwatch::cli;
use driftwatch::config::{PipelineConfig, DEFAULT_CONFIG_FILE};
use driftwatch::error::PipelineError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "driftwatch", version, about = "Model-operations drift controller")]
struct Cli {
    /// Path to the pipeline configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable verbose logging (debug to stderr)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one controller invocation (the default when no command is given)
    Run,
    /// Create the ledger database and its tables
    Init,
    /// Preview arrival detection without invoking any stage
    Scan(cli::scan::ScanArgs),
    /// List the score ledger
    History(cli::history::HistoryArgs),
    /// Show the resolved configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match PipelineConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    // Guard must outlive the run or buffered file logs are dropped
    let _guard = init_tracing(&config, args.verbose);

    let result = match args.command.unwrap_or(Commands::Run) {
        Commands::Run => cli::run::run(&config),
        Commands::Init => cli::init::run(&config),
        Commands::Scan(scan_args) => cli::scan::run(&config, scan_args),
        Commands::History(history_args) => cli::history::run(&config, history_args),
        Commands::Config(config_args) => cli::config::run(&config, config_args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<PipelineError>()
                .map(PipelineError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

/// Install the stderr logging layer, plus a daily-rolling file layer when
/// `[logging] dir` is configured.
fn init_tracing(
    config: &PipelineConfig,
    verbose: bool,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let default_filter = if verbose {
        "driftwatch=debug"
    } else {
        "driftwatch=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "driftwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}
