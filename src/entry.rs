use clap::Parser;
use tracing::{error, info, warn};

use crate::args::TrainArgs;
use crate::config::{self, RunSettings};
use crate::error::{AppError, AppResult};
use crate::logger::{LogSettings, init_logging};
use crate::pipeline::ReplayServer;
use crate::runner::run_pipeline;
use crate::script::parse_files;

/// Binary entry point: parses the command line and runs the replay.
///
/// # Errors
///
/// Returns an error when the configuration, the request files, or the
/// filter pipeline are unusable, or when processes cannot be managed.
pub fn run() -> AppResult<()> {
    let args = TrainArgs::parse();
    run_with(&args)
}

/// Runs one replay for already-parsed arguments.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(args: &TrainArgs) -> AppResult<()> {
    let config = match config::load_config_file(&args.config) {
        Ok(config) => config,
        Err(err) => {
            init_logging(&log_settings(args, args.log_config.clone()));
            error!("{}", err);
            return Err(err);
        }
    };
    init_logging(&log_settings(args, config::log_config_path(args, &config)));

    let settings = config::resolve(args, config).map_err(|err| {
        error!("{}", err);
        AppError::from(err)
    })?;
    replay(&settings).inspect_err(|err| error!("{}", err))
}

fn log_settings(args: &TrainArgs, config: Option<std::path::PathBuf>) -> LogSettings {
    LogSettings {
        verbose: args.verbose,
        no_color: args.no_color,
        config,
    }
}

fn replay(settings: &RunSettings) -> AppResult<()> {
    // Everything is built before the first fork so children share one
    // read-only snapshot.
    let server = ReplayServer::from_config(&settings.pipeline)?;
    let sequences = parse_files(&settings.requests)?;
    if sequences.is_empty() {
        warn!("Request files describe no sequences; nothing will be replayed");
    }
    let request_count: usize = sequences
        .iter()
        .map(|sequence| sequence.requests().count())
        .sum();
    info!(
        "Replaying {} request(s) from {} sequence(s) through {} worker(s), filters {:?}",
        request_count,
        sequences.len(),
        settings.workers,
        server.filters()
    );

    let summary = run_pipeline(&sequences, settings.workers, &server, settings.drain_interval)?;
    if !summary.feeders_succeeded() {
        warn!("Some sequences were not fully replayed");
    }
    info!("Replay finished");
    Ok(())
}
