use clap::Parser;
use std::path::PathBuf;

use super::parsers::parse_positive_usize;
use super::types::PositiveUsize;

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "train",
    version,
    about = "Replay scripted request timelines through a filter pipeline with forked feeder and worker processes."
)]
pub struct TrainArgs {
    /// Run configuration (TOML/JSON); must contain a [pipeline] section
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Request description files; [train] requests from the config are appended
    #[arg(value_name = "REQUESTS")]
    pub requests: Vec<PathBuf>,

    /// Number of worker processes (defaults to [train] workers, then 1)
    #[arg(long, short = 'w', env = "TRAIN_WORKERS", value_parser = parse_positive_usize)]
    pub workers: Option<PositiveUsize>,

    /// Logging configuration file (defaults to [train] log_config)
    #[arg(long = "log-config", short = 'l')]
    pub log_config: Option<PathBuf>,

    /// Enable verbose logging (sets log level to debug unless overridden by TRAIN_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,
}
