use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use crate::args::TrainArgs;
use crate::error::{ConfigError, ValidationError};
use crate::runner::DEFAULT_DRAIN_INTERVAL;

use super::types::{ConfigFile, PipelineConfig};

/// Everything a run needs once the command line and the config file have
/// been merged.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub workers: NonZeroUsize,
    pub log_config: Option<PathBuf>,
    pub requests: Vec<PathBuf>,
    pub drain_interval: Duration,
    pub pipeline: PipelineConfig,
}

/// The logging configuration to use: `--log-config`, then `[train] log_config`.
#[must_use]
pub fn log_config_path(args: &TrainArgs, config: &ConfigFile) -> Option<PathBuf> {
    args.log_config.clone().or_else(|| {
        config
            .train
            .as_ref()
            .and_then(|train| train.log_config.as_deref())
            .map(PathBuf::from)
    })
}

/// Merges `args` over `config`.
///
/// # Errors
///
/// Returns an error when the `[pipeline]` section is missing, no request
/// files remain after merging, or a `[train]` value is invalid.
pub fn resolve(args: &TrainArgs, config: ConfigFile) -> Result<RunSettings, ConfigError> {
    let log_config = log_config_path(args, &config);
    let ConfigFile { train, pipeline } = config;
    let pipeline = pipeline.ok_or(ConfigError::MissingPipeline)?;
    let train = train.unwrap_or_default();

    let workers = match (args.workers, train.workers) {
        (Some(workers), _) => workers.non_zero(),
        (None, Some(workers)) => {
            NonZeroUsize::new(workers).ok_or_else(|| ConfigError::FieldMustBePositive {
                field: "train.workers".to_owned(),
                source: ValidationError::ValueTooSmall { min: 1 },
            })?
        }
        (None, None) => NonZeroUsize::MIN,
    };

    let mut requests = args.requests.clone();
    requests.extend(
        train
            .requests
            .unwrap_or_default()
            .into_iter()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from),
    );
    if requests.is_empty() {
        return Err(ConfigError::NoRequestFiles);
    }

    let drain_interval = match train.drain_interval {
        Some(value) => value
            .to_duration()
            .map_err(|err| ConfigError::InvalidDuration {
                field: "train.drain_interval".to_owned(),
                source: err,
            })?,
        None => DEFAULT_DRAIN_INTERVAL,
    };

    Ok(RunSettings {
        workers,
        log_config,
        requests,
        drain_interval,
        pipeline,
    })
}
