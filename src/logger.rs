use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::ConfigError;

/// Logging choices gathered from the command line and run configuration.
#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub verbose: bool,
    pub no_color: bool,
    pub config: Option<PathBuf>,
}

/// Contents of a logging configuration file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LogConfigFile {
    /// `EnvFilter` directive, e.g. `info,train::runner=debug`.
    pub filter: Option<String>,
    pub ansi: Option<bool>,
    /// Append log lines to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Reads a TOML logging configuration file.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_log_config(path: &Path) -> Result<LogConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|err| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source: err,
    })?;
    toml::from_str(&content).map_err(|err| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: err,
    })
}

/// Filter precedence: `TRAIN_LOG`, `RUST_LOG`, the config file's `filter`,
/// then `debug`/`info` depending on `verbose`.
fn build_filter(verbose: bool, configured: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    std::env::var("TRAIN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .or_else(|| configured.map(str::to_owned))
        .map_or_else(
            || EnvFilter::new(fallback),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
}

pub fn init_logging(settings: &LogSettings) {
    let file_config = match settings.config.as_deref() {
        Some(path) => load_log_config(path).unwrap_or_else(|err| {
            eprintln!(
                "Warning: Failed to read logging configuration from file {:?}: {}",
                path, err
            );
            LogConfigFile::default()
        }),
        None => LogConfigFile::default(),
    };

    let filter = build_filter(settings.verbose, file_config.filter.as_deref());
    let log_file = file_config.file.as_deref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                eprintln!(
                    "Warning: Failed to open log file {:?}: {}; logging to stderr",
                    path, err
                );
            })
            .ok()
    });

    let result = match log_file {
        Some(file) => {
            let ansi = !settings.no_color && file_config.ansi.unwrap_or(false);
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_ansi(ansi)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        None => {
            let ansi = !settings.no_color && file_config.ansi.unwrap_or(true);
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_ansi(ansi)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    if let Err(err) = result {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}
