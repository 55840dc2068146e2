use thiserror::Error;

use super::{
    ConfigError, HeaderError, LaunchError, PipelineError, QueueError, ScriptError,
    ValidationError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
    #[error("TOML error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("Process error: {0}")]
    Launch(#[from] LaunchError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn config<E>(error: E) -> Self
    where
        E: Into<ConfigError>,
    {
        error.into().into()
    }

    pub fn script<E>(error: E) -> Self
    where
        E: Into<ScriptError>,
    {
        error.into().into()
    }

    pub fn pipeline<E>(error: E) -> Self
    where
        E: Into<PipelineError>,
    {
        error.into().into()
    }

    pub fn queue<E>(error: E) -> Self
    where
        E: Into<QueueError>,
    {
        error.into().into()
    }

    pub fn launch<E>(error: E) -> Self
    where
        E: Into<LaunchError>,
    {
        error.into().into()
    }

    /// Returns the signal carried by a stopped-by-signal condition, if this
    /// error is one.
    #[must_use]
    pub const fn stop_signal(&self) -> Option<(i32, i32)> {
        if let AppError::Launch(LaunchError::Stopped { signal, code }) = self {
            Some((*signal, *code))
        } else {
            None
        }
    }
}
