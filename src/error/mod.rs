mod app;
mod config;
mod headers;
mod launch;
mod pipeline;
mod queue;
mod script;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use headers::HeaderError;
pub use launch::LaunchError;
pub use pipeline::PipelineError;
pub use queue::QueueError;
pub use script::{ParseError, ParseFailure, ScriptError};
pub use validation::ValidationError;
