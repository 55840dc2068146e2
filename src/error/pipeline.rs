use thiserror::Error;

use super::ValidationError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown filter '{name}'. Available filters: {available}.")]
    UnknownFilter { name: String, available: String },
    #[error("Filter '{name}' is already registered.")]
    DuplicateFilter { name: &'static str },
    #[error("Filter '{name}' requires a [pipeline.{name}] section.")]
    MissingFilterOptions { name: &'static str },
    #[error("Filter '{name}' option '{option}' is invalid: {source}")]
    InvalidFilterOption {
        name: &'static str,
        option: &'static str,
        #[source]
        source: ValidationError,
    },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
