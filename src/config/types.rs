use std::time::Duration;

use serde::Deserialize;

use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub train: Option<TrainConfig>,
    pub pipeline: Option<PipelineConfig>,
}

/// The `[train]` section: defaults for the command line.
#[derive(Debug, Default, Deserialize)]
pub struct TrainConfig {
    pub workers: Option<usize>,
    pub log_config: Option<String>,
    pub requests: Option<Vec<String>>,
    pub drain_interval: Option<DurationValue>,
}

/// The `[pipeline]` section: which filters wrap the stub application, in
/// order from outermost to innermost, and their options.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub filters: Vec<String>,
    pub rate_limit: Option<RateLimitConfig>,
    pub require_header: Option<RequireHeaderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub limit: u64,
    pub period: Option<DurationValue>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequireHeaderConfig {
    pub header: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }
}
