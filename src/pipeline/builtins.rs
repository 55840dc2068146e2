use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use http::StatusCode;

use crate::config::types::PipelineConfig;
use crate::environ::{Environment, HEADER_PREFIX};
use crate::error::{PipelineError, ValidationError};
use crate::headers::canonical_name;

use super::{Filter, Handler, Response};

pub(super) const RATE_LIMIT: &str = "rate_limit";
pub(super) const REQUIRE_HEADER: &str = "require_header";

/// Window used when `[pipeline.rate_limit]` gives no period.
const DEFAULT_RATE_PERIOD: Duration = Duration::from_secs(1);
/// Environment key requests are bucketed on by default.
const DEFAULT_RATE_KEY: &str = "REMOTE_ADDR";

/// Environment keys that are not namespaced under [`HEADER_PREFIX`].
const UNPREFIXED_HEADERS: [&str; 2] = ["CONTENT_TYPE", "CONTENT_LENGTH"];

pub(super) type FilterFactory = fn(&PipelineConfig) -> Result<Box<dyn Filter>, PipelineError>;

pub(super) fn builtins() -> [(&'static str, FilterFactory); 2] {
    [
        (RATE_LIMIT, build_rate_limit),
        (REQUIRE_HEADER, build_require_header),
    ]
}

fn build_rate_limit(config: &PipelineConfig) -> Result<Box<dyn Filter>, PipelineError> {
    let options = config
        .rate_limit
        .as_ref()
        .ok_or(PipelineError::MissingFilterOptions { name: RATE_LIMIT })?;
    if options.limit == 0 {
        return Err(PipelineError::InvalidFilterOption {
            name: RATE_LIMIT,
            option: "limit",
            source: ValidationError::ValueTooSmall { min: 1 },
        });
    }
    let period = match options.period.as_ref() {
        Some(period) => {
            period
                .to_duration()
                .map_err(|err| PipelineError::InvalidFilterOption {
                    name: RATE_LIMIT,
                    option: "period",
                    source: err,
                })?
        }
        None => DEFAULT_RATE_PERIOD,
    };
    let key = options
        .key
        .clone()
        .unwrap_or_else(|| DEFAULT_RATE_KEY.to_owned());
    Ok(Box::new(RateLimitFilter {
        limit: options.limit,
        period,
        key,
    }))
}

fn build_require_header(config: &PipelineConfig) -> Result<Box<dyn Filter>, PipelineError> {
    let options = config
        .require_header
        .as_ref()
        .ok_or(PipelineError::MissingFilterOptions {
            name: REQUIRE_HEADER,
        })?;
    Ok(Box::new(RequireHeaderFilter {
        header: canonical_name(options.header.trim()),
    }))
}

/// Fixed-window rate limiting keyed on one environment value.
#[derive(Debug, Clone)]
pub struct RateLimitFilter {
    limit: u64,
    period: Duration,
    key: String,
}

impl Filter for RateLimitFilter {
    fn name(&self) -> &'static str {
        RATE_LIMIT
    }

    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(RateLimited {
            next,
            limit: self.limit,
            period: self.period,
            key: self.key.clone(),
            windows: Mutex::new(HashMap::new()),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u64,
}

struct RateLimited {
    next: Arc<dyn Handler>,
    limit: u64,
    period: Duration,
    key: String,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimited {
    /// Counts the request against its bucket; returns the time left in the
    /// window when the bucket is already full.
    fn admit(&self, bucket: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let window = windows.entry(bucket.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= self.period {
            window.started = now;
            window.count = 0;
        }
        if window.count >= self.limit {
            let elapsed = now.saturating_duration_since(window.started);
            return Err(self.period.saturating_sub(elapsed));
        }
        window.count = window.count.saturating_add(1);
        Ok(())
    }
}

impl Handler for RateLimited {
    fn handle(&self, env: &Environment) -> Response {
        let bucket = env.get(&self.key).map_or("", String::as_str);
        match self.admit(bucket, Instant::now()) {
            Ok(()) => self.next.handle(env),
            Err(remaining) => {
                let retry_after = remaining.as_secs().saturating_add(1);
                Response::new(StatusCode::TOO_MANY_REQUESTS)
                    .with_header("Retry-After", retry_after.to_string())
                    .with_body(format!(
                        "Rate limit of {} per {:?} exceeded for {:?}",
                        self.limit, self.period, bucket
                    ))
            }
        }
    }
}

/// Rejects requests that do not carry a header.
#[derive(Debug, Clone)]
pub struct RequireHeaderFilter {
    header: String,
}

impl RequireHeaderFilter {
    fn env_key(&self) -> String {
        if UNPREFIXED_HEADERS.contains(&self.header.as_str()) {
            self.header.clone()
        } else {
            format!("{}{}", HEADER_PREFIX, self.header)
        }
    }
}

impl Filter for RequireHeaderFilter {
    fn name(&self) -> &'static str {
        REQUIRE_HEADER
    }

    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler> {
        Arc::new(HeaderRequired {
            next,
            header: self.header.clone(),
            env_key: self.env_key(),
        })
    }
}

struct HeaderRequired {
    next: Arc<dyn Handler>,
    header: String,
    env_key: String,
}

impl Handler for HeaderRequired {
    fn handle(&self, env: &Environment) -> Response {
        if env.contains_key(&self.env_key) {
            return self.next.handle(env);
        }
        Response::new(StatusCode::BAD_REQUEST)
            .with_body(format!("Missing required header {}", self.header))
    }
}
