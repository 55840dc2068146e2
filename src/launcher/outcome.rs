use std::any::Any;
use std::error::Error;
use std::fmt::Write;

use tracing::{error, info};

use crate::error::{AppError, AppResult, LaunchError};

use super::signals::signal_name;

/// Exit status for a child that failed in any unplanned way.
pub const FAILURE_EXIT_CODE: i32 = 2;

/// How a launched child's work ended, before it becomes an exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildOutcome {
    Completed,
    StoppedBySignal { signal: i32, code: i32 },
    ExplicitExit(i32),
    Failed(String),
}

impl ChildOutcome {
    #[must_use]
    pub fn from_result(result: AppResult<()>) -> Self {
        match result {
            Ok(()) => ChildOutcome::Completed,
            Err(AppError::Launch(LaunchError::Stopped { signal, code })) => {
                ChildOutcome::StoppedBySignal { signal, code }
            }
            Err(AppError::Launch(LaunchError::ExitRequested { code })) => {
                ChildOutcome::ExplicitExit(code)
            }
            Err(err) => ChildOutcome::Failed(diagnostic(&err)),
        }
    }

    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_owned());
        ChildOutcome::Failed(format!("panicked: {}", message))
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            ChildOutcome::Completed => 0,
            ChildOutcome::StoppedBySignal { code, .. } => *code,
            ChildOutcome::ExplicitExit(code) => *code,
            ChildOutcome::Failed(_) => FAILURE_EXIT_CODE,
        }
    }

    /// Logs the outcome on behalf of process `pid`.
    pub fn report(&self, pid: u32) {
        match self {
            ChildOutcome::Completed => {}
            ChildOutcome::StoppedBySignal { signal, .. } => {
                info!("{}: Stopped by {} ({})", pid, signal_name(*signal), signal);
            }
            ChildOutcome::ExplicitExit(code) => {
                info!("{}: Exiting with status {}", pid, code);
            }
            ChildOutcome::Failed(diagnostic) => {
                error!("{}: Unhandled failure: {}", pid, diagnostic);
            }
        }
    }
}

/// Renders an error with its whole source chain and debug form.
fn diagnostic(err: &AppError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        if write!(text, "\n  caused by: {}", cause).is_err() {
            return text;
        }
        source = cause.source();
    }
    if write!(text, "\n  details: {:?}", err).is_err() {
        return text;
    }
    text
}
