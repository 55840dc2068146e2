//! Feeder and worker processes joined by a shared queue.
mod feeder;
mod orchestrator;
mod queue;
mod worker;


use std::thread;
use std::time::Duration;

use crate::environ::Environment;
use crate::error::AppResult;
use crate::launcher::StopFlag;

pub use feeder::feed;
pub use orchestrator::{DEFAULT_DRAIN_INTERVAL, RunSummary, run_pipeline};
pub use queue::{MAX_MESSAGE_BYTES, POP_WAKE_INTERVAL, SharedQueue};
pub use worker::serve;

/// Destination for synthesized request environments.
pub trait EnvironmentSink {
    /// # Errors
    ///
    /// Returns an error when the environment cannot be accepted.
    fn push(&self, env: &Environment) -> AppResult<()>;

    /// Pushes `env` unless `stop` is raised first. Returns whether the
    /// environment was delivered.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment cannot be accepted.
    fn push_unless_stopped(&self, env: &Environment, stop: &StopFlag) -> AppResult<bool> {
        if stop.raised().is_some() {
            return Ok(false);
        }
        self.push(env)?;
        Ok(true)
    }

    /// Waits out a gap in the timeline.
    ///
    /// # Errors
    ///
    /// Implementations may end the wait early with an error.
    fn pause(&self, delay: Duration) -> AppResult<()> {
        thread::sleep(delay);
        Ok(())
    }
}
