use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::launcher::{self, ExitStatus, FAILURE_EXIT_CODE, Pid, signal_name};
use crate::pipeline::ReplayServer;
use crate::script::Sequence;

use super::{SharedQueue, feed, serve};

/// Default pause between checks that the queue has drained.
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Exit statuses collected from one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feeders: Vec<(String, ExitStatus)>,
    pub workers: Vec<ExitStatus>,
}

impl RunSummary {
    /// Whether every feeder replayed its whole sequence.
    #[must_use]
    pub fn feeders_succeeded(&self) -> bool {
        self.feeders.iter().all(|(_, status)| status.success())
    }
}

/// Replays `sequences` through `workers` worker processes running `server`.
///
/// Workers start first, then one feeder per sequence. Once every feeder has
/// exited and the queue looks empty the workers are sent SIGTERM and reaped.
/// The drain check polls every `drain_interval` and is only a heuristic.
///
/// # Errors
///
/// Returns an error when the queue cannot be created, a process cannot be
/// started or reaped, or the queue cannot be inspected. Every process
/// already started is terminated and reaped before an error is returned.
pub fn run_pipeline(
    sequences: &[Sequence],
    workers: NonZeroUsize,
    server: &ReplayServer,
    drain_interval: Duration,
) -> AppResult<RunSummary> {
    let queue = SharedQueue::new()?;

    let mut pool = ProcessGroup::new("Worker");
    for _ in 0..workers.get() {
        pool.push(launcher::start(|stop| serve(&queue, server, stop))?);
    }
    info!("Started {} worker(s)", pool.len());

    let mut feeders = ProcessGroup::new("Feeder");
    let mut names = Vec::with_capacity(sequences.len());
    for sequence in sequences {
        feeders.push(launcher::start(|stop| feed(sequence, &queue, stop))?);
        names.push(sequence.name().to_owned());
    }
    info!("Started {} feeder(s)", feeders.len());

    let mut summary = RunSummary::default();
    for (name, status) in names.into_iter().zip(feeders.join()?) {
        if !status.success() {
            warn!("Sequence {:?} was not fully replayed", name);
        }
        summary.feeders.push((name, status));
    }

    while !queue.is_empty()? {
        debug!("Waiting {:?} for the queue to drain", drain_interval);
        thread::sleep(drain_interval);
    }

    summary.workers = pool.stop()?;
    Ok(summary)
}

/// Child processes of one role. Members still running when the group is
/// dropped are terminated and reaped, so an early return never leaves
/// them behind.
#[derive(Debug)]
pub(super) struct ProcessGroup {
    role: &'static str,
    pids: VecDeque<Pid>,
}

impl ProcessGroup {
    pub(super) const fn new(role: &'static str) -> Self {
        Self {
            role,
            pids: VecDeque::new(),
        }
    }

    pub(super) fn push(&mut self, pid: Pid) {
        self.pids.push_back(pid);
    }

    pub(super) fn len(&self) -> usize {
        self.pids.len()
    }

    /// Waits for every member to exit on its own, in start order.
    pub(super) fn join(mut self) -> AppResult<Vec<ExitStatus>> {
        let mut statuses = Vec::with_capacity(self.pids.len());
        while let Some(pid) = self.pids.front().copied() {
            let status = launcher::wait(pid)?;
            self.pids.pop_front();
            log_exit(self.role, pid, status);
            statuses.push(status);
        }
        Ok(statuses)
    }

    /// Sends SIGTERM to every member, then reaps them all.
    pub(super) fn stop(mut self) -> AppResult<Vec<ExitStatus>> {
        let pids: Vec<Pid> = self.pids.drain(..).collect();
        stop_all(self.role, &pids)
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if self.pids.is_empty() {
            return;
        }
        let pids: Vec<Pid> = self.pids.drain(..).collect();
        warn!("Stopping {} leftover {} process(es)", pids.len(), self.role);
        if let Err(err) = stop_all(self.role, &pids) {
            warn!("Cleanup of {} processes incomplete: {}", self.role, err);
        }
    }
}

/// Signals and reaps every process in `pids`. Each one is attempted; the
/// first failure is returned once all are done.
fn stop_all(role: &str, pids: &[Pid]) -> AppResult<Vec<ExitStatus>> {
    let mut first_error: Option<AppError> = None;
    let mut signalled = Vec::with_capacity(pids.len());
    for pid in pids {
        match launcher::terminate(*pid) {
            Ok(true) => signalled.push(*pid),
            Ok(false) => debug!("{} {} was already gone", role, pid),
            Err(err) => {
                warn!("Failed to signal {} {}: {}", role, pid, err);
                if first_error.is_none() {
                    first_error = Some(err.into());
                }
            }
        }
    }

    let mut statuses = Vec::with_capacity(signalled.len());
    for pid in signalled {
        match launcher::wait(pid) {
            Ok(status) => {
                log_exit(role, pid, status);
                statuses.push(status);
            }
            Err(err) => {
                warn!("Failed to reap {} {}: {}", role, pid, err);
                if first_error.is_none() {
                    first_error = Some(err.into());
                }
            }
        }
    }
    first_error.map_or(Ok(statuses), Err)
}

fn log_exit(role: &str, pid: Pid, status: ExitStatus) {
    match status {
        ExitStatus::Exited(FAILURE_EXIT_CODE) => {
            warn!("{} {} failed, see its log for the diagnostic", role, pid);
        }
        ExitStatus::Exited(code) => debug!("{} {} exited with status {}", role, pid, code),
        ExitStatus::Signaled(signal) => {
            warn!("{} {} killed by {} ({})", role, pid, signal_name(signal), signal);
        }
    }
}
