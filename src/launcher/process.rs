use std::fmt;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::debug;

use crate::error::{AppResult, LaunchError};

use super::outcome::ChildOutcome;
use super::signals::{StopFlag, install_termination_handlers};

/// A child process id returned by [`start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(libc::pid_t);

impl Pid {
    #[must_use]
    pub const fn as_raw(self) -> libc::pid_t {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a reaped child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Exited(i32),
    Signaled(i32),
}

impl ExitStatus {
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self, ExitStatus::Exited(0))
    }
}

/// Forks one child that runs `task` and returns its pid to the parent
/// without blocking.
///
/// In the child, termination signals raise the [`StopFlag`] handed to
/// `task`; the result is reduced to a [`ChildOutcome`], logged, and the
/// child leaves through `_exit`, so nothing inherited from the parent is
/// flushed or torn down a second time.
///
/// # Errors
///
/// Returns an error when the fork itself fails.
pub fn start<F>(task: F) -> Result<Pid, LaunchError>
where
    F: FnOnce(&StopFlag) -> AppResult<()>,
{
    // SAFETY: the child only runs `task` and then calls `_exit`; it never
    // returns into the caller's stack frames.
    let pid = unsafe { libc::fork() };
    match pid {
        -1 => Err(LaunchError::Fork {
            source: io::Error::last_os_error(),
        }),
        0 => run_child(task),
        pid => {
            debug!("Started child process {}", pid);
            Ok(Pid(pid))
        }
    }
}

fn run_child<F>(task: F) -> !
where
    F: FnOnce(&StopFlag) -> AppResult<()>,
{
    let outcome = match install_termination_handlers() {
        Ok(flag) => supervise(&flag, task),
        Err(err) => ChildOutcome::from_result(Err(err.into())),
    };
    outcome.report(std::process::id());
    // SAFETY: _exit(2) terminates immediately without running atexit
    // handlers or flushing stdio buffers copied from the parent.
    unsafe { libc::_exit(outcome.exit_code()) }
}

/// Runs `task` and reduces whatever happens, panics included, to a
/// [`ChildOutcome`]. This is the in-process half of [`start`].
pub fn supervise<F>(flag: &StopFlag, task: F) -> ChildOutcome
where
    F: FnOnce(&StopFlag) -> AppResult<()>,
{
    match catch_unwind(AssertUnwindSafe(|| task(flag))) {
        Ok(result) => ChildOutcome::from_result(result),
        Err(payload) => ChildOutcome::from_panic(payload.as_ref()),
    }
}

/// Blocks until `pid` terminates and reaps it.
///
/// # Errors
///
/// Returns an error when the process cannot be waited for (for example,
/// it is not a child of this process).
pub fn wait(pid: Pid) -> Result<ExitStatus, LaunchError> {
    let mut status: libc::c_int = 0;
    loop {
        // SAFETY: status is a valid, exclusively borrowed c_int.
        let rc = unsafe { libc::waitpid(pid.0, &mut status, 0) };
        if rc != -1 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(LaunchError::Wait {
                pid: pid.0,
                source: err,
            });
        }
    }
    if libc::WIFEXITED(status) {
        Ok(ExitStatus::Exited(libc::WEXITSTATUS(status)))
    } else {
        Ok(ExitStatus::Signaled(libc::WTERMSIG(status)))
    }
}

/// Sends SIGTERM to `pid`. Returns `false` when the process is already gone.
///
/// # Errors
///
/// Returns an error for any failure other than the process not existing.
pub fn terminate(pid: Pid) -> Result<bool, LaunchError> {
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid.0, libc::SIGTERM) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        debug!("Process {} already exited", pid);
        return Ok(false);
    }
    Err(LaunchError::Kill {
        pid: pid.0,
        source: err,
    })
}
