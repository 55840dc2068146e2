use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::LaunchError;

/// Signals a launched child treats as a request to stop.
pub const TERMINATION_SIGNALS: [libc::c_int; 4] =
    [libc::SIGTERM, libc::SIGINT, libc::SIGHUP, libc::SIGQUIT];

/// Exit status of a child stopped by one of [`TERMINATION_SIGNALS`].
pub const DEFAULT_STOP_CODE: i32 = 1;

/// Longest stretch [`StopFlag::sleep`] sleeps without looking at the flag.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Flag the signal handler raises in the child process.
static PROCESS_FLAG: OnceLock<StopFlag> = OnceLock::new();

/// Cooperative stop flag. Long-running child loops poll it and wind down
/// once it is raised.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    signal: Arc<AtomicI32>,
}

impl StopFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self, signal: i32) {
        self.signal.store(signal, Ordering::SeqCst);
    }

    /// The signal that raised the flag, if any.
    #[must_use]
    pub fn raised(&self) -> Option<i32> {
        match self.signal.load(Ordering::SeqCst) {
            0 => None,
            signal => Some(signal),
        }
    }

    /// Turns a raised flag into the stopped-by-signal condition.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Stopped`] once the flag has been raised.
    pub fn check(&self) -> Result<(), LaunchError> {
        match self.raised() {
            Some(signal) => Err(LaunchError::Stopped {
                signal,
                code: DEFAULT_STOP_CODE,
            }),
            None => Ok(()),
        }
    }

    /// Sleeps for `delay`, waking early once the flag is raised.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Stopped`] when the flag is raised before or
    /// during the sleep.
    pub fn sleep(&self, delay: Duration) -> Result<(), LaunchError> {
        let deadline = Instant::now().checked_add(delay);
        loop {
            self.check()?;
            let remaining = deadline.map_or(STOP_POLL_INTERVAL, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
            if remaining.is_zero() {
                return Ok(());
            }
            thread::sleep(remaining.min(STOP_POLL_INTERVAL));
        }
    }
}

extern "C" fn on_termination(signal: libc::c_int) {
    if let Some(flag) = PROCESS_FLAG.get() {
        flag.raise(signal);
    }
    // SAFETY: signal(2) is async-signal-safe. Restoring the default
    // disposition lets a second delivery terminate the process outright.
    unsafe {
        libc::signal(signal, libc::SIG_DFL);
    }
}

/// Routes every termination signal to the process stop flag and returns it.
///
/// # Errors
///
/// Returns an error when a handler cannot be installed.
pub fn install_termination_handlers() -> Result<StopFlag, LaunchError> {
    let flag = PROCESS_FLAG.get_or_init(StopFlag::new).clone();
    let handler = on_termination as extern "C" fn(libc::c_int) as libc::sighandler_t;

    for signal in TERMINATION_SIGNALS {
        // SAFETY: an all-zero sigaction is a valid value: empty mask, no flags.
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = handler;
        // SAFETY: sa_mask is a valid, exclusively borrowed sigset_t.
        unsafe {
            libc::sigemptyset(&mut action.sa_mask);
        }
        // No SA_RESTART: blocking calls return EINTR so loops notice the flag.
        // SAFETY: action is fully initialized and the old action is not requested.
        let rc = unsafe { libc::sigaction(signal, &action, std::ptr::null_mut()) };
        if rc != 0 {
            return Err(LaunchError::InstallHandler {
                name: signal_name(signal),
                source: std::io::Error::last_os_error(),
            });
        }
    }
    Ok(flag)
}

#[must_use]
pub const fn signal_name(signal: i32) -> &'static str {
    match signal {
        libc::SIGTERM => "SIGTERM",
        libc::SIGINT => "SIGINT",
        libc::SIGHUP => "SIGHUP",
        libc::SIGQUIT => "SIGQUIT",
        libc::SIGKILL => "SIGKILL",
        libc::SIGUSR1 => "SIGUSR1",
        libc::SIGUSR2 => "SIGUSR2",
        _ => "unknown signal",
    }
}
