//! Fork-based child processes with cooperative signal handling.
//!
//! [`start`] forks a child that runs a task with a [`StopFlag`]. Termination
//! signals raise the flag rather than killing the child, so the task can
//! wind down and report a [`ChildOutcome`] that becomes its exit status.
mod outcome;
mod process;
mod signals;


pub use outcome::{ChildOutcome, FAILURE_EXIT_CODE};
pub use process::{ExitStatus, Pid, start, supervise, terminate, wait};
pub use signals::{
    DEFAULT_STOP_CODE, STOP_POLL_INTERVAL, StopFlag, TERMINATION_SIGNALS,
    install_termination_handlers, signal_name,
};
