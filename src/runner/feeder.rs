use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::environ::Environment;
use crate::error::{AppResult, QueueError};
use crate::launcher::StopFlag;
use crate::script::Sequence;

use super::EnvironmentSink;

/// Sink that refuses further pushes once its stop flag is raised, and whose
/// pauses end as soon as it is.
struct StoppableSink<'sink, S: ?Sized> {
    inner: &'sink S,
    stop: &'sink StopFlag,
}

impl<S> EnvironmentSink for StoppableSink<'_, S>
where
    S: EnvironmentSink + ?Sized,
{
    fn push(&self, env: &Environment) -> AppResult<()> {
        self.stop.check()?;
        self.inner.push(env)
    }

    fn pause(&self, delay: Duration) -> AppResult<()> {
        Ok(self.stop.sleep(delay)?)
    }
}

/// Unbounded in-process buffer. Pushing never blocks, so gaps keep their
/// timing however far the consumers of the real sink fall behind.
struct BufferedSink {
    sender: mpsc::Sender<Environment>,
}

impl EnvironmentSink for BufferedSink {
    fn push(&self, env: &Environment) -> AppResult<()> {
        if self.sender.send(env.clone()).is_err() {
            return Err(QueueError::WriterClosed.into());
        }
        Ok(())
    }
}

/// Writer thread body: forwards buffered environments to `sink` in order
/// until the buffer closes or `stop` is raised.
fn forward<S>(buffer: mpsc::Receiver<Environment>, sink: &S, stop: &StopFlag) -> AppResult<usize>
where
    S: EnvironmentSink + ?Sized,
{
    let mut forwarded = 0_usize;
    for env in buffer {
        if !sink.push_unless_stopped(&env, stop)? {
            stop.check()?;
        }
        forwarded = forwarded.saturating_add(1);
    }
    Ok(forwarded)
}

/// Feeder process body: replays `sequence` into `sink`, then returns once
/// everything replayed has reached the sink.
///
/// The timeline runs against an unbounded buffer drained into `sink` by a
/// writer thread. Once `stop` is raised, whatever is still buffered is
/// dropped.
///
/// # Errors
///
/// Returns the stopped-by-signal condition when `stop` is raised before
/// the sequence is exhausted, or any error from the sink.
pub fn feed<S>(sequence: &Sequence, sink: &S, stop: &StopFlag) -> AppResult<()>
where
    S: EnvironmentSink + Sync + ?Sized,
{
    let pid = std::process::id();
    info!(
        "{}: Feeding sequence {:?} ({} requests)",
        pid,
        sequence.name(),
        sequence.requests().count()
    );

    let (sender, buffer) = mpsc::channel();
    let (queued, forwarded) = thread::scope(|scope| {
        let writer = scope.spawn(move || forward(buffer, sink, stop));
        let buffered = BufferedSink { sender };
        let queued = sequence.queue_requests(&StoppableSink {
            inner: &buffered,
            stop,
        });
        // Closing the buffer lets the writer finish.
        drop(buffered);
        let forwarded = writer
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
        (queued, forwarded)
    });

    // A writer failure is what closes the buffer, so it is reported first.
    let forwarded = forwarded?;
    queued?;
    debug!(
        "{}: Sequence {:?} fully queued ({} environments)",
        pid,
        sequence.name(),
        forwarded
    );
    Ok(())
}
