use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixDatagram;
use std::time::Duration;

use crate::environ::Environment;
use crate::error::{AppResult, QueueError};
use crate::launcher::StopFlag;

use super::EnvironmentSink;

/// Largest encoded environment the queue accepts.
pub const MAX_MESSAGE_BYTES: usize = 65_536;

/// How often a blocked [`SharedQueue::pop`] wakes to look at its stop flag.
pub const POP_WAKE_INTERVAL: Duration = Duration::from_millis(200);

/// Multi-producer, multi-consumer queue of environments shared by forked
/// processes.
///
/// Backed by a connected datagram socket pair created before any fork:
/// producers write to one end, consumers read from the other, and every
/// message is delivered whole to exactly one consumer. The kernel buffer
/// behind the socket is finite, so feeders put an unbounded in-process
/// buffer in front of it (see [`feed`](super::feed)).
#[derive(Debug)]
pub struct SharedQueue {
    sender: UnixDatagram,
    receiver: UnixDatagram,
}

impl SharedQueue {
    /// # Errors
    ///
    /// Returns an error when the socket pair cannot be created.
    pub fn new() -> Result<Self, QueueError> {
        let (sender, receiver) =
            UnixDatagram::pair().map_err(|source| QueueError::Create { source })?;
        receiver
            .set_read_timeout(Some(POP_WAKE_INTERVAL))
            .map_err(|source| QueueError::Create { source })?;
        sender
            .set_write_timeout(Some(POP_WAKE_INTERVAL))
            .map_err(|source| QueueError::Create { source })?;
        Ok(Self { sender, receiver })
    }

    /// Enqueues one environment, blocking while the socket buffer is full.
    ///
    /// # Errors
    ///
    /// Returns an error when the environment cannot be encoded, is larger
    /// than [`MAX_MESSAGE_BYTES`], or the socket write fails.
    pub fn push(&self, env: &Environment) -> Result<(), QueueError> {
        self.send(&encode(env)?, None)?;
        Ok(())
    }

    /// Like [`SharedQueue::push`], but gives up waiting for buffer space
    /// once `stop` is raised. Returns whether the environment was enqueued.
    ///
    /// # Errors
    ///
    /// Same as [`SharedQueue::push`].
    pub fn push_unless_stopped(
        &self,
        env: &Environment,
        stop: &StopFlag,
    ) -> Result<bool, QueueError> {
        self.send(&encode(env)?, Some(stop))
    }

    fn send(&self, message: &[u8], stop: Option<&StopFlag>) -> Result<bool, QueueError> {
        loop {
            if stop.is_some_and(|stop| stop.raised().is_some()) {
                return Ok(false);
            }
            match self.sender.send(message) {
                Ok(_) => return Ok(true),
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(source) => return Err(QueueError::Push { source }),
            }
        }
    }

    /// Dequeues the next environment, blocking until one arrives.
    ///
    /// Returns `Ok(None)` once `stop` is raised while waiting.
    ///
    /// # Errors
    ///
    /// Returns an error when the socket read fails or a message cannot be
    /// decoded.
    pub fn pop(&self, stop: &StopFlag) -> Result<Option<Environment>, QueueError> {
        let mut buffer = vec![0_u8; MAX_MESSAGE_BYTES];
        loop {
            if stop.raised().is_some() {
                return Ok(None);
            }
            match self.receiver.recv(&mut buffer) {
                Ok(len) => {
                    let env = serde_json::from_slice(buffer.get(..len).unwrap_or_default())
                        .map_err(|source| QueueError::Decode { source })?;
                    return Ok(Some(env));
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(source) => return Err(QueueError::Pop { source }),
            }
        }
    }

    /// Whether no message is waiting. Only a snapshot: producers and
    /// consumers in other processes may change it immediately.
    ///
    /// # Errors
    ///
    /// Returns an error when the socket cannot be inspected.
    pub fn is_empty(&self) -> Result<bool, QueueError> {
        let mut probe = [0_u8; 1];
        // SAFETY: probe is a valid writable buffer of the length passed and
        // the descriptor stays open for the lifetime of `self`.
        let rc = unsafe {
            libc::recv(
                self.receiver.as_raw_fd(),
                probe.as_mut_ptr().cast(),
                probe.len(),
                libc::MSG_PEEK | libc::MSG_DONTWAIT,
            )
        };
        if rc >= 0 {
            return Ok(false);
        }
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::WouldBlock {
            Ok(true)
        } else {
            Err(QueueError::Peek { source: err })
        }
    }
}

fn encode(env: &Environment) -> Result<Vec<u8>, QueueError> {
    let message = serde_json::to_vec(env).map_err(|source| QueueError::Encode { source })?;
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(QueueError::MessageTooLarge {
            size: message.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }
    Ok(message)
}

impl EnvironmentSink for SharedQueue {
    fn push(&self, env: &Environment) -> AppResult<()> {
        Ok(SharedQueue::push(self, env)?)
    }

    fn push_unless_stopped(&self, env: &Environment, stop: &StopFlag) -> AppResult<bool> {
        Ok(SharedQueue::push_unless_stopped(self, env, stop)?)
    }
}
