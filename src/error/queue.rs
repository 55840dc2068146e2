use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Failed to create queue socket pair: {source}")]
    Create {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to push onto queue: {source}")]
    Push {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to pop from queue: {source}")]
    Pop {
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to inspect queue: {source}")]
    Peek {
        #[source]
        source: std::io::Error,
    },
    #[error("Queue message of {size} bytes exceeds the {max} byte limit.")]
    MessageTooLarge { size: usize, max: usize },
    #[error("Queue writer stopped before the sequence was fully buffered.")]
    WriterClosed,
    #[error("Failed to encode queue message: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to decode queue message: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}
