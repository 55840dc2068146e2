use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read request file '{path}': {source}")]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

/// The single grammar error raised while reading a request file.
///
/// Every variant of [`ParseFailure`] is fatal: the caller must not use a
/// partially parsed set of sequences.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason} {text:?} while reading file {file}:{line}")]
pub struct ParseError {
    pub file: String,
    pub line: usize,
    pub text: String,
    pub reason: ParseFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("Request outside of a sequence")]
    RequestOutsideSequence,
    #[error("Gap outside of a sequence")]
    GapOutsideSequence,
    #[error("Invalid sequence header")]
    InvalidSequenceHeader,
    #[error("Invalid gap value")]
    InvalidGapValue,
    #[error("Header continuation without a header")]
    ContinuationWithoutHeader,
    #[error("Unable to parse line")]
    UnparsableLine,
}
