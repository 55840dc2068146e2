use std::time::Duration;

use crate::environ::{Environment, synthesize};
use crate::error::AppResult;
use crate::headers::HeaderMap;
use crate::runner::EnvironmentSink;

/// A scripted pause before the next request of a sequence.
///
/// The delay is kept exactly as written; negative, zero, and non-finite
/// values are accepted and simply produce no pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub delay: f64,
}

impl Gap {
    #[must_use]
    pub const fn new(delay: f64) -> Self {
        Self { delay }
    }

    /// The pause to honour, or `None` when the delay is not a positive,
    /// finite number of seconds.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.delay)
            .ok()
            .filter(|duration| !duration.is_zero())
    }
}

/// A finalized request: its headers are an independent snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    uri: String,
    headers: HeaderMap,
}

impl Request {
    #[must_use]
    pub fn new(method: &str, uri: &str, headers: HeaderMap) -> Self {
        Self {
            method: method.to_uppercase(),
            uri: uri.to_owned(),
            headers,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Projects this request into the environment handed to the filter
    /// pipeline.
    #[must_use]
    pub fn synthesize(&self) -> Environment {
        synthesize(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Request(Request),
    Gap(Gap),
}

/// A named, ordered timeline of requests and gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    name: String,
    entries: Vec<Entry>,
}

impl Sequence {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Request(request) => Some(request),
            Entry::Gap(_) => None,
        })
    }

    /// Replays the timeline into `sink`: pauses on every gap and pushes the
    /// synthesized environment of every request, in order.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the sink, including one that
    /// cuts a pause short.
    pub fn queue_requests<S>(&self, sink: &S) -> AppResult<()>
    where
        S: EnvironmentSink + ?Sized,
    {
        for entry in &self.entries {
            match entry {
                Entry::Gap(gap) => {
                    if let Some(delay) = gap.duration() {
                        sink.pause(delay)?;
                    }
                }
                Entry::Request(request) => sink.push(&request.synthesize())?,
            }
        }
        Ok(())
    }
}
