use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

use crate::error::{HeaderError, ParseError, ParseFailure, ScriptError};
use crate::headers::{PartialHeader, ScopedHeaders, SharedHeaders, canonical_name};

use super::model::{Entry, Gap, Request, Sequence};

/// Where in which file a line came from; attached to every parse error.
#[derive(Debug, Clone, Copy)]
struct LineContext<'line> {
    file: &'line str,
    line: usize,
    text: &'line str,
}

impl LineContext<'_> {
    fn error(&self, reason: ParseFailure) -> ParseError {
        ParseError {
            file: self.file.to_owned(),
            line: self.line,
            text: self.text.to_owned(),
            reason,
        }
    }
}

/// A sequence under construction together with its header layer.
#[derive(Debug)]
struct SequenceScope {
    headers: SharedHeaders,
    sequence: Sequence,
}

/// A request whose headers are still a live view of its sequence.
#[derive(Debug)]
struct OpenRequest {
    method: String,
    uri: String,
    headers: ScopedHeaders,
}

/// Parser state, created once per run and reused for every input file.
///
/// At most one request and one partial header are open at a time; opening
/// anything new flushes them first.
#[derive(Debug)]
pub struct ParseState {
    global: SharedHeaders,
    sequences: BTreeMap<String, SequenceScope>,
    current: Option<String>,
    request: Option<OpenRequest>,
    header: Option<PartialHeader>,
}

impl Default for ParseState {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: ScopedHeaders::new().into_shared(),
            sequences: BTreeMap::new(),
            current: None,
            request: None,
            header: None,
        }
    }

    /// Parses one file's worth of description text, then closes the file:
    /// pending header and request are flushed, scope returns to global, and
    /// header overrides are reset everywhere while sequence entries are kept.
    ///
    /// # Errors
    ///
    /// Returns the first grammar violation found; the state must then be
    /// discarded.
    pub fn parse_source(&mut self, file: &str, source: &str) -> Result<(), ParseError> {
        for (index, raw) in source.lines().enumerate() {
            let context = LineContext {
                file,
                line: index.saturating_add(1),
                text: raw,
            };
            self.process_line(context)?;
        }
        self.finish_file();
        Ok(())
    }

    #[must_use]
    pub fn into_sequences(self) -> Vec<Sequence> {
        self.sequences
            .into_values()
            .map(|scope| scope.sequence)
            .collect()
    }

    fn process_line(&mut self, context: LineContext<'_>) -> Result<(), ParseError> {
        let raw = context.text;
        if raw.starts_with('#') {
            return Ok(());
        }

        let uncommented = strip_inline_comment(raw);
        let continuation = uncommented.starts_with(char::is_whitespace);
        let line = uncommented.trim();
        if line.is_empty() {
            return Ok(());
        }
        let context = LineContext {
            text: line,
            ..context
        };

        if continuation {
            return self.extend_header(context, line);
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or_else(|| context.error(ParseFailure::InvalidSequenceHeader))?;
            self.start_sequence(name.trim());
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix('+') {
            let delay: f64 = rest.trim().parse().map_err(|err| {
                debug!("Rejecting gap value {:?}: {}", rest, err);
                context.error(ParseFailure::InvalidGapValue)
            })?;
            return self.push_gap(context, delay);
        }
        if let Some(rest) = line.strip_prefix('-') {
            self.delete_header(rest.trim());
            return Ok(());
        }
        if let Some(rest) = line.strip_prefix('!') {
            self.reset_header(rest.trim());
            return Ok(());
        }

        let split = line
            .find(|ch: char| ch.is_whitespace() || ch == ':')
            .ok_or_else(|| context.error(ParseFailure::UnparsableLine))?;
        let (head, tail) = line.split_at(split);
        match tail.strip_prefix(':') {
            Some(value) => {
                self.start_header(head, value.trim());
                Ok(())
            }
            None => self.start_request(context, head, tail.trim()),
        }
    }

    fn start_sequence(&mut self, name: &str) {
        self.finish_header();
        self.finish_request();

        if name.is_empty() {
            self.current = None;
            return;
        }
        if !self.sequences.contains_key(name) {
            let headers = ScopedHeaders::stacked(Rc::clone(&self.global)).into_shared();
            self.sequences.insert(
                name.to_owned(),
                SequenceScope {
                    headers,
                    sequence: Sequence::new(name),
                },
            );
        }
        self.current = Some(name.to_owned());
    }

    fn start_request(
        &mut self,
        context: LineContext<'_>,
        method: &str,
        uri: &str,
    ) -> Result<(), ParseError> {
        let parent = self
            .current_scope()
            .map(|scope| Rc::clone(&scope.headers))
            .ok_or_else(|| context.error(ParseFailure::RequestOutsideSequence))?;

        self.finish_header();
        self.finish_request();

        self.request = Some(OpenRequest {
            method: method.to_owned(),
            uri: uri.to_owned(),
            headers: ScopedHeaders::stacked(parent),
        });
        Ok(())
    }

    fn push_gap(&mut self, context: LineContext<'_>, delay: f64) -> Result<(), ParseError> {
        if self.current_scope().is_none() {
            return Err(context.error(ParseFailure::GapOutsideSequence));
        }

        self.finish_header();
        self.finish_request();

        if let Some(scope) = self.current_scope_mut() {
            scope.sequence.push(Entry::Gap(Gap::new(delay)));
        }
        Ok(())
    }

    fn start_header(&mut self, name: &str, value: &str) {
        self.finish_header();
        self.header = Some(PartialHeader::new(name, value));
    }

    fn extend_header(&mut self, context: LineContext<'_>, text: &str) -> Result<(), ParseError> {
        let header = self
            .header
            .as_mut()
            .ok_or_else(|| context.error(ParseFailure::ContinuationWithoutHeader))?;
        header.extend(text);
        Ok(())
    }

    fn delete_header(&mut self, name: &str) {
        self.finish_header();
        let key = canonical_name(name);
        match self.with_scope(|headers| headers.delete(&key)) {
            Ok(()) => {}
            Err(HeaderError::NotFound { .. }) => {
                debug!("Ignoring deletion of unset header {}", key);
            }
        }
    }

    fn reset_header(&mut self, name: &str) {
        self.finish_header();
        let key = canonical_name(name);
        self.with_scope(|headers| headers.reset(&key));
    }

    /// Applies the open partial header to whichever scope is active now.
    fn finish_header(&mut self) {
        if let Some(header) = self.header.take() {
            self.with_scope(|headers| header.apply(headers));
        }
    }

    /// Freezes the open request's headers and appends it to its sequence.
    fn finish_request(&mut self) {
        let Some(open) = self.request.take() else {
            return;
        };
        let request = Request::new(&open.method, &open.uri, open.headers.flatten());
        if let Some(scope) = self.current_scope_mut() {
            scope.sequence.push(Entry::Request(request));
        }
    }

    fn finish_file(&mut self) {
        self.finish_header();
        self.finish_request();
        self.current = None;

        self.global.borrow_mut().reset_all();
        for scope in self.sequences.values() {
            scope.headers.borrow_mut().reset_all();
        }
    }

    fn current_scope(&self) -> Option<&SequenceScope> {
        self.current
            .as_deref()
            .and_then(|name| self.sequences.get(name))
    }

    fn current_scope_mut(&mut self) -> Option<&mut SequenceScope> {
        match self.current.as_deref() {
            Some(name) => self.sequences.get_mut(name),
            None => None,
        }
    }

    /// Runs `apply` against the innermost active header scope: the open
    /// request, else the current sequence, else the global scope.
    fn with_scope<R>(&mut self, apply: impl FnOnce(&mut ScopedHeaders) -> R) -> R {
        if let Some(request) = self.request.as_mut() {
            return apply(&mut request.headers);
        }
        let shared = self
            .current_scope()
            .map_or_else(|| Rc::clone(&self.global), |scope| Rc::clone(&scope.headers));
        let mut headers = shared.borrow_mut();
        apply(&mut *headers)
    }
}

/// Cuts the line at the first `#` that follows a whitespace character. A
/// `#` at the very start of the text is never treated as a comment here.
fn strip_inline_comment(line: &str) -> &str {
    let mut previous: Option<char> = None;
    for (index, ch) in line.char_indices() {
        if ch == '#' && previous.is_some_and(char::is_whitespace) {
            return line.split_at(index).0;
        }
        previous = Some(ch);
    }
    line
}

/// Parses description text that did not come from disk, as a single file.
///
/// # Errors
///
/// Returns a [`ParseError`] for the first grammar violation.
pub fn parse_str(file: &str, source: &str) -> Result<Vec<Sequence>, ParseError> {
    let mut state = ParseState::new();
    state.parse_source(file, source)?;
    Ok(state.into_sequences())
}

/// Parses every request file in order with one shared state, so sequences
/// with the same name accumulate entries across files.
///
/// # Errors
///
/// Returns an error when a file cannot be read or contains a grammar
/// violation. Nothing parsed so far is returned in that case.
pub fn parse_files<P>(paths: &[P]) -> Result<Vec<Sequence>, ScriptError>
where
    P: AsRef<Path>,
{
    let mut state = ParseState::new();
    for path in paths {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ScriptError::ReadScript {
            path: path.to_path_buf(),
            source: err,
        })?;
        state.parse_source(&path.display().to_string(), &source)?;
        debug!("Parsed request file {}", path.display());
    }
    Ok(state.into_sequences())
}
