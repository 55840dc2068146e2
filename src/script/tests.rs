use super::*;
use crate::error::{ParseError, ParseFailure, ScriptError};
use std::path::PathBuf;
use tempfile::tempdir;

fn find<'seq>(sequences: &'seq [Sequence], name: &str) -> Result<&'seq Sequence, String> {
    sequences
        .iter()
        .find(|sequence| sequence.name() == name)
        .ok_or_else(|| format!("Missing sequence {}", name))
}

fn request_at(sequence: &Sequence, index: usize) -> Result<&Request, String> {
    match sequence.entries().get(index) {
        Some(Entry::Request(request)) => Ok(request),
        Some(Entry::Gap(_)) => Err(format!("Entry {} is a gap", index)),
        None => Err(format!("Entry {} missing", index)),
    }
}

fn expect_failure(source: &str, expected: ParseFailure) -> Result<ParseError, String> {
    match parse_str("test.req", source) {
        Ok(_) => Err(format!("Expected {:?} for {:?}", expected, source)),
        Err(err) if err.reason == expected => Ok(err),
        Err(err) => Err(format!("Expected {:?}, got {}", expected, err)),
    }
}

#[test]
fn scoping_end_to_end() -> Result<(), String> {
    let source = "global-header: value\n[seq1]\n+2.5\nget /path?x=1\n";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    if sequences.len() != 1 {
        return Err(format!("Expected one sequence, got {}", sequences.len()));
    }
    let sequence = find(&sequences, "seq1")?;
    if sequence.entries().len() != 2 {
        return Err("Expected two entries".to_owned());
    }
    match sequence.entries().first() {
        Some(Entry::Gap(gap)) if gap.duration() == Some(std::time::Duration::from_millis(2500)) => {}
        other => return Err(format!("Expected 2.5s gap, got {:?}", other)),
    }
    let request = request_at(sequence, 1)?;
    if request.method() != "GET" || request.uri() != "/path?x=1" {
        return Err(format!("Unexpected request {:?}", request));
    }
    if request.header("GLOBAL_HEADER") != Some("value") {
        return Err("Missing inherited global header".to_owned());
    }
    Ok(())
}

#[test]
fn finalized_request_is_frozen() -> Result<(), String> {
    let source = "\
global-header: value
[seq1]
get /first
[]
late-header: too-late
[seq1]
get /second
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq1")?;
    let first = request_at(sequence, 0)?;
    let second = request_at(sequence, 1)?;
    if first.header("LATE_HEADER").is_some() {
        return Err("Global header leaked into a finalized request".to_owned());
    }
    if second.header("LATE_HEADER") != Some("too-late") {
        return Err("Later request should inherit the new global header".to_owned());
    }
    Ok(())
}

#[test]
fn headers_after_request_line_belong_to_request() -> Result<(), String> {
    let source = "\
[seq]
x-seq: one
post /a
x-req: two
get /b
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq")?;
    let first = request_at(sequence, 0)?;
    let second = request_at(sequence, 1)?;
    if first.method() != "POST" || first.header("X_REQ") != Some("two") {
        return Err(format!("Unexpected first request {:?}", first));
    }
    if first.header("X_SEQ") != Some("one") || second.header("X_SEQ") != Some("one") {
        return Err("Sequence header should reach both requests".to_owned());
    }
    if second.header("X_REQ").is_some() {
        return Err("Request header leaked into the next request".to_owned());
    }
    Ok(())
}

#[test]
fn continuation_lines_extend_header() -> Result<(), String> {
    let source = "\
[seq]
get /
accept: text/plain,
    application/json   # trailing comment
  text/html
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let request = request_at(find(&sequences, "seq")?, 0)?;
    if request.header("ACCEPT") != Some("text/plain, application/json text/html") {
        return Err(format!("Unexpected accept {:?}", request.header("ACCEPT")));
    }
    Ok(())
}

#[test]
fn continuation_of_empty_header_keeps_separator() -> Result<(), String> {
    let sequences =
        parse_str("test.req", "[s]\nGET /\nx-a:\n  more\n").map_err(|err| err.to_string())?;
    let request = request_at(find(&sequences, "s")?, 0)?;
    if request.header("X_A") != Some(" more") {
        return Err(format!("Unexpected X_A {:?}", request.header("X_A")));
    }
    Ok(())
}

#[test]
fn comments_are_stripped_only_after_whitespace() -> Result<(), String> {
    let source = "\
# leading comment
[seq] # the sequence
get /page#fragment # comment
x-color:#fff
x-note: keep # dropped
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let request = request_at(find(&sequences, "seq")?, 0)?;
    if request.uri() != "/page#fragment" {
        return Err(format!("Unexpected uri {:?}", request.uri()));
    }
    if request.header("X_COLOR") != Some("#fff") {
        return Err(format!("Unexpected color {:?}", request.header("X_COLOR")));
    }
    if request.header("X_NOTE") != Some("keep") {
        return Err(format!("Unexpected note {:?}", request.header("X_NOTE")));
    }
    Ok(())
}

#[test]
fn delete_and_reset_directives() -> Result<(), String> {
    let source = "\
x-token: global
x-agent: train
[seq]
-x-token
-x-missing
get /deleted
[seq]
x-agent: sequence
get /overridden
!x-agent
get /reset
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq")?;
    let deleted = request_at(sequence, 0)?;
    let overridden = request_at(sequence, 1)?;
    let reset = request_at(sequence, 2)?;
    if deleted.header("X_TOKEN").is_some() || deleted.header("X_AGENT") != Some("train") {
        return Err(format!("Unexpected headers {:?}", deleted.headers()));
    }
    if overridden.header("X_AGENT") != Some("sequence") {
        return Err(format!("Unexpected headers {:?}", overridden.headers()));
    }
    if reset.header("X_AGENT") != Some("sequence") {
        return Err("Reset applied to the request scope should keep the sequence value".to_owned());
    }
    Ok(())
}

#[test]
fn reset_in_sequence_scope_restores_global_value() -> Result<(), String> {
    let source = "\
x-agent: global
[seq]
x-agent: sequence
get /one
+0
!x-agent
get /two
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq")?;
    if request_at(sequence, 0)?.header("X_AGENT") != Some("sequence") {
        return Err("Expected sequence override".to_owned());
    }
    if request_at(sequence, 2)?.header("X_AGENT") != Some("global") {
        return Err("Expected inherited global value after reset".to_owned());
    }
    Ok(())
}

#[test]
fn delete_in_request_scope_hides_inherited_header() -> Result<(), String> {
    let source = "\
x-token: global
[seq]
get /one
-x-token
get /two
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq")?;
    if request_at(sequence, 0)?.header("X_TOKEN").is_some() {
        return Err("Deleted header should be absent".to_owned());
    }
    if request_at(sequence, 1)?.header("X_TOKEN") != Some("global") {
        return Err("Deletion should stay on the request".to_owned());
    }
    Ok(())
}

#[test]
fn empty_brackets_return_to_global_scope() -> Result<(), String> {
    let source = "\
[seq]
get /one
[ ]
x-late: value
[seq]
get /two
";
    let sequences = parse_str("test.req", source).map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq")?;
    if request_at(sequence, 1)?.header("X_LATE") != Some("value") {
        return Err("Header set in global scope should be inherited".to_owned());
    }
    Ok(())
}

#[test]
fn negative_and_zero_gaps_are_accepted() -> Result<(), String> {
    let sequences =
        parse_str("test.req", "[seq]\n+-1\n+0\n").map_err(|err| err.to_string())?;
    let sequence = find(&sequences, "seq")?;
    let gaps: Vec<Option<std::time::Duration>> = sequence
        .entries()
        .iter()
        .filter_map(|entry| match entry {
            Entry::Gap(gap) => Some(gap.duration()),
            Entry::Request(_) => None,
        })
        .collect();
    if gaps != vec![None, None] {
        return Err(format!("Unexpected gaps {:?}", gaps));
    }
    Ok(())
}

#[test]
fn malformed_sequence_header_fails() -> Result<(), String> {
    let err = expect_failure("[bad_sequence\n", ParseFailure::InvalidSequenceHeader)?;
    if err.file != "test.req" || err.line != 1 || err.text != "[bad_sequence" {
        return Err(format!("Unexpected context {:?}", err));
    }
    Ok(())
}

#[test]
fn non_numeric_gap_fails() -> Result<(), String> {
    expect_failure("[seq]\n+12.three\n", ParseFailure::InvalidGapValue).map(drop)
}

#[test]
fn bare_word_fails() -> Result<(), String> {
    let err = expect_failure("[seq]\n\nsomething\n", ParseFailure::UnparsableLine)?;
    if err.line != 3 {
        return Err(format!("Expected line 3, got {}", err.line));
    }
    Ok(())
}

#[test]
fn continuation_without_header_fails() -> Result<(), String> {
    expect_failure("[seq]\n  dangling\n", ParseFailure::ContinuationWithoutHeader).map(drop)
}

#[test]
fn request_outside_sequence_fails() -> Result<(), String> {
    expect_failure("get /\n", ParseFailure::RequestOutsideSequence).map(drop)
}

#[test]
fn gap_outside_sequence_fails() -> Result<(), String> {
    expect_failure("+1\n", ParseFailure::GapOutsideSequence).map(drop)
}

#[test]
fn parse_files_accumulates_sequences_and_resets_overrides() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let first = dir.path().join("first.req");
    let second = dir.path().join("second.req");
    std::fs::write(
        &first,
        "x-global: one\n[seq1]\nx-file: one\nget /first\n[other]\nget /other\n",
    )
    .map_err(|err| format!("write failed: {}", err))?;
    std::fs::write(&second, "[seq1]\nget /second\n")
        .map_err(|err| format!("write failed: {}", err))?;

    let sequences = parse_files(&[first, second]).map_err(|err| err.to_string())?;
    if sequences.len() != 2 {
        return Err(format!("Expected two sequences, got {}", sequences.len()));
    }
    let sequence = find(&sequences, "seq1")?;
    let uris: Vec<&str> = sequence.requests().map(Request::uri).collect();
    if uris != vec!["/first", "/second"] {
        return Err(format!("Unexpected order {:?}", uris));
    }
    let first_request = request_at(sequence, 0)?;
    let second_request = request_at(sequence, 1)?;
    if first_request.header("X_FILE") != Some("one") || first_request.header("X_GLOBAL") != Some("one") {
        return Err("First file headers missing from its own request".to_owned());
    }
    if second_request.header("X_FILE").is_some() || second_request.header("X_GLOBAL").is_some() {
        return Err(format!(
            "Headers leaked across files: {:?}",
            second_request.headers()
        ));
    }
    Ok(())
}

#[test]
fn parse_files_reports_file_in_errors() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("broken.req");
    std::fs::write(&path, "[seq]\nnonsense\n").map_err(|err| format!("write failed: {}", err))?;

    match parse_files(&[path.clone()]) {
        Err(ScriptError::Parse(err)) if err.file == path.display().to_string() => Ok(()),
        other => Err(format!("Unexpected result {:?}", other)),
    }
}

#[test]
fn parse_files_fails_for_missing_file() -> Result<(), String> {
    let missing = PathBuf::from("/nonexistent/train/requests.req");
    match parse_files(&[missing]) {
        Err(ScriptError::ReadScript { .. }) => Ok(()),
        other => Err(format!("Unexpected result {:?}", other)),
    }
}
