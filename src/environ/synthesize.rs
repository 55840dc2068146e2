use percent_encoding::percent_decode_str;

use crate::script::Request;

use super::Environment;

/// Environment keys for headers are this prefix plus the canonical name.
pub const HEADER_PREFIX: &str = "HTTP_";
/// Content type reported when the request declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";
pub const SERVER_NAME: &str = "localhost";
pub const SERVER_PORT: &str = "80";
pub const SERVER_PROTOCOL: &str = "HTTP/1.0";
const REMOTE_ADDR: &str = "127.0.0.1";
const URL_SCHEME: &str = "http";

const CONTENT_TYPE: &str = "CONTENT_TYPE";
const CONTENT_LENGTH: &str = "CONTENT_LENGTH";

/// Projects a request into the environment of a synthetic local HTTP/1.0
/// request.
///
/// The URI is split on its first `?`. `RAW_PATH_INFO` keeps the path as
/// written while `PATH_INFO` is percent-decoded. Content type and length
/// come from the matching headers; every other header is exposed under
/// [`HEADER_PREFIX`].
#[must_use]
pub fn synthesize(request: &Request) -> Environment {
    let (path, query) = request
        .uri()
        .split_once('?')
        .unwrap_or((request.uri(), ""));

    let mut env = Environment::new();
    env.insert("REQUEST_METHOD".to_owned(), request.method().to_owned());
    env.insert("SCRIPT_NAME".to_owned(), String::new());
    env.insert(
        "PATH_INFO".to_owned(),
        percent_decode_str(path).decode_utf8_lossy().into_owned(),
    );
    env.insert("RAW_PATH_INFO".to_owned(), path.to_owned());
    env.insert("QUERY_STRING".to_owned(), query.to_owned());
    env.insert("SERVER_NAME".to_owned(), SERVER_NAME.to_owned());
    env.insert("SERVER_PORT".to_owned(), SERVER_PORT.to_owned());
    env.insert("SERVER_PROTOCOL".to_owned(), SERVER_PROTOCOL.to_owned());
    env.insert("REMOTE_ADDR".to_owned(), REMOTE_ADDR.to_owned());
    env.insert("URL_SCHEME".to_owned(), URL_SCHEME.to_owned());

    let content_type = request.header(CONTENT_TYPE).map_or(DEFAULT_CONTENT_TYPE, |value| {
        value.split(';').next().unwrap_or(value).trim()
    });
    env.insert(CONTENT_TYPE.to_owned(), content_type.to_owned());

    if let Some(length) = request.header(CONTENT_LENGTH) {
        env.insert(CONTENT_LENGTH.to_owned(), length.to_owned());
    }

    for (name, value) in request.headers() {
        if name == CONTENT_TYPE || name == CONTENT_LENGTH {
            continue;
        }
        env.insert(format!("{}{}", HEADER_PREFIX, name), value.clone());
    }

    env
}
