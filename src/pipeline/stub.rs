use http::StatusCode;

use crate::environ::Environment;

use super::{Handler, Response};

/// Header set on every response produced by the stub application.
pub const STUB_HEADER: &str = "X-Train-Server";

/// The application at the end of the pipeline. Filters need something to
/// forward to; this answers `200 OK` with a pretty-printed copy of the
/// environment it received.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubApplication;

impl Handler for StubApplication {
    fn handle(&self, env: &Environment) -> Response {
        Response::new(StatusCode::OK)
            .with_header(STUB_HEADER, "completed")
            .with_body(format!("{:#?}", env))
    }
}
