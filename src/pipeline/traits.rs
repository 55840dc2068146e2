use std::sync::Arc;

use crate::environ::Environment;

use super::Response;

/// A synchronous request handler: the filter pipeline under test, or the
/// application at the end of it.
pub trait Handler: Send + Sync {
    fn handle(&self, env: &Environment) -> Response;
}

/// A pipeline stage that wraps the next handler.
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns a handler that runs this filter in front of `next`.
    fn wrap(&self, next: Arc<dyn Handler>) -> Arc<dyn Handler>;
}
