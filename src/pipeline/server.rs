use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::types::PipelineConfig;
use crate::environ::Environment;
use crate::error::PipelineError;

use super::{Filter, Handler, Response, StubApplication, filter_registry};

/// The reusable request handler every worker drives: the configured filters
/// composed around the stub application.
#[derive(Clone)]
pub struct ReplayServer {
    application: Arc<dyn Handler>,
    filters: Vec<&'static str>,
}

impl fmt::Debug for ReplayServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplayServer")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

impl ReplayServer {
    /// Composes `filters` around the stub; the first filter is outermost.
    #[must_use]
    pub fn new(filters: &[Box<dyn Filter>]) -> Self {
        let mut application: Arc<dyn Handler> = Arc::new(StubApplication);
        for filter in filters.iter().rev() {
            application = filter.wrap(application);
        }
        Self {
            application,
            filters: filters.iter().map(|filter| filter.name()).collect(),
        }
    }

    /// Builds the pipeline described by the `[pipeline]` section.
    ///
    /// # Errors
    ///
    /// Returns an error when a listed filter is unknown or misconfigured.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let registry = filter_registry();
        let filters = config
            .filters
            .iter()
            .map(|name| registry.build(name.trim(), config))
            .collect::<Result<Vec<_>, _>>()?;
        let server = Self::new(&filters);
        debug!("Built filter pipeline {:?}", server.filters);
        Ok(server)
    }

    #[must_use]
    pub fn filters(&self) -> &[&'static str] {
        &self.filters
    }

    #[must_use]
    pub fn handle(&self, env: &Environment) -> Response {
        self.application.handle(env)
    }
}

impl Handler for ReplayServer {
    fn handle(&self, env: &Environment) -> Response {
        ReplayServer::handle(self, env)
    }
}
