use std::sync::OnceLock;

use crate::config::types::PipelineConfig;
use crate::error::PipelineError;

use super::Filter;
use super::builtins::{self, FilterFactory};

/// Named filter constructors available to `[pipeline] filters`.
#[derive(Clone)]
pub struct FilterRegistry {
    factories: Vec<(&'static str, FilterFactory)>,
}

impl FilterRegistry {
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            factories: Vec::new(),
        };
        for (name, factory) in builtins::builtins() {
            if let Err(err) = registry.register(name, factory) {
                tracing::warn!("Skipping duplicate builtin filter: {}", err);
            }
        }
        registry
    }

    /// Registers a filter constructor under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error when a filter with the same name is already
    /// registered.
    pub(super) fn register(
        &mut self,
        name: &'static str,
        factory: FilterFactory,
    ) -> Result<(), PipelineError> {
        if self.factories.iter().any(|(existing, _)| *existing == name) {
            return Err(PipelineError::DuplicateFilter { name });
        }
        self.factories.push((name, factory));
        Ok(())
    }

    /// Builds the filter called `name` from its configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names and for missing or invalid filter
    /// options.
    pub fn build(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<Box<dyn Filter>, PipelineError> {
        let factory = self
            .factories
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, factory)| *factory)
            .ok_or_else(|| PipelineError::UnknownFilter {
                name: name.to_owned(),
                available: self.available_csv(),
            })?;
        factory(config)
    }

    #[must_use]
    pub fn available_csv(&self) -> String {
        let mut names: Vec<&'static str> = self.factories.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.join(", ")
    }
}

#[must_use]
pub fn filter_registry() -> &'static FilterRegistry {
    static REGISTRY: OnceLock<FilterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(FilterRegistry::with_builtins)
}
