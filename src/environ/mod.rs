//! Request environments handed to the filter pipeline.
mod synthesize;


pub use synthesize::{
    DEFAULT_CONTENT_TYPE, HEADER_PREFIX, SERVER_NAME, SERVER_PORT, SERVER_PROTOCOL, synthesize,
};

/// A flat, string-keyed request environment.
pub type Environment = std::collections::BTreeMap<String, String>;
