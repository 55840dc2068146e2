//! Header scoping for request description files.
//!
//! Headers can be declared at the global scope, inside a sequence, or on a
//! single request. Each narrower scope is a [`ScopedHeaders`] layer stacked
//! on the wider one, so lookups fall back to the parent while overrides and
//! deletions stay local to the layer that made them.
mod partial;
mod store;


pub use partial::{PartialHeader, canonical_name, normalize_whitespace};
pub use store::{HeaderMap, ScopedHeaders, SharedHeaders};
