//! Run configuration loading and resolution.
mod loader;
mod parse;
mod resolve;
pub mod types;

#[cfg(test)]
mod tests;

pub use loader::load_config_file;
pub use resolve::{RunSettings, log_config_path, resolve};

pub(crate) use parse::parse_duration_value;
