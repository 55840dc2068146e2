//! CLI argument types and parsing helpers.
mod cli;
mod parsers;
mod types;


pub use cli::TrainArgs;
pub use types::PositiveUsize;
