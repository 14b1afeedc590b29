//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;


pub use cli::ProbeArgs;
pub use defaults::{
    DEFAULT_INTERVAL, DEFAULT_OUTPUT_DIR, DEFAULT_PATH, DEFAULT_ROUNDS, DEFAULT_TIMEOUT,
};
