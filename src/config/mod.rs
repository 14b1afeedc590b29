//! Configuration loading and application.
mod apply;
mod loader;
mod parse;
pub mod types;


pub use apply::{CampaignSettings, OutputSettings, apply_config};
pub use loader::{DEFAULT_CONFIG_FILES, load_config};

#[cfg(test)]
pub(crate) use loader::load_config_file;
pub(crate) use parse::{parse_duration_allow_zero, parse_duration_value};
