//! Command-line interface module.
//!
//! CLI structure and command handlers for the fabula binary.

mod commands;
mod generate;
mod inspect;
mod play;

pub use commands::{Cli, Commands};
pub use generate::generate_story;
pub use inspect::{segment_narrative, validate_manifest};
pub use play::play_manifest;

use fabula_error::FabulaResult;
use fabula_rate_limit::FabulaConfig;
use std::path::Path;

/// Load an explicit config file, or the layered defaults.
fn load_config(path: Option<&Path>) -> FabulaResult<FabulaConfig> {
    match path {
        Some(path) => FabulaConfig::from_file(path),
        None => FabulaConfig::load(),
    }
}
