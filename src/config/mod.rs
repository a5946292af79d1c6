//! Configuration parsing, validation and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use tracing::debug;

use crate::common::error::ConfigError;

pub use parser::{load_config, load_config_str};
pub use types::*;
pub use validate::validate_config;

/// Load a config file, apply environment overrides and validate the result.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let config = env::apply_env_overrides(load_config(path)?);
    validate_config(&config)?;
    debug!(
        channels = config.channels.len(),
        formats = config.formats.len(),
        rules = config.rules.len(),
        "Configuration validated"
    );
    Ok(config)
}
