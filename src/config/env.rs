//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `HERALD_CONFIG` - Path of the config file
//! - `HERALD_DEFAULT_CHANNEL` - Channel new players start in
//! - `HERALD_DEFAULT_FORMAT` - Fallback format name
//! - `HERALD_MENTIONS_ENABLED` - "true"/"false" to toggle mention detection

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "HERALD";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(channel) = env::var(format!("{}_DEFAULT_CHANNEL", ENV_PREFIX)) {
        if !channel.is_empty() {
            config.settings.default_channel = channel;
        }
    }

    if let Ok(format) = env::var(format!("{}_DEFAULT_FORMAT", ENV_PREFIX)) {
        if !format.is_empty() {
            config.settings.default_format = format;
        }
    }

    if let Ok(enabled) = env::var(format!("{}_MENTIONS_ENABLED", ENV_PREFIX)) {
        if let Ok(enabled) = enabled.parse() {
            config.mentions.enabled = enabled;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `HERALD_CONFIG` environment variable, otherwise returns "herald.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "herald.conf".to_string())
}
