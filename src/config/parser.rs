//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_str(
            r#"
            channels = [
                { name = "global", type = "global", commands = ["global", "g"] }
            ]
            formats = [
                { name = "default", message = "%user: %message" }
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.channels.len(), 1);
        assert_eq!(config.channels[0].name, "global");
        assert_eq!(config.channels[0].commands, vec!["global", "g"]);
        assert_eq!(config.formats[0].priority, 0);
        assert!(config.formats[0].permission.is_none());

        // Omitted sections fall back to defaults
        assert_eq!(config.settings.default_channel, "global");
        assert_eq!(config.settings.default_format, "default");
        assert!(config.mentions.enabled);
        assert!(config.private_messages.enabled);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_load_channel_types_and_rules() {
        let config = load_config_str(
            r#"
            settings {
                default_channel = "local"
                ignore_policy = "recipient"
            }
            channels = [
                { name = "local", type = "proximity", radius = 100 }
                { name = "staff", type = "global", permission = "herald.channel.staff" }
            ]
            formats = [
                { name = "default", message = "%user: %message" }
                { name = "vip", priority = 10, permission = "herald.format.vip", message = "[VIP] %user: %message" }
            ]
            rules = [
                { type = "max_length", limit = 256 }
                { type = "blocked_words", patterns = ["(?i)badword"] }
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.settings.default_channel, "local");
        assert_eq!(config.settings.ignore_policy, "recipient");
        assert_eq!(config.channels[0].channel_type, "proximity");
        assert_eq!(config.channels[0].radius, 100);
        assert_eq!(
            config.channels[1].permission.as_deref(),
            Some("herald.channel.staff")
        );
        assert_eq!(config.formats[1].priority, 10);
        assert_eq!(config.rules[0].rule_type, "max_length");
        assert_eq!(config.rules[0].limit, Some(256));
        assert_eq!(config.rules[1].patterns, vec!["(?i)badword"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_config("/nonexistent/herald.conf");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
