//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.
//! Every problem found is reported, not just the first one.

use std::collections::HashSet;

use crate::channel::{ChannelKind, IgnorePolicy};
use crate::common::error::ConfigError;
use crate::config::types::Config;
use crate::rule::build_rule;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if IgnorePolicy::parse(&config.settings.ignore_policy).is_none() {
        errors.push(format!(
            "settings.ignore_policy '{}' is invalid (use: symmetric, recipient, bypass)",
            config.settings.ignore_policy
        ));
    }

    // Channels
    if config.channels.is_empty() {
        errors.push("channels is empty - at least one channel is required".to_string());
    }

    let mut channel_names = HashSet::new();
    let mut commands = HashSet::new();
    for (i, channel) in config.channels.iter().enumerate() {
        if channel.name.trim().is_empty() {
            errors.push(format!("channels[{}].name is required", i));
        } else if !channel_names.insert(channel.name.to_lowercase()) {
            errors.push(format!(
                "channels[{}].name '{}' is declared more than once",
                i, channel.name
            ));
        }

        if ChannelKind::parse(&channel.channel_type, channel.radius).is_none() {
            errors.push(format!(
                "channels[{}].type '{}' is invalid (use: global, world, proximity, private)",
                i, channel.channel_type
            ));
        }

        if let Some(ref policy) = channel.ignore_policy {
            if IgnorePolicy::parse(policy).is_none() {
                errors.push(format!(
                    "channels[{}].ignore_policy '{}' is invalid (use: symmetric, recipient, bypass)",
                    i, policy
                ));
            }
        }

        for command in &channel.commands {
            if command.trim().is_empty() {
                errors.push(format!("channels[{}].commands contains an empty name", i));
            } else if !commands.insert(command.to_lowercase()) {
                errors.push(format!(
                    "channels[{}].commands alias '{}' is already bound to another channel",
                    i, command
                ));
            }
        }
    }

    for (i, channel) in config.channels.iter().enumerate() {
        for command in &channel.commands {
            let shadowed = config.channels.iter().enumerate().any(|(j, other)| {
                j != i && other.name.eq_ignore_ascii_case(command)
            });
            if shadowed {
                errors.push(format!(
                    "channels[{}].commands alias '{}' is already bound to another channel",
                    i, command
                ));
            }
        }
    }

    let default_channel = config
        .channels
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(&config.settings.default_channel));
    match default_channel {
        None => errors.push(format!(
            "settings.default_channel '{}' does not name a configured channel",
            config.settings.default_channel
        )),
        Some(channel) if channel.channel_type.eq_ignore_ascii_case("private") => {
            errors.push(format!(
                "settings.default_channel '{}' cannot be a private channel",
                channel.name
            ))
        }
        Some(channel) if channel.permission.is_some() => errors.push(format!(
            "settings.default_channel '{}' cannot require a permission",
            channel.name
        )),
        Some(_) => {}
    }

    if config.private_messages.enabled {
        let private = config
            .channels
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&config.private_messages.channel));
        if let Some(channel) = private {
            if !channel.channel_type.eq_ignore_ascii_case("private") {
                errors.push(format!(
                    "private_messages.channel '{}' must be a channel of type private",
                    channel.name
                ));
            }
        }
    }

    // Formats
    let mut format_names = HashSet::new();
    for (i, format) in config.formats.iter().enumerate() {
        if format.name.trim().is_empty() {
            errors.push(format!("formats[{}].name is required", i));
        } else if !format_names.insert(format.name.to_lowercase()) {
            errors.push(format!(
                "formats[{}].name '{}' is declared more than once",
                i, format.name
            ));
        }

        for channel in &format.channels {
            if !channel_names.contains(&channel.to_lowercase()) {
                errors.push(format!(
                    "formats[{}].channels references unknown channel '{}'",
                    i, channel
                ));
            }
        }
    }

    if !format_names.contains(&config.settings.default_format.to_lowercase()) {
        errors.push(format!(
            "settings.default_format '{}' is missing - a default format is required",
            config.settings.default_format
        ));
    }

    // Rules
    for (i, rule) in config.rules.iter().enumerate() {
        if let Err(e) = build_rule(rule) {
            errors.push(format!("rules[{}] ({}): {}", i, rule.rule_type, e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
