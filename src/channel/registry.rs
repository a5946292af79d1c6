//! Channel lookup by name and command alias.

use std::collections::HashMap;
use std::sync::Arc;

use crate::channel::Channel;
use crate::common::error::{ChatError, ConfigError};
use crate::config::types::ChannelConfig;

/// Immutable set of channels built from one configuration.
#[derive(Debug)]
pub struct ChannelRegistry {
    /// All channels in declaration order.
    channels: Vec<Arc<Channel>>,
    /// Index: lower-cased channel name -> channel.
    by_name: HashMap<String, usize>,
    /// Index: lower-cased command name or alias -> channel.
    by_command: HashMap<String, usize>,
    /// Index of the default channel.
    default_channel: usize,
}

impl ChannelRegistry {
    /// Build a registry from channel configs.
    pub fn from_configs(configs: &[ChannelConfig], default_channel: &str) -> Result<Self, ConfigError> {
        let mut channels = Vec::with_capacity(configs.len());
        let mut by_name = HashMap::new();
        let mut by_command = HashMap::new();

        for config in configs {
            let channel = Channel::from_config(config).ok_or_else(|| {
                ConfigError::invalid(format!(
                    "channel '{}' has unknown type '{}'",
                    config.name, config.channel_type
                ))
            })?;

            let idx = channels.len();
            if by_name.insert(channel.name().to_lowercase(), idx).is_some() {
                return Err(ConfigError::invalid(format!(
                    "channel '{}' is declared more than once",
                    channel.name()
                )));
            }

            for command in channel.commands() {
                if let Some(previous) = by_command.insert(command.to_lowercase(), idx) {
                    return Err(ConfigError::invalid(format!(
                        "alias '{}' of channel '{}' is already bound to channel '{}'",
                        command,
                        channel.name(),
                        configs[previous].name
                    )));
                }
            }

            channels.push(Arc::new(channel));
        }

        // An alias may not shadow another channel's name
        for (alias, &idx) in &by_command {
            if let Some(&owner) = by_name.get(alias) {
                if owner != idx {
                    return Err(ConfigError::invalid(format!(
                        "alias '{}' of channel '{}' is already bound to channel '{}'",
                        alias, configs[idx].name, configs[owner].name
                    )));
                }
            }
        }

        let default_channel = *by_name.get(&default_channel.to_lowercase()).ok_or_else(|| {
            ConfigError::invalid(format!(
                "default channel '{}' is not configured",
                default_channel
            ))
        })?;

        Ok(Self {
            channels,
            by_name,
            by_command,
            default_channel,
        })
    }

    /// Find a channel by name (case-insensitive).
    pub fn resolve(&self, name: &str) -> Result<Arc<Channel>, ChatError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&i| Arc::clone(&self.channels[i]))
            .ok_or_else(|| ChatError::ChannelNotFound {
                name: name.to_string(),
            })
    }

    /// Find a channel by command name or alias (case-insensitive).
    pub fn resolve_by_command(&self, alias: &str) -> Result<Arc<Channel>, ChatError> {
        self.by_command
            .get(&alias.to_lowercase())
            .map(|&i| Arc::clone(&self.channels[i]))
            .ok_or_else(|| ChatError::ChannelNotFound {
                name: alias.to_string(),
            })
    }

    pub fn default_channel(&self) -> Arc<Channel> {
        Arc::clone(&self.channels[self.default_channel])
    }

    /// The channel a user is in, or the default channel if the user has none
    /// or theirs no longer exists.
    pub fn current_or_default(&self, name: Option<&str>) -> Arc<Channel> {
        name.and_then(|name| self.resolve(name).ok())
            .unwrap_or_else(|| self.default_channel())
    }

    pub fn channels(&self) -> &[Arc<Channel>] {
        &self.channels
    }

    /// Channels with at least one command, paired with their command names.
    ///
    /// The command layer registers one switch command per entry.
    pub fn channel_commands(&self) -> Vec<(&str, &[String])> {
        self.channels
            .iter()
            .filter(|c| !c.commands().is_empty())
            .map(|c| (c.name(), c.commands()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelKind;

    fn channel(name: &str, channel_type: &str, commands: &[&str]) -> ChannelConfig {
        ChannelConfig {
            name: name.to_string(),
            channel_type: channel_type.to_string(),
            radius: 100,
            commands: commands.iter().map(|c| c.to_string()).collect(),
            message_prefix: String::new(),
            channel_prefix: String::new(),
            permission: None,
            ignore_policy: None,
        }
    }

    fn make_registry() -> ChannelRegistry {
        ChannelRegistry::from_configs(
            &[
                channel("Global", "global", &["global", "g"]),
                channel("Local", "proximity", &["local", "l"]),
                channel("Announcements", "global", &[]),
            ],
            "global",
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_by_name() {
        let registry = make_registry();
        assert_eq!(registry.resolve("global").unwrap().name(), "Global");
        assert_eq!(registry.resolve("LOCAL").unwrap().name(), "Local");
        assert_eq!(
            registry.resolve("trade").unwrap_err(),
            ChatError::ChannelNotFound {
                name: "trade".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_by_command() {
        let registry = make_registry();
        assert_eq!(registry.resolve_by_command("g").unwrap().name(), "Global");
        assert_eq!(registry.resolve_by_command("L").unwrap().name(), "Local");
        assert_eq!(
            registry.resolve_by_command("l").unwrap().kind(),
            ChannelKind::Proximity { radius: 100 }
        );
        assert!(registry.resolve_by_command("announcements").is_err());
    }

    #[test]
    fn test_default_and_fallback() {
        let registry = make_registry();
        assert_eq!(registry.default_channel().name(), "Global");
        assert_eq!(registry.current_or_default(Some("local")).name(), "Local");
        assert_eq!(registry.current_or_default(Some("removed")).name(), "Global");
        assert_eq!(registry.current_or_default(None).name(), "Global");
    }

    #[test]
    fn test_channel_commands_skip_empty() {
        let registry = make_registry();
        let commands = registry.channel_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].0, "Global");
        assert_eq!(commands[0].1, ["global".to_string(), "g".to_string()]);
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let result = ChannelRegistry::from_configs(
            &[
                channel("global", "global", &["global", "g"]),
                channel("guild", "global", &["guild", "g"]),
            ],
            "global",
        );
        assert!(result.unwrap_err().to_string().contains("already bound"));
    }

    #[test]
    fn test_alias_shadowing_name_rejected() {
        let result = ChannelRegistry::from_configs(
            &[
                channel("global", "global", &["global"]),
                channel("trade", "global", &["trade", "global"]),
            ],
            "global",
        );
        assert!(result.unwrap_err().to_string().contains("already bound"));

        let result = ChannelRegistry::from_configs(
            &[
                channel("g", "global", &[]),
                channel("guild", "global", &["guild", "g"]),
            ],
            "g",
        );
        assert!(result.unwrap_err().to_string().contains("already bound"));
    }

    #[test]
    fn test_missing_default_rejected() {
        let result = ChannelRegistry::from_configs(&[channel("global", "global", &[])], "local");
        assert!(result.unwrap_err().to_string().contains("default channel"));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = ChannelRegistry::from_configs(&[channel("global", "galaxy", &[])], "global");
        assert!(result.unwrap_err().to_string().contains("unknown type"));
    }
}
