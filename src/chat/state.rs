//! Immutable configuration snapshot used to route messages.

use std::sync::Arc;
use std::time::Duration;

use crate::channel::{Channel, ChannelKind, ChannelRegistry, IgnorePolicy};
use crate::common::error::ConfigError;
use crate::config::types::{Config, PrivateMessagesConfig};
use crate::config::validate_config;
use crate::format::FormatResolver;
use crate::mention::MentionManager;
use crate::rule::RuleChain;

/// Private message settings resolved against the channel registry.
#[derive(Debug)]
pub struct PrivateMessages {
    pub enabled: bool,
    pub channel: Arc<Channel>,
    pub sender_format: String,
    pub recipient_format: String,
    pub social_spy_format: String,
}

impl PrivateMessages {
    fn from_config(config: &PrivateMessagesConfig, channels: &ChannelRegistry) -> Self {
        let channel = channels
            .resolve(&config.channel)
            .ok()
            .filter(|c| c.kind() == ChannelKind::Private)
            .unwrap_or_else(|| Arc::new(Channel::private_default(config.channel.clone())));

        Self {
            enabled: config.enabled,
            channel,
            sender_format: config.sender_format.clone(),
            recipient_format: config.recipient_format.clone(),
            social_spy_format: config.social_spy_format.clone(),
        }
    }
}

/// Everything a reload replaces, swapped in as one unit.
#[derive(Debug)]
pub struct ChatState {
    pub channels: ChannelRegistry,
    pub formats: FormatResolver,
    pub rules: RuleChain,
    pub mentions: MentionManager,
    pub private_messages: PrivateMessages,
    pub ignore_policy: IgnorePolicy,
    /// How long a reply target is remembered. `None` keeps it until disconnect.
    pub last_messaged_ttl: Option<Duration>,
}

impl ChatState {
    /// Validate `config` and build a snapshot from it.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        validate_config(config)?;

        let channels =
            ChannelRegistry::from_configs(&config.channels, &config.settings.default_channel)?;
        let formats =
            FormatResolver::from_configs(&config.formats, &config.settings.default_format)?;
        let rules = RuleChain::from_configs(&config.rules).map_err(ConfigError::invalid)?;
        let ignore_policy = IgnorePolicy::parse(&config.settings.ignore_policy).ok_or_else(|| {
            ConfigError::invalid(format!(
                "settings.ignore_policy '{}' is invalid",
                config.settings.ignore_policy
            ))
        })?;
        let private_messages = PrivateMessages::from_config(&config.private_messages, &channels);

        let last_messaged_ttl = match config.settings.last_messaged_cache_duration {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Ok(Self {
            channels,
            formats,
            rules,
            mentions: MentionManager::from_config(&config.mentions),
            private_messages,
            ignore_policy,
            last_messaged_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_str;

    #[test]
    fn test_builds_from_config() {
        let config = load_config_str(
            r#"
            settings { last_messaged_cache_duration = 0, ignore_policy = "recipient" }
            channels = [
                { name = "global", type = "global", commands = ["g"] },
                { name = "pm", type = "private" }
            ]
            formats = [ { name = "default", message = "%user: %message" } ]
            private_messages { channel = "pm" }
            "#,
        )
        .unwrap();

        let state = ChatState::from_config(&config).unwrap();
        assert_eq!(state.channels.len(), 2);
        assert_eq!(state.formats.len(), 1);
        assert!(state.rules.is_empty());
        assert_eq!(state.ignore_policy, IgnorePolicy::Recipient);
        assert_eq!(state.last_messaged_ttl, None);
        assert_eq!(state.private_messages.channel.name(), "pm");
    }

    #[test]
    fn test_private_channel_falls_back_to_builtin() {
        let config = load_config_str(
            r#"
            channels = [ { name = "global", type = "global" } ]
            formats = [ { name = "default", message = "%message" } ]
            "#,
        )
        .unwrap();

        let state = ChatState::from_config(&config).unwrap();
        assert_eq!(state.private_messages.channel.name(), "private");
        assert_eq!(state.private_messages.channel.kind(), ChannelKind::Private);
        assert_eq!(state.last_messaged_ttl, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = load_config_str(
            r#"
            channels = [ { name = "global", type = "global" } ]
            formats = [ { name = "vip", message = "%message" } ]
            "#,
        )
        .unwrap();

        let err = ChatState::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("default format is required"));
    }
}
