//! Priority-ranked format selection.

use std::sync::Arc;

use crate::channel::Channel;
use crate::common::error::ConfigError;
use crate::config::types::FormatConfig;
use crate::user::UserState;

/// A named format with an activation predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityFormat {
    name: String,
    priority: i32,
    permission: Option<String>,
    /// Lower-cased channel names this format is limited to.
    channels: Vec<String>,
    message: String,
    channel_prefix: Option<String>,
}

impl PriorityFormat {
    pub fn from_config(config: &FormatConfig) -> Self {
        Self {
            name: config.name.clone(),
            priority: config.priority,
            permission: config.permission.clone(),
            channels: config.channels.iter().map(|c| c.to_lowercase()).collect(),
            message: config.message.clone(),
            channel_prefix: config.channel_prefix.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Message template.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Channel prefix template, if this format overrides the channel's.
    pub fn channel_prefix(&self) -> Option<&str> {
        self.channel_prefix.as_deref()
    }

    pub fn is_channel_scoped(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Whether this format applies to `sender` in `channel`.
    pub fn matches(&self, sender: &UserState, channel: &Channel) -> bool {
        let permitted = self
            .permission
            .as_deref()
            .map_or(true, |permission| sender.has_permission(permission));
        let in_channel = self.channels.is_empty()
            || self.channels.contains(&channel.name().to_lowercase());
        permitted && in_channel
    }
}

/// Picks the format for a (sender, channel) pair.
///
/// Candidates are walked by descending priority; on equal priority,
/// channel-scoped formats come before global ones, then declaration order.
/// The default format never takes part in the walk and always applies when
/// nothing else does.
#[derive(Debug)]
pub struct FormatResolver {
    /// Non-default formats in evaluation order.
    candidates: Vec<Arc<PriorityFormat>>,
    /// Every format in declaration order, default included.
    all: Vec<Arc<PriorityFormat>>,
    default: Arc<PriorityFormat>,
}

impl FormatResolver {
    /// Build a resolver from format configs.
    ///
    /// Fails if `default_format` is not among them.
    pub fn from_configs(configs: &[FormatConfig], default_format: &str) -> Result<Self, ConfigError> {
        let all: Vec<Arc<PriorityFormat>> = configs
            .iter()
            .map(|c| Arc::new(PriorityFormat::from_config(c)))
            .collect();

        let default = all
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(default_format))
            .cloned()
            .ok_or_else(|| {
                ConfigError::invalid(format!(
                    "default format '{}' is not declared",
                    default_format
                ))
            })?;

        let mut candidates: Vec<_> = all
            .iter()
            .filter(|f| !Arc::ptr_eq(f, &default))
            .cloned()
            .collect();
        // Stable sort keeps declaration order among equals
        candidates.sort_by_key(|f| (std::cmp::Reverse(f.priority()), !f.is_channel_scoped()));

        Ok(Self {
            candidates,
            all,
            default,
        })
    }

    /// The format for `sender` in `channel`. Never fails.
    pub fn resolve_format(&self, sender: &UserState, channel: &Channel) -> Arc<PriorityFormat> {
        self.candidates
            .iter()
            .find(|f| f.matches(sender, channel))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// Look up a format by name (case-insensitive), for previews.
    pub fn format_by_name(&self, name: &str) -> Option<Arc<PriorityFormat>> {
        self.all
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Every format name in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.all.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ChannelConfig;

    fn format(name: &str, priority: i32, permission: Option<&str>, channels: &[&str]) -> FormatConfig {
        FormatConfig {
            name: name.to_string(),
            priority,
            permission: permission.map(String::from),
            channels: channels.iter().map(|c| c.to_string()).collect(),
            message: format!("{} %user: %message", name),
            channel_prefix: None,
        }
    }

    fn channel(name: &str) -> Channel {
        Channel::from_config(&ChannelConfig {
            name: name.to_string(),
            channel_type: "global".to_string(),
            radius: 0,
            commands: Vec::new(),
            message_prefix: String::new(),
            channel_prefix: String::new(),
            permission: None,
            ignore_policy: None,
        })
        .unwrap()
    }

    fn sender(permissions: &[&str]) -> UserState {
        UserState {
            permissions: Arc::new(permissions.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_higher_priority_wins() {
        let resolver = FormatResolver::from_configs(
            &[
                format("default", 0, None, &[]),
                format("low", 5, None, &[]),
                format("high", 10, None, &[]),
            ],
            "default",
        )
        .unwrap();

        let chosen = resolver.resolve_format(&sender(&[]), &channel("global"));
        assert_eq!(chosen.name(), "high");
    }

    #[test]
    fn test_permission_predicate() {
        let resolver = FormatResolver::from_configs(
            &[
                format("default", 0, None, &[]),
                format("admin", 100, Some("herald.format.admin"), &[]),
                format("vip", 10, Some("herald.format.vip"), &[]),
            ],
            "default",
        )
        .unwrap();
        let global = channel("global");

        assert_eq!(resolver.resolve_format(&sender(&[]), &global).name(), "default");
        assert_eq!(
            resolver
                .resolve_format(&sender(&["herald.format.vip"]), &global)
                .name(),
            "vip"
        );
        assert_eq!(
            resolver
                .resolve_format(&sender(&["herald.format.vip", "herald.format.admin"]), &global)
                .name(),
            "admin"
        );
    }

    #[test]
    fn test_default_is_fallback_only() {
        // A high-priority default still only applies when nothing else matches
        let resolver = FormatResolver::from_configs(
            &[format("default", 1000, None, &[]), format("other", 1, None, &[])],
            "default",
        )
        .unwrap();

        assert_eq!(
            resolver.resolve_format(&sender(&[]), &channel("global")).name(),
            "other"
        );
    }

    #[test]
    fn test_channel_scoped_formats() {
        let resolver = FormatResolver::from_configs(
            &[
                format("default", 0, None, &[]),
                format("global-style", 5, None, &[]),
                format("staff-style", 5, None, &["Staff"]),
            ],
            "default",
        )
        .unwrap();

        // Equal priority: channel-scoped first
        assert_eq!(
            resolver.resolve_format(&sender(&[]), &channel("staff")).name(),
            "staff-style"
        );
        assert_eq!(
            resolver.resolve_format(&sender(&[]), &channel("global")).name(),
            "global-style"
        );
    }

    #[test]
    fn test_equal_priority_declaration_order() {
        let resolver = FormatResolver::from_configs(
            &[
                format("default", 0, None, &[]),
                format("first", 5, None, &[]),
                format("second", 5, None, &[]),
            ],
            "default",
        )
        .unwrap();

        for _ in 0..10 {
            assert_eq!(
                resolver.resolve_format(&sender(&[]), &channel("global")).name(),
                "first"
            );
        }
    }

    #[test]
    fn test_missing_default_fails() {
        let result = FormatResolver::from_configs(&[format("vip", 10, None, &[])], "default");
        assert!(result.unwrap_err().to_string().contains("default format"));
    }

    #[test]
    fn test_format_by_name() {
        let resolver = FormatResolver::from_configs(
            &[format("default", 0, None, &[]), format("VIP", 10, None, &[])],
            "default",
        )
        .unwrap();

        assert_eq!(resolver.format_by_name("vip").unwrap().name(), "VIP");
        assert_eq!(resolver.format_by_name("default").unwrap().name(), "default");
        assert!(resolver.format_by_name("missing").is_none());
        assert_eq!(resolver.names(), vec!["default", "VIP"]);
    }
}
