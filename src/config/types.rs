//! Configuration type definitions.

use serde::Deserialize;

use crate::common::permissions;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub formats: Vec<FormatConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub mentions: MentionsConfig,
    #[serde(default)]
    pub private_messages: PrivateMessagesConfig,
}

/// General settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Channel new users start in and fall back to.
    pub default_channel: String,
    /// Format used when no other format matches.
    pub default_format: String,
    /// Ignore policy for channels that don't set their own:
    /// "symmetric", "recipient" or "bypass".
    pub ignore_policy: String,
    /// Seconds a reply target is remembered. 0 keeps it until disconnect.
    pub last_messaged_cache_duration: u64,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            default_channel: "global".to_string(),
            default_format: "default".to_string(),
            ignore_policy: "symmetric".to_string(),
            last_messaged_cache_duration: 300,
        }
    }
}

/// A chat channel definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    /// Channel type: "global", "world", "proximity" or "private".
    #[serde(rename = "type", default = "default_channel_type")]
    pub channel_type: String,
    /// Proximity radius in blocks. 0 or negative means unbounded.
    #[serde(default)]
    pub radius: i32,
    /// Command name followed by aliases.
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub message_prefix: String,
    #[serde(default)]
    pub channel_prefix: String,
    /// Permission required to send to and receive from this channel.
    pub permission: Option<String>,
    /// Overrides `settings.ignore_policy`.
    pub ignore_policy: Option<String>,
}

fn default_channel_type() -> String {
    "global".to_string()
}

/// A priority format definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    /// Permission the sender needs for this format to apply.
    pub permission: Option<String>,
    /// Channels this format is limited to. Empty means every channel.
    #[serde(default)]
    pub channels: Vec<String>,
    pub message: String,
    /// Overrides the channel's own channel prefix.
    pub channel_prefix: Option<String>,
}

/// A chat rule definition.
///
/// Which fields are read depends on `rule_type`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    /// Rule type: "blocked_words", "replace", "max_length", "caps" or "links".
    #[serde(rename = "type")]
    pub rule_type: String,
    /// Regex patterns for "blocked_words".
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Regex pattern for "replace".
    pub pattern: Option<String>,
    /// Replacement text for "replace".
    #[serde(default)]
    pub replacement: String,
    /// Character limit for "max_length".
    pub limit: Option<usize>,
    /// Uppercase letter ratio above which "caps" lower-cases the message.
    pub ratio: Option<f64>,
    /// Minimum letter count before "caps" kicks in.
    pub min_length: Option<usize>,
    /// Permission allowing links for "links".
    pub permission: Option<String>,
    /// Senders holding this permission skip the rule entirely.
    pub bypass_permission: Option<String>,
}

/// Mention detection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MentionsConfig {
    pub enabled: bool,
    /// Required in front of a name, e.g. "@". Empty matches bare names.
    pub prefix: String,
    /// Template wrapped around a mention for the mentioned player.
    /// `%mention` is replaced by the matched text.
    pub highlight: String,
    /// Token mentioning everyone in the audience.
    pub channel_token: String,
    /// Permission needed to use `channel_token`.
    pub channel_permission: String,
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: String::new(),
            highlight: "&e%mention&r".to_string(),
            channel_token: "@channel".to_string(),
            channel_permission: permissions::MENTION_CHANNEL.to_string(),
        }
    }
}

/// Private message settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrivateMessagesConfig {
    pub enabled: bool,
    /// Name of a "private" channel supplying prefix and ignore policy.
    /// A built-in channel is used when no such channel is configured.
    pub channel: String,
    /// What the sender sees.
    pub sender_format: String,
    /// What the recipient sees.
    pub recipient_format: String,
    /// What social spies see.
    pub social_spy_format: String,
}

impl Default for PrivateMessagesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "private".to_string(),
            sender_format: "&7You -> %recipient: &f%message".to_string(),
            recipient_format: "&7%user -> You: &f%message".to_string(),
            social_spy_format: "&8[Spy] %user -> %recipient: %message".to_string(),
        }
    }
}
