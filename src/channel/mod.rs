//! Chat channels.
//!
//! A channel is immutable configuration plus a [`ChannelKind`] that decides
//! its structural audience. Channels are rebuilt on every reload and shared
//! read-only between concurrent lookups.

pub mod registry;

use std::sync::Arc;

use crate::config::types::ChannelConfig;
use crate::user::{ChatUser, UsersHolder};

pub use registry::ChannelRegistry;

/// How a channel computes its structural audience.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelKind {
    /// Every online user.
    Global,
    /// Online users in the sender's world.
    World,
    /// Online users in the sender's world within `radius` blocks.
    Proximity { radius: i32 },
    /// The sender and their current conversation partner.
    Private,
}

impl ChannelKind {
    /// Parse a channel type from config.
    ///
    /// A proximity channel without a positive radius is unbounded and
    /// therefore global.
    pub fn parse(channel_type: &str, radius: i32) -> Option<Self> {
        match channel_type.to_lowercase().as_str() {
            "global" => Some(ChannelKind::Global),
            "world" => Some(ChannelKind::World),
            "proximity" | "local" if radius > 0 => Some(ChannelKind::Proximity { radius }),
            "proximity" | "local" => Some(ChannelKind::Global),
            "private" => Some(ChannelKind::Private),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ChannelKind::Global => "global",
            ChannelKind::World => "world",
            ChannelKind::Proximity { .. } => "proximity",
            ChannelKind::Private => "private",
        }
    }
}

/// Whose ignore list suppresses delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnorePolicy {
    /// Either side ignoring the other blocks delivery both ways.
    Symmetric,
    /// Only the recipient's ignore list counts.
    Recipient,
    /// Ignore lists are not consulted.
    Bypass,
}

impl IgnorePolicy {
    /// Parse an ignore policy from config.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "symmetric" | "both" => Some(IgnorePolicy::Symmetric),
            "recipient" | "one_way" => Some(IgnorePolicy::Recipient),
            "bypass" | "none" => Some(IgnorePolicy::Bypass),
            _ => None,
        }
    }

    /// Whether a message from `sender` to `recipient` is blocked.
    pub fn blocks(&self, sender: &ChatUser, recipient: &ChatUser) -> bool {
        if sender.id() == recipient.id() {
            return false;
        }
        match self {
            IgnorePolicy::Symmetric => {
                recipient.is_ignoring(&sender.id()) || sender.is_ignoring(&recipient.id())
            }
            IgnorePolicy::Recipient => recipient.is_ignoring(&sender.id()),
            IgnorePolicy::Bypass => false,
        }
    }
}

/// A configured chat channel.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    kind: ChannelKind,
    message_prefix: String,
    channel_prefix: String,
    commands: Vec<String>,
    permission: Option<String>,
    ignore_policy: Option<IgnorePolicy>,
}

impl Channel {
    /// Build a channel from validated config.
    ///
    /// Returns `None` for an unknown channel type.
    pub fn from_config(config: &ChannelConfig) -> Option<Self> {
        Some(Self {
            name: config.name.clone(),
            kind: ChannelKind::parse(&config.channel_type, config.radius)?,
            message_prefix: config.message_prefix.clone(),
            channel_prefix: config.channel_prefix.clone(),
            commands: config.commands.clone(),
            permission: config.permission.clone(),
            ignore_policy: config.ignore_policy.as_deref().and_then(IgnorePolicy::parse),
        })
    }

    /// The channel used for private messages when none is configured.
    pub fn private_default(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ChannelKind::Private,
            message_prefix: String::new(),
            channel_prefix: String::new(),
            commands: Vec::new(),
            permission: None,
            ignore_policy: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn message_prefix(&self) -> &str {
        &self.message_prefix
    }

    pub fn channel_prefix(&self) -> &str {
        &self.channel_prefix
    }

    /// Command name followed by its aliases.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// This channel's ignore policy, falling back to `default`.
    pub fn ignore_policy(&self, default: IgnorePolicy) -> IgnorePolicy {
        self.ignore_policy.unwrap_or(default)
    }

    pub fn is_usable_by(&self, user: &ChatUser) -> bool {
        self.permission
            .as_deref()
            .map_or(true, |permission| user.has_permission(permission))
    }

    /// Structural audience for a message from `source`.
    ///
    /// Location-based kinds fall back to just `source` when it has no
    /// location yet. `source` is always part of the result.
    pub fn targets(&self, source: &Arc<ChatUser>, users: &UsersHolder) -> Vec<Arc<ChatUser>> {
        let mut targets: Vec<Arc<ChatUser>> = match self.kind {
            ChannelKind::Global => users.users(),
            ChannelKind::World | ChannelKind::Proximity { .. } => {
                let Some(origin) = source.location() else {
                    return vec![Arc::clone(source)];
                };
                users
                    .users()
                    .into_iter()
                    .filter(|u| {
                        u.location().is_some_and(|loc| match self.kind {
                            ChannelKind::Proximity { radius } => {
                                origin.within(&loc, f64::from(radius))
                            }
                            _ => origin.same_world(&loc),
                        })
                    })
                    .collect()
            }
            ChannelKind::Private => source
                .last_messaged(None)
                .and_then(|id| users.get_optional_user(&id))
                .into_iter()
                .collect(),
        };

        if !targets.iter().any(|u| u.id() == source.id()) {
            targets.insert(0, Arc::clone(source));
        }
        targets
    }
}
