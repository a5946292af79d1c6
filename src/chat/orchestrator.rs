//! Chat core that ties the pipeline together.
//!
//! A message loads exactly one [`ChatState`] snapshot and runs to completion
//! against it: rules, mute check, audience, format, mentions, delivery.
//! Reload builds a complete new snapshot and swaps it in atomically; a
//! reload that fails validation leaves the current one in place.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelKind};
use crate::chat::sink::{MessageKind, MessageSink, OutgoingMessage};
use crate::chat::state::ChatState;
use crate::chat::target::{Audience, TargetResolver};
use crate::common::error::{ChatError, ChatResult, ConfigError};
use crate::common::permissions;
use crate::common::types::{PlayerHandle, UserId};
use crate::config::types::Config;
use crate::format::{
    FormatContext, MessageFormatter, NoPlaceholders, PlaceholderExpander, PriorityFormat,
};
use crate::hook::HookManager;
use crate::rule::{RejectReason, RuleContext, RuleOutcome};
use crate::user::{ChatUser, UserState, UsersHolder};

/// What stopped a muted sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuteSource {
    /// The sender's own chat toggle.
    SelfToggle,
    /// A registered mute provider, by name.
    Hook(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Rejected(RejectReason),
    SenderMuted(MuteSource),
    /// The sender may not use the channel.
    NoPermission,
}

/// Summary of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub channel: String,
    /// Recipients, the sender included.
    pub audience: usize,
    pub mentioned: usize,
    pub outcome: DeliveryOutcome,
}

impl DeliveryReport {
    fn stopped(channel: &Channel, outcome: DeliveryOutcome) -> Self {
        Self {
            channel: channel.name().to_string(),
            audience: 0,
            mentioned: 0,
            outcome,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.outcome == DeliveryOutcome::Delivered
    }
}

/// Owns every piece of process-wide chat state.
pub struct ChatCore {
    state: ArcSwap<ChatState>,
    users: UsersHolder,
    hooks: HookManager,
    sink: Arc<dyn MessageSink>,
    placeholders: Arc<dyn PlaceholderExpander>,
}

impl ChatCore {
    /// Build a core from a configuration.
    pub fn new(config: &Config, sink: Arc<dyn MessageSink>) -> Result<Self, ConfigError> {
        Ok(Self::from_state(ChatState::from_config(config)?, sink))
    }

    pub fn from_state(state: ChatState, sink: Arc<dyn MessageSink>) -> Self {
        Self {
            state: ArcSwap::from_pointee(state),
            users: UsersHolder::new(),
            hooks: HookManager::new(),
            sink,
            placeholders: Arc::new(NoPlaceholders),
        }
    }

    pub fn with_placeholders(mut self, placeholders: Arc<dyn PlaceholderExpander>) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Replace channels, formats and rules in one step.
    pub fn reload(&self, config: &Config) -> Result<(), ConfigError> {
        let state = ChatState::from_config(config).map_err(|e| {
            warn!("Reload rejected, keeping current configuration: {}", e);
            e
        })?;

        info!(
            channels = state.channels.len(),
            formats = state.formats.len(),
            rules = state.rules.len(),
            "Configuration reloaded"
        );
        self.state.store(Arc::new(state));
        Ok(())
    }

    /// The configuration snapshot currently in effect.
    pub fn state(&self) -> Arc<ChatState> {
        self.state.load_full()
    }

    pub fn users(&self) -> &UsersHolder {
        &self.users
    }

    pub fn hooks(&self) -> &HookManager {
        &self.hooks
    }

    /// A player connected.
    pub fn join(&self, handle: &PlayerHandle) -> Arc<ChatUser> {
        let user = self.users.get_user(handle);
        user.set_online(true);
        self.users.log_presence("join", Some(&user));
        user
    }

    /// A player disconnected.
    pub fn quit(&self, id: &UserId) -> Option<Arc<ChatUser>> {
        let user = self.users.remove_user(id)?;
        self.users.log_presence("quit", Some(&user));
        Some(user)
    }

    /// Recipients of a message from `sender` in `channel`.
    pub fn resolve_audience(&self, sender: &Arc<ChatUser>, channel: &Channel) -> Audience {
        let state = self.state.load();
        self.targets(&state).resolve(sender, channel)
    }

    /// The format `sender` would use in `channel`.
    pub fn resolve_format(&self, sender: &ChatUser, channel: &Channel) -> Arc<PriorityFormat> {
        self.state
            .load()
            .formats
            .resolve_format(&sender.snapshot(), channel)
    }

    /// Send `raw_text` from `sender` into the sender's current channel.
    ///
    /// A current channel removed by a reload falls back to the default one.
    pub fn chat(&self, sender: &Arc<ChatUser>, raw_text: &str) -> DeliveryReport {
        let state = self.state.load_full();
        let channel = state.channels.current_or_default(sender.channel().as_deref());
        self.deliver_with(&state, sender, &channel, raw_text)
    }

    /// Send into a channel named by name or command alias, without switching.
    pub fn send_to_channel(
        &self,
        sender: &Arc<ChatUser>,
        name_or_alias: &str,
        raw_text: &str,
    ) -> ChatResult<DeliveryReport> {
        let state = self.state.load_full();
        let channel = usable_channel(&state, sender, name_or_alias)?;
        Ok(self.deliver_with(&state, sender, &channel, raw_text))
    }

    /// Run one message through the whole pipeline.
    pub fn deliver(&self, sender: &Arc<ChatUser>, channel: &Channel, raw_text: &str) -> DeliveryReport {
        let state = self.state.load_full();
        self.deliver_with(&state, sender, channel, raw_text)
    }

    fn deliver_with(
        &self,
        state: &ChatState,
        sender: &Arc<ChatUser>,
        channel: &Channel,
        raw_text: &str,
    ) -> DeliveryReport {
        if !channel.is_usable_by(sender) {
            debug!(
                sender = sender.name(),
                channel = channel.name(),
                "Sender lacks channel permission"
            );
            return DeliveryReport::stopped(channel, DeliveryOutcome::NoPermission);
        }

        let snapshot = sender.snapshot();

        let ctx = RuleContext {
            sender: &snapshot,
            channel,
        };
        let text = match state.rules.apply(&ctx, raw_text) {
            RuleOutcome::Transformed(text) => text,
            RuleOutcome::Rejected(reason) => {
                return DeliveryReport::stopped(channel, DeliveryOutcome::Rejected(reason))
            }
        };

        if let Some(source) = self.mute_source(sender, &snapshot) {
            debug!(sender = sender.name(), ?source, "Sender is muted");
            return DeliveryReport::stopped(channel, DeliveryOutcome::SenderMuted(source));
        }

        let members = match self.targets(state).resolve(sender, channel) {
            Audience::Members(members) => members,
            Audience::SenderMuted => {
                return DeliveryReport::stopped(
                    channel,
                    DeliveryOutcome::SenderMuted(MuteSource::SelfToggle),
                )
            }
        };

        let format = state.formats.resolve_format(&snapshot, channel);
        let mentions = state.mentions.detect_mentions(&text, &members, sender);

        let channel_prefix = format.channel_prefix().unwrap_or(channel.channel_prefix());
        let base = base_context(sender, &snapshot, &text)
            .with_channel(channel.name(), channel.message_prefix(), channel_prefix);
        let formatter = MessageFormatter::new(self.placeholders.expand(format.message(), sender));

        for recipient in &members {
            let mentioned = mentions.contains(&recipient.id());
            let message = if mentioned {
                state
                    .mentions
                    .highlight(&text, recipient, mentions.channel_wide)
            } else {
                text.clone()
            };
            let ctx = base
                .clone()
                .with_recipient(recipient.name())
                .with_message(message);

            self.sink.send(OutgoingMessage {
                recipient: recipient.id(),
                recipient_name: recipient.name().to_string(),
                text: formatter.format(&ctx),
                mentioned,
                kind: MessageKind::Channel,
            });
        }

        debug!(
            sender = sender.name(),
            channel = channel.name(),
            format = format.name(),
            audience = members.len(),
            mentioned = mentions.len(),
            "Delivered message"
        );

        DeliveryReport {
            channel: channel.name().to_string(),
            audience: members.len(),
            mentioned: mentions.len(),
            outcome: DeliveryOutcome::Delivered,
        }
    }

    /// Move `user` to another channel by name or command alias.
    pub fn switch_channel(&self, user: &ChatUser, name_or_alias: &str) -> ChatResult<Arc<Channel>> {
        let state = self.state.load();
        let channel = usable_channel(&state, user, name_or_alias)?;
        user.set_channel(channel.name());
        debug!(user = user.name(), channel = channel.name(), "Switched channel");
        Ok(channel)
    }

    /// Send a private message to the online user named `recipient`.
    pub fn whisper(
        &self,
        sender: &Arc<ChatUser>,
        recipient: &str,
        raw_text: &str,
    ) -> ChatResult<DeliveryReport> {
        let target = self
            .users
            .find_by_name(recipient)
            .filter(|u| u.is_online() && self.visible_to(sender, u))
            .ok_or_else(|| ChatError::UserOffline {
                name: recipient.to_string(),
            })?;
        self.whisper_to(sender, &target, raw_text)
    }

    /// Answer the last private message partner.
    pub fn reply(&self, sender: &Arc<ChatUser>, raw_text: &str) -> ChatResult<DeliveryReport> {
        let ttl = self.state.load().last_messaged_ttl;
        let target = sender
            .last_messaged(ttl)
            .and_then(|id| self.users.get_optional_user(&id))
            .filter(|u| self.visible_to(sender, u))
            .ok_or(ChatError::NoReplyTarget)?;
        self.whisper_to(sender, &target, raw_text)
    }

    fn whisper_to(
        &self,
        sender: &Arc<ChatUser>,
        recipient: &Arc<ChatUser>,
        raw_text: &str,
    ) -> ChatResult<DeliveryReport> {
        let state = self.state.load_full();
        let pm = &state.private_messages;

        if !pm.enabled || !sender.private_messages_enabled() {
            return Err(ChatError::PrivateMessagesDisabled);
        }
        if !pm.channel.is_usable_by(sender) {
            return Err(ChatError::NoPermission {
                channel: pm.channel.name().to_string(),
            });
        }
        if sender.id() == recipient.id() {
            return Err(ChatError::CannotMessageSelf);
        }
        if !recipient.private_messages_enabled() {
            return Err(ChatError::RecipientPrivateMessagesDisabled {
                name: recipient.name().to_string(),
            });
        }
        if pm
            .channel
            .ignore_policy(state.ignore_policy)
            .blocks(sender, recipient)
        {
            return Err(ChatError::IgnoreBlocked {
                name: recipient.name().to_string(),
            });
        }

        let snapshot = sender.snapshot();
        let ctx = RuleContext {
            sender: &snapshot,
            channel: &pm.channel,
        };
        let text = match state.rules.apply(&ctx, raw_text) {
            RuleOutcome::Transformed(text) => text,
            RuleOutcome::Rejected(reason) => {
                return Ok(DeliveryReport::stopped(
                    &pm.channel,
                    DeliveryOutcome::Rejected(reason),
                ))
            }
        };

        if let Some(hook) = self.hooks.muted_by(sender) {
            return Ok(DeliveryReport::stopped(
                &pm.channel,
                DeliveryOutcome::SenderMuted(MuteSource::Hook(hook)),
            ));
        }

        sender.set_last_messaged(Some(recipient.id()));
        recipient.set_last_messaged(Some(sender.id()));

        let base = base_context(sender, &snapshot, &text)
            .with_channel(
                pm.channel.name(),
                pm.channel.message_prefix(),
                pm.channel.channel_prefix(),
            )
            .with_recipient(recipient.name());

        let sends = [
            (sender, &pm.sender_format, MessageKind::Private),
            (recipient, &pm.recipient_format, MessageKind::Private),
        ];
        for (to, template, kind) in sends {
            self.send_rendered(to, template, sender, &base, kind);
        }

        let spies: Vec<_> = self
            .users
            .users()
            .into_iter()
            .filter(|u| u.id() != sender.id() && u.id() != recipient.id())
            .filter(|u| u.social_spy() && u.has_permission(permissions::SOCIAL_SPY))
            .collect();
        for spy in &spies {
            self.send_rendered(spy, &pm.social_spy_format, sender, &base, MessageKind::SocialSpy);
        }

        debug!(
            sender = sender.name(),
            recipient = recipient.name(),
            spies = spies.len(),
            "Delivered private message"
        );

        Ok(DeliveryReport {
            channel: pm.channel.name().to_string(),
            audience: 2,
            mentioned: 0,
            outcome: DeliveryOutcome::Delivered,
        })
    }

    fn send_rendered(
        &self,
        to: &ChatUser,
        template: &str,
        sender: &ChatUser,
        ctx: &FormatContext,
        kind: MessageKind,
    ) {
        let formatter = MessageFormatter::new(self.placeholders.expand(template, sender));
        self.sink.send(OutgoingMessage {
            recipient: to.id(),
            recipient_name: to.name().to_string(),
            text: formatter.format(ctx),
            mentioned: false,
            kind,
        });
    }

    /// Add the online user named `target` to `user`'s ignore list.
    pub fn ignore(&self, user: &ChatUser, target: &str) -> ChatResult<Arc<ChatUser>> {
        let target = self.find_online(target)?;
        if target.id() == user.id() {
            return Err(ChatError::CannotIgnoreSelf);
        }
        if target.has_permission(permissions::IGNORE_BYPASS) {
            return Err(ChatError::CannotIgnore {
                name: target.name().to_string(),
            });
        }
        if !user.ignore(target.id()) {
            return Err(ChatError::AlreadyIgnored {
                name: target.name().to_string(),
            });
        }
        debug!(user = user.name(), target = target.name(), "Ignored");
        Ok(target)
    }

    /// Remove the online user named `target` from `user`'s ignore list.
    pub fn unignore(&self, user: &ChatUser, target: &str) -> ChatResult<Arc<ChatUser>> {
        let target = self.find_online(target)?;
        if !user.unignore(&target.id()) {
            return Err(ChatError::NotIgnored {
                name: target.name().to_string(),
            });
        }
        debug!(user = user.name(), target = target.name(), "Unignored");
        Ok(target)
    }

    /// Render `raw_text` with a named format in the sender's current
    /// channel, without sending it or running rules.
    pub fn format_test(&self, sender: &ChatUser, format: &str, raw_text: &str) -> ChatResult<String> {
        let state = self.state.load();
        let format = state
            .formats
            .format_by_name(format)
            .ok_or_else(|| ChatError::FormatNotFound {
                name: format.to_string(),
            })?;
        let channel = state.channels.current_or_default(sender.channel().as_deref());

        let channel_prefix = format.channel_prefix().unwrap_or(channel.channel_prefix());
        let ctx = base_context(sender, &sender.snapshot(), raw_text)
            .with_channel(channel.name(), channel.message_prefix(), channel_prefix)
            .with_recipient(sender.name());
        let formatter = MessageFormatter::new(self.placeholders.expand(format.message(), sender));
        Ok(formatter.format(&ctx))
    }

    fn targets<'a>(&'a self, state: &ChatState) -> TargetResolver<'a> {
        TargetResolver {
            users: &self.users,
            hooks: &self.hooks,
            ignore_policy: state.ignore_policy,
        }
    }

    fn mute_source(&self, sender: &ChatUser, snapshot: &UserState) -> Option<MuteSource> {
        if !snapshot.chat_enabled {
            return Some(MuteSource::SelfToggle);
        }
        self.hooks.muted_by(sender).map(MuteSource::Hook)
    }

    /// Vanished users are hidden unless `observer` can see them.
    fn visible_to(&self, observer: &ChatUser, user: &ChatUser) -> bool {
        !self.hooks.is_vanished(user) || self.hooks.can_see_vanished(observer)
    }

    fn find_online(&self, name: &str) -> ChatResult<Arc<ChatUser>> {
        self.users
            .find_by_name(name)
            .filter(|u| u.is_online())
            .ok_or_else(|| ChatError::UserOffline {
                name: name.to_string(),
            })
    }
}

/// Look up a channel by name, then by alias, and check `user` may use it.
fn usable_channel(state: &ChatState, user: &ChatUser, name_or_alias: &str) -> ChatResult<Arc<Channel>> {
    let channel = state
        .channels
        .resolve(name_or_alias)
        .or_else(|_| state.channels.resolve_by_command(name_or_alias))?;

    if !channel.is_usable_by(user) || channel.kind() == ChannelKind::Private {
        return Err(ChatError::NoPermission {
            channel: channel.name().to_string(),
        });
    }
    Ok(channel)
}

fn base_context(sender: &ChatUser, snapshot: &UserState, text: &str) -> FormatContext {
    let display_name = snapshot
        .display_name
        .clone()
        .unwrap_or_else(|| sender.name().to_string());
    let world = snapshot
        .location
        .as_ref()
        .map(|l| l.world.clone())
        .unwrap_or_default();

    FormatContext::new(sender.name(), text)
        .with_display_name(display_name)
        .with_world(world)
}
