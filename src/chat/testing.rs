//! Shared fixtures for chat tests.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::channel::Channel;
use crate::chat::sink::{MessageSink, OutgoingMessage};
use crate::common::types::PlayerHandle;
use crate::config::types::ChannelConfig;
use crate::user::{ChatUser, UsersHolder};

pub fn channel_config(name: &str, channel_type: &str) -> ChannelConfig {
    ChannelConfig {
        name: name.to_string(),
        channel_type: channel_type.to_string(),
        radius: 0,
        commands: Vec::new(),
        message_prefix: String::new(),
        channel_prefix: String::new(),
        permission: None,
        ignore_policy: None,
    }
}

pub fn global_channel(name: &str) -> Channel {
    Channel::from_config(&channel_config(name, "global")).unwrap()
}

pub fn join(users: &UsersHolder, name: &str) -> Arc<ChatUser> {
    users.get_user(&PlayerHandle::new(Uuid::new_v4(), name))
}

/// Sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<OutgoingMessage> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Texts received by `name`, in order.
    pub fn received_by(&self, name: &str) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|m| m.recipient_name == name)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, message: OutgoingMessage) {
        self.messages.lock().push(message);
    }
}

/// A config exercising every channel type, with a private channel and a
/// VIP format.
pub const TEST_CONFIG: &str = r#"
settings {
    default_channel = "global"
    default_format = "default"
    last_messaged_cache_duration = 300
}
channels = [
    { name = "global", type = "global", commands = ["global", "g"], channel_prefix = "[G]" },
    { name = "local", type = "proximity", radius = 100, commands = ["local", "l"], channel_prefix = "[L]" },
    { name = "world", type = "world", commands = ["world", "w"] },
    { name = "staff", type = "global", commands = ["staff"], permission = "herald.channel.staff", ignore_policy = "bypass" },
    { name = "private", type = "private" }
]
formats = [
    { name = "default", message = "%channel_prefix %user: %message" },
    { name = "vip", priority = 10, permission = "herald.format.vip", message = "[VIP] %user: %message" },
    { name = "staff", priority = 5, channels = ["staff"], message = "[Staff] %user: %message" }
]
rules = [
    { type = "blocked_words", patterns = ["(?i)badword"] },
    { type = "max_length", limit = 64 }
]
"#;
