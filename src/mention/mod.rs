//! Mention detection and highlighting.

use std::collections::HashSet;
use std::sync::Arc;

use fancy_regex::{Captures, Regex};
use tracing::warn;

use crate::common::permissions;
use crate::common::regex::try_replace_all;
use crate::common::types::UserId;
use crate::config::types::MentionsConfig;
use crate::user::ChatUser;

/// Who a message mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mentions {
    pub users: HashSet<UserId>,
    /// The channel-wide token was used by a sender allowed to use it.
    pub channel_wide: bool,
}

impl Mentions {
    pub fn contains(&self, id: &UserId) -> bool {
        self.users.contains(id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Finds audience members named in a message.
#[derive(Debug)]
pub struct MentionManager {
    enabled: bool,
    prefix: String,
    highlight: String,
    channel_token: Option<Regex>,
    channel_permission: String,
}

impl MentionManager {
    pub fn from_config(config: &MentionsConfig) -> Self {
        let channel_token = match config.channel_token.trim() {
            "" => None,
            token => token_regex(token),
        };

        Self {
            enabled: config.enabled,
            prefix: config.prefix.clone(),
            highlight: config.highlight.clone(),
            channel_token,
            channel_permission: config.channel_permission.clone(),
        }
    }

    /// Permission needed for the channel-wide token.
    pub fn channel_permission(&self) -> &str {
        if self.channel_permission.is_empty() {
            permissions::MENTION_CHANNEL
        } else {
            &self.channel_permission
        }
    }

    /// Audience members mentioned by `sender` in `text`.
    ///
    /// Names match case-insensitively as whole words, prefixed by the
    /// configured prefix. The sender and members with mentions turned off
    /// are never included.
    pub fn detect_mentions(
        &self,
        text: &str,
        audience: &[Arc<ChatUser>],
        sender: &ChatUser,
    ) -> Mentions {
        if !self.enabled {
            return Mentions::default();
        }

        let channel_wide = self
            .channel_token
            .as_ref()
            .is_some_and(|re| re.is_match(text).unwrap_or(false))
            && sender.has_permission(self.channel_permission());

        let users = audience
            .iter()
            .filter(|u| u.id() != sender.id() && u.mentions_enabled())
            .filter(|u| channel_wide || self.names(text, u))
            .map(|u| u.id())
            .collect();

        Mentions {
            users,
            channel_wide,
        }
    }

    /// `text` as seen by a mentioned `user`, with the matching tokens wrapped
    /// in the highlight template.
    pub fn highlight(&self, text: &str, user: &ChatUser, channel_wide: bool) -> String {
        let mut out = match self.user_regex(user) {
            Some(re) => self.wrap(&re, text),
            None => text.to_string(),
        };
        if channel_wide {
            if let Some(ref re) = self.channel_token {
                out = self.wrap(re, &out);
            }
        }
        out
    }

    fn names(&self, text: &str, user: &ChatUser) -> bool {
        self.user_regex(user)
            .is_some_and(|re| re.is_match(text).unwrap_or(false))
    }

    fn user_regex(&self, user: &ChatUser) -> Option<Regex> {
        token_regex(&format!("{}{}", self.prefix, user.name()))
    }

    fn wrap(&self, re: &Regex, text: &str) -> String {
        let wrapped = try_replace_all(re, text, |caps: &Captures| {
            let matched = caps.get(0).map_or("", |m| m.as_str());
            self.highlight.replace("%mention", matched)
        });
        wrapped.unwrap_or_else(|e| {
            warn!("Cannot highlight mention: {}", e);
            text.to_string()
        })
    }
}

/// Case-insensitive whole-token matcher for `token`.
fn token_regex(token: &str) -> Option<Regex> {
    let pattern = format!(r"(?i)(?<![\w]){}(?![\w])", fancy_regex::escape(token));
    Regex::new(&pattern)
        .map_err(|e| warn!("Cannot build mention pattern for '{}': {}", token, e))
        .ok()
}

impl Default for MentionManager {
    fn default() -> Self {
        Self::from_config(&MentionsConfig::default())
    }
}
