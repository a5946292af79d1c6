//! Template rendering.
//!
//! Handles placeholder substitution in format strings.
//! Supports placeholders: %channel_prefix, %prefix, %channel, %display_name,
//! %user, %recipient, %world, %time, %message

use chrono::Local;

/// Template renderer that substitutes placeholders in format strings.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    /// Format string for this formatter.
    format: String,
}

impl MessageFormatter {
    /// Create a new formatter with the given format string.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// Format a message with the given context.
    ///
    /// The template is scanned once, so substituted values are never
    /// expanded again. Prefixes are configuration and may use the other
    /// placeholders themselves; they are rendered before the template.
    pub fn format(&self, ctx: &FormatContext) -> String {
        let time = get_time();
        let channel_prefix = substitute(&ctx.channel_prefix, |token| ctx.value(token, &time));
        let prefix = substitute(&ctx.prefix, |token| ctx.value(token, &time));

        substitute(&self.format, |token| match token {
            "channel_prefix" => Some(channel_prefix.as_str()),
            "prefix" => Some(prefix.as_str()),
            _ => ctx.value(token, &time),
        })
    }
}

/// Placeholder names, longest first so `%channel_prefix` wins over `%channel`.
const PLACEHOLDERS: [&str; 9] = [
    "channel_prefix",
    "display_name",
    "recipient",
    "channel",
    "message",
    "prefix",
    "world",
    "time",
    "user",
];

/// Replace each `%token` in `template` with `value(token)` in a single pass.
/// Unknown tokens and tokens without a value are left as written.
fn substitute<'a>(template: &str, value: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let found = PLACEHOLDERS
            .iter()
            .find(|token| after.starts_with(**token))
            .and_then(|&token| value(token).map(|v| (token.len(), v)));

        match found {
            Some((len, v)) => {
                out.push_str(v);
                rest = &after[len..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Context for message formatting.
#[derive(Debug, Clone, Default)]
pub struct FormatContext {
    /// The sender's account name.
    pub user: String,
    /// The sender's display name.
    pub display_name: String,
    /// The message content.
    pub message: String,
    /// Who the rendering is for.
    pub recipient: String,
    /// Channel name.
    pub channel: String,
    /// The channel's message prefix.
    pub prefix: String,
    /// The channel prefix (format override or the channel's own).
    pub channel_prefix: String,
    /// The sender's world, if known.
    pub world: String,
}

impl FormatContext {
    /// Create a new format context.
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            display_name: user.clone(),
            user,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the recipient.
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self
    }

    /// Set the channel name and its prefixes.
    pub fn with_channel(
        mut self,
        channel: impl Into<String>,
        prefix: impl Into<String>,
        channel_prefix: impl Into<String>,
    ) -> Self {
        self.channel = channel.into();
        self.prefix = prefix.into();
        self.channel_prefix = channel_prefix.into();
        self
    }

    /// Set the world.
    pub fn with_world(mut self, world: impl Into<String>) -> Self {
        self.world = world.into();
        self
    }

    /// Replace the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Value of a non-prefix placeholder.
    fn value<'a>(&'a self, token: &str, time: &'a str) -> Option<&'a str> {
        match token {
            "channel" => Some(&self.channel),
            "display_name" => Some(&self.display_name),
            "user" => Some(&self.user),
            "recipient" => Some(&self.recipient),
            "world" => Some(&self.world),
            "time" => Some(time),
            "message" => Some(&self.message),
            _ => None,
        }
    }
}

/// Get the current time as HH:MM:SS string.
fn get_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
