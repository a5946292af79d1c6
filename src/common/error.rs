//! Error types for the crate.

use thiserror::Error;

/// Configuration-related errors.
///
/// Any of these aborts a load or reload; the previously installed
/// configuration stays in effect.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    /// Shorthand for a single-problem validation error.
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            message: message.into(),
        }
    }
}

/// User-facing chat errors.
///
/// These are reported back to the caller (command or event layer) which
/// turns them into feedback for the player. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("Channel not found: {name}")]
    ChannelNotFound { name: String },

    #[error("Format not found: {name}")]
    FormatNotFound { name: String },

    #[error("You do not have permission to use channel '{channel}'")]
    NoPermission { channel: String },

    #[error("User is offline: {name}")]
    UserOffline { name: String },

    #[error("Private messages are disabled")]
    PrivateMessagesDisabled,

    #[error("{name} does not accept private messages")]
    RecipientPrivateMessagesDisabled { name: String },

    #[error("You cannot message yourself")]
    CannotMessageSelf,

    #[error("You have nobody to reply to")]
    NoReplyTarget,

    #[error("Messages between you and {name} are blocked by an ignore")]
    IgnoreBlocked { name: String },

    #[error("You cannot ignore yourself")]
    CannotIgnoreSelf,

    #[error("{name} cannot be ignored")]
    CannotIgnore { name: String },

    #[error("{name} is already ignored")]
    AlreadyIgnored { name: String },

    #[error("{name} is not ignored")]
    NotIgnored { name: String },
}

/// Result type alias for chat operations.
pub type ChatResult<T> = std::result::Result<T, ChatError>;
