//! Herald - channel-based chat routing for multiplayer game servers.
//!
//! The host feeds chat events into a [`ChatCore`]; it runs each message
//! through the configured rules, resolves the audience and the format,
//! detects mentions and hands one rendered message per recipient to a
//! [`MessageSink`].

pub mod channel;
pub mod chat;
pub mod common;
pub mod config;
pub mod format;
pub mod hook;
pub mod mention;
pub mod rule;
pub mod user;

pub use chat::{ChatCore, DeliveryOutcome, DeliveryReport, MessageSink, OutgoingMessage};
pub use common::{ChatError, ConfigError};
