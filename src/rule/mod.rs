//! Chat rules.
//!
//! Rules run in declared order before a message is routed. Each one either
//! hands a (possibly rewritten) message to the next or rejects it, which
//! stops the chain.
//!
//! ## Module Structure
//!
//! - `builtin`: rule kinds available from configuration
//! - `engine`: the ordered chain

pub mod builtin;
pub mod engine;

use std::fmt;

use crate::channel::Channel;
use crate::user::UserState;

pub use builtin::build_rule;
pub use engine::RuleChain;

/// Why a message was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing left to send.
    EmptyMessage,
    /// A blocked pattern matched.
    BlockedWord { pattern: String },
    /// Longer than the configured limit.
    TooLong { limit: usize },
    /// Contains a link and the sender may not post links.
    LinksNotAllowed,
    /// Rejected by a custom rule.
    Custom { code: String },
}

impl RejectReason {
    /// Stable code for the caller to map to a player-facing message.
    pub fn code(&self) -> &str {
        match self {
            RejectReason::EmptyMessage => "empty_message",
            RejectReason::BlockedWord { .. } => "blocked_word",
            RejectReason::TooLong { .. } => "too_long",
            RejectReason::LinksNotAllowed => "links_not_allowed",
            RejectReason::Custom { code } => code,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::BlockedWord { pattern } => write!(f, "blocked_word ({})", pattern),
            RejectReason::TooLong { limit } => write!(f, "too_long (limit {})", limit),
            other => f.write_str(other.code()),
        }
    }
}

/// Result of running a message through a rule or the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Transformed(String),
    Rejected(RejectReason),
}

/// What a rule gets to look at besides the text.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub sender: &'a UserState,
    pub channel: &'a Channel,
}

/// A single text validation or transformation step.
pub trait Rule: fmt::Debug + Send + Sync {
    /// Rule name used in logs.
    fn name(&self) -> &str;

    /// Senders holding this permission skip the rule.
    fn bypass_permission(&self) -> Option<&str> {
        None
    }

    fn apply(&self, ctx: &RuleContext<'_>, text: String) -> RuleOutcome;
}
