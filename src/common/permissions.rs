//! Permission nodes checked by the chat core.
//!
//! Hosts grant these through [`crate::user::ChatUser::grant`]. A user holding
//! [`WILDCARD`] has every permission.

/// Grants every permission.
pub const WILDCARD: &str = "*";

/// See players hidden by a vanish provider.
pub const SEE_VANISHED: &str = "herald.vanish.see";

/// Receive copies of other players' private messages while social spy is on.
pub const SOCIAL_SPY: &str = "herald.socialspy";

/// Cannot be put on anyone's ignore list.
pub const IGNORE_BYPASS: &str = "herald.ignore.bypass";

/// Default permission for the channel-wide mention token.
pub const MENTION_CHANNEL: &str = "herald.mention.channel";
