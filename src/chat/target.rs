//! Audience resolution.

use std::sync::Arc;

use tracing::debug;

use crate::channel::{Channel, IgnorePolicy};
use crate::hook::HookManager;
use crate::user::{ChatUser, UsersHolder};

/// Who receives a channel message.
#[derive(Debug, Clone)]
pub enum Audience {
    /// Recipients, the sender included.
    Members(Vec<Arc<ChatUser>>),
    /// The sender has chat turned off; nobody receives anything.
    SenderMuted,
}

impl Audience {
    pub fn members(&self) -> &[Arc<ChatUser>] {
        match self {
            Audience::Members(members) => members,
            Audience::SenderMuted => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    pub fn contains(&self, user: &ChatUser) -> bool {
        self.members().iter().any(|m| m.id() == user.id())
    }
}

/// Filters a channel's structural audience down to actual recipients.
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver<'a> {
    pub users: &'a UsersHolder,
    pub hooks: &'a HookManager,
    /// Policy for channels without their own.
    pub ignore_policy: IgnorePolicy,
}

impl TargetResolver<'_> {
    /// Recipients of a message from `sender` in `channel`.
    ///
    /// Drops users who may not use the channel, users separated from the
    /// sender by the channel's ignore policy, users who cannot see a vanished
    /// sender and users with chat turned off. The sender always stays.
    pub fn resolve(&self, sender: &Arc<ChatUser>, channel: &Channel) -> Audience {
        if !sender.chat_enabled() {
            debug!(sender = sender.name(), "Sender has chat disabled");
            return Audience::SenderMuted;
        }

        let policy = channel.ignore_policy(self.ignore_policy);
        let sender_vanished = self.hooks.is_vanished(sender);

        let members: Vec<_> = channel
            .targets(sender, self.users)
            .into_iter()
            .filter(|user| {
                if user.id() == sender.id() {
                    return true;
                }
                channel.is_usable_by(user)
                    && !policy.blocks(sender, user)
                    && (!sender_vanished || self.hooks.can_see_vanished(user))
                    && user.chat_enabled()
            })
            .collect();

        debug!(
            sender = sender.name(),
            channel = channel.name(),
            recipients = members.len(),
            "Resolved audience"
        );
        Audience::Members(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{global_channel, join};
    use crate::common::permissions;
    use crate::hook::VanishHook;

    struct Vanished(crate::common::types::UserId);

    impl VanishHook for Vanished {
        fn name(&self) -> &str {
            "test"
        }

        fn is_vanished(&self, user: &ChatUser) -> bool {
            user.id() == self.0
        }
    }

    fn names(audience: &Audience) -> Vec<String> {
        let mut names: Vec<_> = audience.members().iter().map(|u| u.name().to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_ignore_symmetry() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Symmetric,
        };
        let channel = global_channel("global");
        let alex = join(&users, "Alex");
        let steve = join(&users, "Steve");
        join(&users, "Bob");

        alex.ignore(steve.id());

        let from_alex = resolver.resolve(&alex, &channel);
        let from_steve = resolver.resolve(&steve, &channel);
        assert!(!from_alex.contains(&steve));
        assert!(!from_steve.contains(&alex));
        assert_eq!(names(&from_alex), vec!["Alex", "Bob"]);
        assert_eq!(names(&from_steve), vec!["Bob", "Steve"]);
    }

    #[test]
    fn test_recipient_policy_is_one_way() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Recipient,
        };
        let channel = global_channel("global");
        let alex = join(&users, "Alex");
        let steve = join(&users, "Steve");

        alex.ignore(steve.id());

        assert!(!resolver.resolve(&steve, &channel).contains(&alex));
        assert!(resolver.resolve(&alex, &channel).contains(&steve));
    }

    #[test]
    fn test_sender_always_included() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Symmetric,
        };
        let alex = join(&users, "Alex");
        // Sender lacks the channel permission and ignores themself
        alex.ignore(alex.id());
        let mut config = crate::chat::testing::channel_config("staff", "global");
        config.permission = Some("herald.channel.staff".to_string());
        let staff = Channel::from_config(&config).unwrap();

        assert_eq!(names(&resolver.resolve(&alex, &staff)), vec!["Alex"]);
    }

    #[test]
    fn test_sender_chat_toggle_off() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Symmetric,
        };
        let alex = join(&users, "Alex");
        join(&users, "Steve");
        alex.set_chat_enabled(false);

        let audience = resolver.resolve(&alex, &global_channel("global"));
        assert!(matches!(audience, Audience::SenderMuted));
        assert!(audience.is_empty());
    }

    #[test]
    fn test_recipient_chat_toggle_off() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Symmetric,
        };
        let alex = join(&users, "Alex");
        let steve = join(&users, "Steve");
        steve.set_chat_enabled(false);

        assert_eq!(names(&resolver.resolve(&alex, &global_channel("global"))), vec!["Alex"]);
    }

    #[test]
    fn test_vanish_asymmetry() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Symmetric,
        };
        let channel = global_channel("global");
        let ghost = join(&users, "Ghost");
        let admin = join(&users, "Admin");
        let player = join(&users, "Player");
        admin.grant(permissions::SEE_VANISHED);
        hooks.register_vanish(Arc::new(Vanished(ghost.id())));

        // Only see-vanished recipients get a vanished sender's messages
        assert_eq!(names(&resolver.resolve(&ghost, &channel)), vec!["Admin", "Ghost"]);
        // Messages to a vanished user are unaffected
        assert!(resolver.resolve(&player, &channel).contains(&ghost));
    }

    #[test]
    fn test_bypass_channel_ignores_ignore_lists() {
        let users = UsersHolder::new();
        let hooks = HookManager::new();
        let resolver = TargetResolver {
            users: &users,
            hooks: &hooks,
            ignore_policy: IgnorePolicy::Symmetric,
        };
        let alex = join(&users, "Alex");
        let steve = join(&users, "Steve");
        alex.ignore(steve.id());

        let mut config = crate::chat::testing::channel_config("announcements", "global");
        config.ignore_policy = Some("bypass".to_string());
        let channel = Channel::from_config(&config).unwrap();

        assert!(resolver.resolve(&steve, &channel).contains(&alex));
    }
}
