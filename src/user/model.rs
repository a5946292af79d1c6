//! Online chat user model.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::common::permissions;
use crate::common::types::{Location, PlayerHandle, UserId};

/// Reply target remembered after a private message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMessaged {
    pub id: UserId,
    pub at: Instant,
}

/// Mutable per-user state.
///
/// Reads go through [`ChatUser::snapshot`], which clones this under the
/// user's read lock. The ignore and permission sets are copy-on-write so a
/// snapshot never copies them.
#[derive(Debug, Clone)]
pub struct UserState {
    /// Name shown in formats, if different from the account name.
    pub display_name: Option<String>,
    pub online: bool,
    /// Current channel name. `None` means the default channel.
    pub channel: Option<String>,
    pub ignored: Arc<HashSet<UserId>>,
    pub mentions_enabled: bool,
    pub social_spy: bool,
    /// Off suppresses the user's own outgoing and incoming channel chat.
    pub chat_enabled: bool,
    pub private_messages_enabled: bool,
    pub last_messaged: Option<LastMessaged>,
    pub permissions: Arc<HashSet<String>>,
    pub location: Option<Location>,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            display_name: None,
            online: true,
            channel: None,
            ignored: Arc::new(HashSet::new()),
            mentions_enabled: true,
            social_spy: false,
            chat_enabled: true,
            private_messages_enabled: true,
            last_messaged: None,
            permissions: Arc::new(HashSet::new()),
            location: None,
        }
    }
}

impl UserState {
    pub fn has_permission(&self, node: &str) -> bool {
        self.permissions.contains(node) || self.permissions.contains(permissions::WILDCARD)
    }

    pub fn is_ignoring(&self, id: &UserId) -> bool {
        self.ignored.contains(id)
    }
}

/// A connected player.
#[derive(Debug)]
pub struct ChatUser {
    id: UserId,
    name: String,
    state: RwLock<UserState>,
}

impl ChatUser {
    pub fn new(handle: &PlayerHandle) -> Self {
        Self {
            id: handle.id,
            name: handle.name.clone(),
            state: RwLock::new(UserState::default()),
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consistent copy of the mutable state.
    pub fn snapshot(&self) -> UserState {
        self.state.read().clone()
    }

    pub fn set_display_name(&self, name: Option<String>) {
        self.state.write().display_name = name;
    }

    pub fn is_online(&self) -> bool {
        self.state.read().online
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.state.write().online = online;
    }

    pub fn channel(&self) -> Option<String> {
        self.state.read().channel.clone()
    }

    pub fn set_channel(&self, channel: impl Into<String>) {
        self.state.write().channel = Some(channel.into());
    }

    pub fn location(&self) -> Option<Location> {
        self.state.read().location.clone()
    }

    pub fn set_location(&self, location: Option<Location>) {
        self.state.write().location = location;
    }

    pub fn has_permission(&self, node: &str) -> bool {
        self.state.read().has_permission(node)
    }

    pub fn grant(&self, node: impl Into<String>) {
        let mut state = self.state.write();
        Arc::make_mut(&mut state.permissions).insert(node.into());
    }

    pub fn revoke(&self, node: &str) {
        let mut state = self.state.write();
        Arc::make_mut(&mut state.permissions).remove(node);
    }

    pub fn is_ignoring(&self, id: &UserId) -> bool {
        self.state.read().is_ignoring(id)
    }

    /// Returns `false` if `id` was already ignored.
    pub fn ignore(&self, id: UserId) -> bool {
        let mut state = self.state.write();
        Arc::make_mut(&mut state.ignored).insert(id)
    }

    /// Returns `false` if `id` was not ignored.
    pub fn unignore(&self, id: &UserId) -> bool {
        let mut state = self.state.write();
        Arc::make_mut(&mut state.ignored).remove(id)
    }

    pub fn ignored(&self) -> Arc<HashSet<UserId>> {
        Arc::clone(&self.state.read().ignored)
    }

    pub fn mentions_enabled(&self) -> bool {
        self.state.read().mentions_enabled
    }

    pub fn set_mentions_enabled(&self, enabled: bool) {
        self.state.write().mentions_enabled = enabled;
    }

    pub fn social_spy(&self) -> bool {
        self.state.read().social_spy
    }

    pub fn set_social_spy(&self, enabled: bool) {
        self.state.write().social_spy = enabled;
    }

    pub fn chat_enabled(&self) -> bool {
        self.state.read().chat_enabled
    }

    pub fn set_chat_enabled(&self, enabled: bool) {
        self.state.write().chat_enabled = enabled;
    }

    pub fn private_messages_enabled(&self) -> bool {
        self.state.read().private_messages_enabled
    }

    pub fn set_private_messages_enabled(&self, enabled: bool) {
        self.state.write().private_messages_enabled = enabled;
    }

    /// Reply target, unless it is older than `ttl`.
    ///
    /// The id still has to be looked up in the users registry; it is cleared
    /// there when the target disconnects.
    pub fn last_messaged(&self, ttl: Option<Duration>) -> Option<UserId> {
        let last = self.state.read().last_messaged?;
        match ttl {
            Some(ttl) if last.at.elapsed() > ttl => None,
            _ => Some(last.id),
        }
    }

    pub fn set_last_messaged(&self, id: Option<UserId>) {
        self.state.write().last_messaged = id.map(|id| LastMessaged {
            id,
            at: Instant::now(),
        });
    }

    /// Clear the reply target if it points at `id`. Returns whether it did.
    pub(crate) fn clear_last_messaged_if(&self, id: &UserId) -> bool {
        let mut state = self.state.write();
        if state.last_messaged.is_some_and(|last| last.id == *id) {
            state.last_messaged = None;
            return true;
        }
        false
    }
}

impl PartialEq for ChatUser {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ChatUser {}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_user(name: &str) -> ChatUser {
        ChatUser::new(&PlayerHandle::new(Uuid::new_v4(), name))
    }

    #[test]
    fn test_defaults() {
        let user = make_user("Steve");
        assert!(user.is_online());
        assert!(user.mentions_enabled());
        assert!(user.chat_enabled());
        assert!(user.private_messages_enabled());
        assert!(!user.social_spy());
        assert_eq!(user.channel(), None);
        assert_eq!(user.snapshot().display_name, None);
    }

    #[test]
    fn test_ignore_and_unignore() {
        let user = make_user("Steve");
        let other = Uuid::new_v4();

        assert!(user.ignore(other));
        assert!(!user.ignore(other));
        assert!(user.is_ignoring(&other));

        assert!(user.unignore(&other));
        assert!(!user.unignore(&other));
        assert!(!user.is_ignoring(&other));
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let user = make_user("Steve");
        let other = Uuid::new_v4();
        let before = user.snapshot();

        user.ignore(other);

        assert!(!before.is_ignoring(&other));
        assert!(user.snapshot().is_ignoring(&other));
    }

    #[test]
    fn test_wildcard_permission() {
        let user = make_user("Admin");
        assert!(!user.has_permission("herald.anything"));
        user.grant(permissions::WILDCARD);
        assert!(user.has_permission("herald.anything"));
        user.revoke(permissions::WILDCARD);
        assert!(!user.has_permission("herald.anything"));
    }

    #[test]
    fn test_last_messaged_expiry() {
        let user = make_user("Steve");
        let other = Uuid::new_v4();
        user.set_last_messaged(Some(other));

        assert_eq!(user.last_messaged(None), Some(other));
        assert_eq!(user.last_messaged(Some(Duration::from_secs(60))), Some(other));

        if let Some(at) = Instant::now().checked_sub(Duration::from_secs(120)) {
            user.state.write().last_messaged = Some(LastMessaged { id: other, at });
            assert_eq!(user.last_messaged(Some(Duration::from_secs(60))), None);
            // No cache duration keeps it until disconnect
            assert_eq!(user.last_messaged(None), Some(other));
        }
    }

    #[test]
    fn test_clear_last_messaged_only_matching() {
        let user = make_user("Steve");
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        user.set_last_messaged(Some(a));

        assert!(!user.clear_last_messaged_if(&b));
        assert_eq!(user.last_messaged(None), Some(a));
        assert!(user.clear_last_messaged_if(&a));
        assert_eq!(user.last_messaged(None), None);
    }
}
