//! Registry of connected users.
//!
//! Owns every online [`ChatUser`] keyed by id. Join and quit are logged as
//! structured presence events carrying the online roster at that moment.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::common::types::{PlayerHandle, UserId};
use crate::user::model::ChatUser;

/// Process-wide set of online users.
#[derive(Debug, Default)]
pub struct UsersHolder {
    users: RwLock<HashMap<UserId, Arc<ChatUser>>>,
}

impl UsersHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the user for a connection, creating it on first sight.
    pub fn get_user(&self, handle: &PlayerHandle) -> Arc<ChatUser> {
        if let Some(user) = self.users.read().get(&handle.id) {
            return Arc::clone(user);
        }

        let mut users = self.users.write();
        Arc::clone(
            users
                .entry(handle.id)
                .or_insert_with(|| Arc::new(ChatUser::new(handle))),
        )
    }

    pub fn get_optional_user(&self, id: &UserId) -> Option<Arc<ChatUser>> {
        self.users.read().get(id).cloned()
    }

    /// Case-insensitive lookup by account name.
    pub fn find_by_name(&self, name: &str) -> Option<Arc<ChatUser>> {
        self.users
            .read()
            .values()
            .find(|u| u.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Remove a departing user.
    ///
    /// Every other user whose reply target points at the departing user has
    /// it cleared first, so no reference survives into the next message.
    pub fn remove_user(&self, id: &UserId) -> Option<Arc<ChatUser>> {
        let mut users = self.users.write();

        let cleared = users
            .values()
            .filter(|u| u.id() != *id)
            .filter(|u| u.clear_last_messaged_if(id))
            .count();

        let removed = users.remove(id);
        if let Some(ref user) = removed {
            user.set_online(false);
            info!(
                uuid = %user.id(),
                name = user.name(),
                cleared_reply_targets = cleared,
                "Removed chat user"
            );
        }
        removed
    }

    /// Online users, ordered by name.
    pub fn users(&self) -> Vec<Arc<ChatUser>> {
        let mut users: Vec<_> = self.users.read().values().cloned().collect();
        users.sort_by_cached_key(|u| u.name().to_lowercase());
        users
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Log a presence event with the current online roster.
    pub fn log_presence(&self, event: &str, user: Option<&ChatUser>) {
        let roster: Vec<serde_json::Value> = self
            .users()
            .iter()
            .map(|u| serde_json::json!({ "name": u.name(), "uuid": u.id().to_string() }))
            .collect();
        let roster = serde_json::Value::Array(roster).to_string();

        match user {
            Some(user) => info!(
                target: "herald::presence",
                event,
                uuid = %user.id(),
                name = user.name(),
                online = %roster,
                "Presence event"
            ),
            None => info!(
                target: "herald::presence",
                event,
                online = %roster,
                "Presence event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn handle(name: &str) -> PlayerHandle {
        PlayerHandle::new(Uuid::new_v4(), name)
    }

    #[test]
    fn test_get_user_creates_once() {
        let holder = UsersHolder::new();
        let steve = handle("Steve");

        let first = holder.get_user(&steve);
        let second = holder.get_user(&steve);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(holder.len(), 1);
    }

    #[test]
    fn test_get_optional_user() {
        let holder = UsersHolder::new();
        let steve = handle("Steve");
        assert!(holder.get_optional_user(&steve.id).is_none());

        holder.get_user(&steve);
        assert!(holder.get_optional_user(&steve.id).is_some());
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let holder = UsersHolder::new();
        holder.get_user(&handle("Steve"));

        assert!(holder.find_by_name("steve").is_some());
        assert!(holder.find_by_name("STEVE").is_some());
        assert!(holder.find_by_name("Alex").is_none());
    }

    #[test]
    fn test_remove_user_clears_reply_targets() {
        let holder = UsersHolder::new();
        let steve = holder.get_user(&handle("Steve"));
        let alex = holder.get_user(&handle("Alex"));
        let herobrine = holder.get_user(&handle("Herobrine"));

        alex.set_last_messaged(Some(steve.id()));
        herobrine.set_last_messaged(Some(alex.id()));

        let removed = holder.remove_user(&steve.id()).unwrap();

        assert!(!removed.is_online());
        assert_eq!(alex.last_messaged(None), None);
        // Unrelated references survive
        assert_eq!(herobrine.last_messaged(None), Some(alex.id()));
        assert!(holder.get_optional_user(&steve.id()).is_none());
        assert_eq!(holder.len(), 2);
    }

    #[test]
    fn test_remove_unknown_user() {
        let holder = UsersHolder::new();
        assert!(holder.remove_user(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_users_sorted_by_name() {
        let holder = UsersHolder::new();
        holder.get_user(&handle("zed"));
        holder.get_user(&handle("Alex"));
        holder.get_user(&handle("bob"));

        let names: Vec<_> = holder.users().iter().map(|u| u.name().to_string()).collect();
        assert_eq!(names, vec!["Alex", "bob", "zed"]);
    }
}
