//! Vanish and mute providers.
//!
//! External plugins register providers here. Every query ORs the answers of
//! all registered providers and is `false` when there are none. The provider
//! lists are swapped atomically on register/unregister, so a message being
//! routed keeps the list it started with.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::common::permissions;
use crate::user::ChatUser;

/// Hides users from chat audiences.
pub trait VanishHook: Send + Sync {
    fn name(&self) -> &str;

    fn is_vanished(&self, user: &ChatUser) -> bool;

    /// Whether `observer` still sees vanished users.
    fn can_see_vanished(&self, _observer: &ChatUser) -> bool {
        false
    }
}

/// Silences users.
pub trait MuteHook: Send + Sync {
    fn name(&self) -> &str;

    fn is_muted(&self, user: &ChatUser) -> bool;
}

/// Returned on registration; pass back to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(u64);

struct Registered<T: ?Sized> {
    handle: HookHandle,
    hook: Arc<T>,
}

impl<T: ?Sized> Clone for Registered<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            hook: Arc::clone(&self.hook),
        }
    }
}

type HookList<T> = ArcSwap<Vec<Registered<T>>>;

/// Registry of vanish and mute providers.
pub struct HookManager {
    next_handle: AtomicU64,
    vanish: HookList<dyn VanishHook>,
    mute: HookList<dyn MuteHook>,
}

impl Default for HookManager {
    fn default() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            vanish: ArcSwap::from_pointee(Vec::new()),
            mute: ArcSwap::from_pointee(Vec::new()),
        }
    }
}

impl fmt::Debug for HookManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookManager")
            .field("vanish", &self.vanish.load().len())
            .field("mute", &self.mute.load().len())
            .finish()
    }
}

impl HookManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> HookHandle {
        HookHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    pub fn register_vanish(&self, hook: Arc<dyn VanishHook>) -> HookHandle {
        let handle = self.allocate();
        info!(hook = hook.name(), "Registered vanish hook");
        let entry = Registered { handle, hook };
        self.vanish.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(entry.clone());
            next
        });
        handle
    }

    pub fn register_mute(&self, hook: Arc<dyn MuteHook>) -> HookHandle {
        let handle = self.allocate();
        info!(hook = hook.name(), "Registered mute hook");
        let entry = Registered { handle, hook };
        self.mute.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(entry.clone());
            next
        });
        handle
    }

    /// Remove a provider of either kind. Returns `false` for an unknown handle.
    pub fn unregister(&self, handle: HookHandle) -> bool {
        remove(&self.vanish, handle, |h| h.name().to_string())
            || remove(&self.mute, handle, |h| h.name().to_string())
    }

    pub fn is_vanished(&self, user: &ChatUser) -> bool {
        self.vanish.load().iter().any(|r| r.hook.is_vanished(user))
    }

    /// Holders of the see-vanished permission always see vanished users.
    pub fn can_see_vanished(&self, observer: &ChatUser) -> bool {
        observer.has_permission(permissions::SEE_VANISHED)
            || self
                .vanish
                .load()
                .iter()
                .any(|r| r.hook.can_see_vanished(observer))
    }

    /// Name of the first provider muting `user`.
    pub fn muted_by(&self, user: &ChatUser) -> Option<String> {
        self.mute
            .load()
            .iter()
            .find(|r| r.hook.is_muted(user))
            .map(|r| r.hook.name().to_string())
    }

    pub fn is_muted(&self, user: &ChatUser) -> bool {
        self.muted_by(user).is_some()
    }

    pub fn vanish_hooks(&self) -> usize {
        self.vanish.load().len()
    }

    pub fn mute_hooks(&self) -> usize {
        self.mute.load().len()
    }
}

fn remove<T: ?Sized>(
    list: &HookList<T>,
    handle: HookHandle,
    name: impl Fn(&T) -> String,
) -> bool {
    let found = list
        .load()
        .iter()
        .find(|r| r.handle == handle)
        .map(|r| name(r.hook.as_ref()));
    let Some(found) = found else {
        return false;
    };

    list.rcu(|current| {
        current
            .iter()
            .filter(|r| r.handle != handle)
            .cloned()
            .collect::<Vec<_>>()
    });
    info!(hook = %found, "Unregistered hook");
    true
}
