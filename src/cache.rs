//! Keyed caches of domain objects, with grace-window garbage collection.
//!
//! Each cache maps a snowflake id to a shared handle on the object.
//! Objects are flagged for removal rather than erased on the spot; a
//! periodic sweep purges them once the grace window has passed, so a
//! reader that found a handle just before the flag went up can finish
//! with it.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use crate::models::{Channel, Emoji, Guild, Role, Snowflake, User};
use crate::utils::now_secs;

/// Seconds a deleted object stays findable before a sweep may purge it.
pub const GC_GRACE_SECS: u64 = 60;

/// An object that can live in a [`Cache`]: it has a snowflake id and a
/// removal marker settable through a shared handle.
pub trait Cached: Send + Sync + 'static {
    fn id(&self) -> Snowflake;

    /// Unix timestamp at which the object was flagged for removal;
    /// 0 while live.
    fn deleted_at(&self) -> u64;

    /// Flag the object for removal. The next sweep after the grace
    /// window purges it.
    fn mark_deleted(&self, epoch_secs: u64);
}

/// A concurrent id-keyed store of one kind of domain object.
pub struct Cache<T: Cached> {
    map: DashMap<Snowflake, Arc<T>>,
}

impl<T: Cached> Cache<T> {
    pub fn new() -> Self {
        Self { map: DashMap::new() }
    }

    /// Insert or overwrite the entry for the object's id.
    pub fn store(&self, object: Arc<T>) {
        self.map.insert(object.id(), object);
    }

    /// Erase the entry for the object's id immediately, bypassing the
    /// grace window.
    pub fn remove(&self, object: &T) {
        self.map.remove(&object.id());
    }

    /// Look up an object by id. The returned handle stays valid however
    /// long the caller holds it, even across a sweep.
    pub fn find(&self, id: Snowflake) -> Option<Arc<T>> {
        self.map.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn count(&self) -> usize {
        self.map.len()
    }

    /// Purge entries flagged as deleted more than [`GC_GRACE_SECS`]
    /// before `now`.
    pub fn sweep(&self, now: u64) {
        self.map.retain(|_, object| {
            let deleted_at = object.deleted_at();
            deleted_at == 0 || now.saturating_sub(deleted_at) <= GC_GRACE_SECS
        });
    }
}

impl<T: Cached> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The five major caches. Each cluster gets its own registry; the
/// process-wide helpers below wrap a shared default one.
#[derive(Default)]
pub struct CacheRegistry {
    pub users: Cache<User>,
    pub guilds: Cache<Guild>,
    pub roles: Cache<Role>,
    pub channels: Cache<Channel>,
    pub emojis: Cache<Emoji>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run garbage collection across all caches, purging objects deleted
    /// more than [`GC_GRACE_SECS`] ago. Invoke periodically from a timer.
    pub fn garbage_collection(&self) {
        let now = now_secs();
        self.users.sweep(now);
        self.guilds.sweep(now);
        self.roles.sweep(now);
        self.channels.sweep(now);
        self.emojis.sweep(now);
        tracing::debug!(
            users = self.users.count(),
            guilds = self.guilds.count(),
            roles = self.roles.count(),
            channels = self.channels.count(),
            emojis = self.emojis.count(),
            "cache sweep finished"
        );
    }
}

static CACHES: LazyLock<CacheRegistry> = LazyLock::new(CacheRegistry::new);

macro_rules! cache_decl {
    ($ty:ty, $field:ident, $find:ident, $get_cache:ident, $count:ident) => {
        pub fn $find(id: Snowflake) -> Option<Arc<$ty>> {
            CACHES.$field.find(id)
        }
        pub fn $get_cache() -> &'static Cache<$ty> {
            &CACHES.$field
        }
        pub fn $count() -> usize {
            CACHES.$field.count()
        }
    };
}

cache_decl!(User, users, find_user, get_user_cache, get_user_count);
cache_decl!(Guild, guilds, find_guild, get_guild_cache, get_guild_count);
cache_decl!(Role, roles, find_role, get_role_cache, get_role_count);
cache_decl!(Channel, channels, find_channel, get_channel_cache, get_channel_count);
cache_decl!(Emoji, emojis, find_emoji, get_emoji_cache, get_emoji_count);

/// Garbage-collect the process-wide caches.
pub fn garbage_collection() {
    CACHES.garbage_collection();
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user(id: Snowflake) -> Arc<User> {
        Arc::new(User::fill_from_json(&json!({ "id": id.to_string() })))
    }

    #[test]
    fn store_find_remove_count() {
        let registry = CacheRegistry::new();
        for id in 1..=3 {
            registry.users.store(user(id));
        }
        assert_eq!(registry.users.count(), 3);
        assert_eq!(registry.users.find(2).expect("stored").id(), 2);
        assert!(registry.users.find(99).is_none());

        let second = registry.users.find(2).expect("stored");
        registry.users.remove(&second);
        assert_eq!(registry.users.count(), 2);
        assert!(registry.users.find(2).is_none());
    }

    #[test]
    fn storing_the_same_id_overwrites() {
        let registry = CacheRegistry::new();
        registry.users.store(user(7));
        registry.users.store(user(7));
        assert_eq!(registry.users.count(), 1);
    }

    #[test]
    fn deleted_entries_survive_the_grace_window() {
        let registry = CacheRegistry::new();
        for id in 1..=3 {
            registry.users.store(user(id));
        }

        let victim = registry.users.find(2).expect("stored");
        let flagged_at = now_secs();
        victim.mark_deleted(flagged_at);

        // Still findable right away and up to the edge of the window.
        registry.users.sweep(flagged_at);
        assert!(registry.users.find(2).is_some());
        registry.users.sweep(flagged_at + GC_GRACE_SECS);
        assert!(registry.users.find(2).is_some());

        registry.users.sweep(flagged_at + GC_GRACE_SECS + 1);
        assert!(registry.users.find(2).is_none());
        assert_eq!(registry.users.count(), 2);

        // The handle obtained before the purge is still usable.
        assert_eq!(victim.id(), 2);
    }

    #[test]
    fn concurrent_store_remove_find_is_safe() {
        let registry = Arc::new(CacheRegistry::new());
        let threads = 8;
        let per_thread = 200u64;

        std::thread::scope(|scope| {
            for t in 0..threads {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    let base = t * per_thread;
                    for i in 0..per_thread {
                        registry.users.store(user(base + i));
                    }
                    // Remove the odd ids again, probing as we go.
                    for i in 0..per_thread {
                        let id = base + i;
                        if let Some(found) = registry.users.find(id) {
                            assert_eq!(found.id(), id);
                        }
                        if id % 2 == 1 {
                            if let Some(found) = registry.users.find(id) {
                                registry.users.remove(&found);
                            }
                        }
                    }
                });
            }
        });

        let expected = (threads * per_thread / 2) as usize;
        assert_eq!(registry.users.count(), expected);
        assert!(registry.users.find(2).is_some());
        assert!(registry.users.find(3).is_none());
    }
}
