//! Shared read cache. Best-effort and fail-open: a miss is always a valid
//! answer, so cache trouble can never fail an operation.

use std::time::Duration;

use dashmap::DashMap;
use moka::sync::Cache;
use tracing::debug;
use uuid::Uuid;

/// TTL class for cached values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Memories,
    Preferences,
}

/// Namespaced in-process cache. User-level invalidation is O(1): every key
/// embeds a per-user generation counter, and invalidation bumps the
/// counter so stale entries simply stop being addressable (moka evicts
/// them by TTL/size).
pub struct CacheService {
    memories: Cache<String, String>,
    preferences: Cache<String, String>,
    generations: DashMap<Uuid, u64>,
}

impl CacheService {
    pub fn new(memories_ttl: Duration, preferences_ttl: Duration) -> Self {
        Self {
            memories: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(memories_ttl)
                .build(),
            preferences: Cache::builder()
                .max_capacity(2_000)
                .time_to_live(preferences_ttl)
                .build(),
            generations: DashMap::new(),
        }
    }

    fn generation(&self, user_id: Uuid) -> u64 {
        self.generations.get(&user_id).map(|g| *g).unwrap_or(0)
    }

    fn namespaced(&self, user_id: Uuid, key: &str) -> String {
        format!("{user_id}:{}:{key}", self.generation(user_id))
    }

    /// Fetch a cached JSON payload. `None` on miss, always.
    pub fn get(&self, user_id: Uuid, class: TtlClass, key: &str) -> Option<String> {
        let namespaced = self.namespaced(user_id, key);
        match class {
            TtlClass::Memories => self.memories.get(&namespaced),
            TtlClass::Preferences => self.preferences.get(&namespaced),
        }
    }

    pub fn put(&self, user_id: Uuid, class: TtlClass, key: &str, value: String) {
        let namespaced = self.namespaced(user_id, key);
        match class {
            TtlClass::Memories => self.memories.insert(namespaced, value),
            TtlClass::Preferences => self.preferences.insert(namespaced, value),
        }
    }

    /// Drop every cached value in the user's namespace.
    pub fn invalidate_user(&self, user_id: Uuid) {
        let mut entry = self.generations.entry(user_id).or_insert(0);
        *entry += 1;
        debug!(user_id = %user_id, generation = *entry, "user cache namespace invalidated");
    }
}

impl Default for CacheService {
    fn default() -> Self {
        Self::new(Duration::from_secs(3_600), Duration::from_secs(86_400))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_roundtrip() {
        let cache = CacheService::default();
        let user = Uuid::new_v4();
        cache.put(user, TtlClass::Memories, "recall:q", "[1]".into());
        assert_eq!(
            cache.get(user, TtlClass::Memories, "recall:q"),
            Some("[1]".to_string())
        );
    }

    #[test]
    fn invalidation_hides_previous_entries() {
        let cache = CacheService::default();
        let user = Uuid::new_v4();
        cache.put(user, TtlClass::Memories, "k", "v".into());
        cache.invalidate_user(user);
        assert_eq!(cache.get(user, TtlClass::Memories, "k"), None);
    }

    #[test]
    fn namespaces_are_per_user() {
        let cache = CacheService::default();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        cache.put(alice, TtlClass::Preferences, "prefs", "a".into());
        cache.invalidate_user(bob);
        assert_eq!(
            cache.get(alice, TtlClass::Preferences, "prefs"),
            Some("a".to_string())
        );
        assert_eq!(cache.get(bob, TtlClass::Preferences, "prefs"), None);
    }
}
