use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a cached password version stays valid.
pub const DEFAULT_TTL_SECS: i64 = 60;
/// The maximum number of users the cache holds.
pub const DEFAULT_CAPACITY: usize = 1000;

struct CacheEntry {
    version: i32,
    expires_at: DateTime<Utc>,
    /// Monotonic recency marker; larger means more recently used.
    last_used: u64,
}

struct CacheInner {
    entries: HashMap<Uuid, CacheEntry>,
    tick: u64,
}

/// A short-TTL, size-bounded cache of each user's password version.
///
/// Avoids a database round-trip on every authenticated request while still
/// detecting tokens issued before a password change. Entries must be
/// invalidated synchronously when a password changes, otherwise a stale
/// version could mask the change for the length of the TTL.
#[derive(Clone)]
pub struct PasswordVersionCache {
    inner: Arc<RwLock<CacheInner>>,
    ttl: Duration,
    capacity: usize,
}

impl PasswordVersionCache {
    /// Creates a cache with the default TTL (60s) and capacity (1000).
    pub fn new() -> Self {
        Self::with_limits(Duration::seconds(DEFAULT_TTL_SECS), DEFAULT_CAPACITY)
    }

    /// Creates a cache with explicit limits.
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                tick: 0,
            })),
            ttl,
            capacity,
        }
    }

    /// Returns the cached version for a user, refreshing its recency.
    ///
    /// Expired entries are deleted on read and reported as a miss.
    pub async fn get(&self, user_id: Uuid) -> Option<i32> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        match inner.entries.get(&user_id) {
            None => None,
            Some(entry) if entry.expires_at < now => {
                inner.entries.remove(&user_id);
                None
            }
            Some(entry) => {
                let version = entry.version;
                inner.tick += 1;
                let tick = inner.tick;
                if let Some(entry) = inner.entries.get_mut(&user_id) {
                    entry.last_used = tick;
                }
                Some(version)
            }
        }
    }

    /// Caches a user's password version.
    ///
    /// At capacity, expired entries are purged first; if the cache is still
    /// full, the single least-recently-used entry is evicted.
    pub async fn set(&self, user_id: Uuid, version: i32) {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        if !inner.entries.contains_key(&user_id) && inner.entries.len() >= self.capacity {
            inner.entries.retain(|_, entry| entry.expires_at >= now);

            if inner.entries.len() >= self.capacity {
                if let Some(lru) = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(id, _)| *id)
                {
                    inner.entries.remove(&lru);
                }
            }
        }

        inner.tick += 1;
        let entry = CacheEntry {
            version,
            expires_at: now + self.ttl,
            last_used: inner.tick,
        };
        inner.entries.insert(user_id, entry);
    }

    /// Removes a user's entry immediately.
    ///
    /// Must be called synchronously when the user's password changes.
    pub async fn invalidate(&self, user_id: Uuid) {
        let mut inner = self.inner.write().await;
        inner.entries.remove(&user_id);
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.entries.clear();
        inner.tick = 0;
    }

    /// Returns the number of entries currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

impl Default for PasswordVersionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_returns_version() {
        let cache = PasswordVersionCache::new();
        let user = Uuid::new_v4();
        cache.set(user, 3).await;
        assert_eq!(cache.get(user).await, Some(3));
    }

    #[tokio::test]
    async fn miss_for_unknown_user() {
        let cache = PasswordVersionCache::new();
        assert_eq!(cache.get(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = PasswordVersionCache::new();
        let user = Uuid::new_v4();
        cache.set(user, 1).await;
        cache.invalidate(user).await;
        assert_eq!(cache.get(user).await, None);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss_and_is_dropped() {
        let cache = PasswordVersionCache::with_limits(Duration::zero(), DEFAULT_CAPACITY);
        let user = Uuid::new_v4();
        cache.set(user, 5).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(cache.get(user).await, None);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let cache = PasswordVersionCache::new();
        cache.set(Uuid::new_v4(), 1).await;
        cache.set(Uuid::new_v4(), 2).await;
        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn overflow_with_live_entries_evicts_exactly_one_lru() {
        let cache = PasswordVersionCache::with_limits(Duration::seconds(60), 3);
        let users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (i, user) in users.iter().enumerate() {
            cache.set(*user, i as i32).await;
        }

        // Touch the oldest-inserted entry so it is no longer the LRU.
        assert_eq!(cache.get(users[0]).await, Some(0));

        let newcomer = Uuid::new_v4();
        cache.set(newcomer, 99).await;

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.get(newcomer).await, Some(99));
        assert_eq!(cache.get(users[0]).await, Some(0));
        // users[1] became the least-recently-used and was evicted.
        assert_eq!(cache.get(users[1]).await, None);
        assert_eq!(cache.get(users[2]).await, Some(2));
    }

    #[tokio::test]
    async fn overflow_purges_expired_before_evicting_live_entries() {
        let cache = PasswordVersionCache::with_limits(Duration::seconds(60), 2);
        let live = Uuid::new_v4();
        cache.set(live, 1).await;

        // Force an already-expired entry in manually.
        {
            let mut inner = cache.inner.write().await;
            inner.tick += 1;
            let tick = inner.tick;
            inner.entries.insert(
                Uuid::new_v4(),
                CacheEntry {
                    version: 0,
                    expires_at: Utc::now() - Duration::seconds(1),
                    last_used: tick,
                },
            );
        }

        let newcomer = Uuid::new_v4();
        cache.set(newcomer, 2).await;

        // The expired entry absorbed the overflow; the live one survived.
        assert_eq!(cache.get(live).await, Some(1));
        assert_eq!(cache.get(newcomer).await, Some(2));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn overwriting_an_existing_user_does_not_evict() {
        let cache = PasswordVersionCache::with_limits(Duration::seconds(60), 2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.set(a, 1).await;
        cache.set(b, 1).await;
        cache.set(a, 2).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(a).await, Some(2));
        assert_eq!(cache.get(b).await, Some(1));
    }
}
