#![deny(missing_docs)]

//! # Client Cache
//!
//! Shares built values (typically a `Spec`) across repeated client
//! constructions, keyed by source identity, with a per-entry TTL.
//!
//! The cache is an explicit component with an injectable [`Clock`]; nothing
//! here is global, and cached values are handed out behind `Arc` so the
//! cache never mutates them.

use crate::error::ClientResult;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current time, as an offset from the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Duration;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock reading `now`.
    pub fn new(now: Duration) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Sets the current time.
    pub fn set(&self, now: Duration) {
        *lock(&self.now) = now;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *lock(&self.now) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *lock(&self.now)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

struct Entry<T> {
    value: Arc<T>,
    built_at: Duration,
    ttl: Duration,
}

impl<T> Entry<T> {
    fn is_stale(&self, now: Duration) -> bool {
        now > self.built_at + self.ttl
    }
}

/// TTL cache of shared values keyed by source identity.
pub struct ClientCache<T, C = SystemClock> {
    clock: C,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T> ClientCache<T, SystemClock> {
    /// Creates a cache on wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<T> Default for ClientCache<T, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Clock> ClientCache<T, C> {
    /// Creates a cache reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key` while it is fresh, otherwise builds,
    /// stores and returns a new one.
    ///
    /// A failed build is returned as-is and leaves the cache unchanged.
    pub fn get_or_build<F>(&self, key: &str, ttl: Duration, build: F) -> ClientResult<Arc<T>>
    where
        F: FnOnce() -> ClientResult<T>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = Arc::new(build()?);
        self.store(key, ttl, Arc::clone(&value));
        Ok(value)
    }

    /// Async form of [`ClientCache::get_or_build`]. The lock is not held
    /// while `build` runs.
    pub async fn get_or_build_async<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        build: F,
    ) -> ClientResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = Arc::new(build().await?);
        self.store(key, ttl, Arc::clone(&value));
        Ok(value)
    }

    /// Returns the cached value if present and fresh.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let now = self.clock.now();
        let entries = lock(&self.entries);
        let entry = entries.get(key)?;
        if entry.is_stale(now) {
            tracing::debug!(key, "cache entry is stale");
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    /// Drops the entry for `key`.
    pub fn invalidate(&self, key: &str) {
        lock(&self.entries).remove(key);
    }

    /// Number of stored entries, fresh or stale.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns true when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, key: &str, ttl: Duration, value: Arc<T>) {
        let entry = Entry {
            value,
            built_at: self.clock.now(),
            ttl,
        };
        lock(&self.entries).insert(key.to_string(), entry);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_fresh_entry_is_reused_until_ttl_passes() {
        let clock = Arc::new(ManualClock::new(secs(1)));
        let cache: ClientCache<String, _> = ClientCache::with_clock(Arc::clone(&clock));
        let builds = AtomicUsize::new(0);
        let build = || -> ClientResult<String> {
            builds.fetch_add(1, Ordering::SeqCst);
            Ok("spec".to_string())
        };

        let first = cache.get_or_build("http://localhost/swagger.json", secs(10), build).unwrap();
        clock.set(secs(11));
        let second = cache.get_or_build("http://localhost/swagger.json", secs(10), build).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        clock.set(secs(12));
        let third = cache.get_or_build("http://localhost/swagger.json", secs(10), build).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_keys_are_independent() {
        let clock = Arc::new(ManualClock::new(secs(0)));
        let cache: ClientCache<u32, _> = ClientCache::with_clock(Arc::clone(&clock));
        cache.get_or_build("a", secs(5), || Ok(1)).unwrap();
        cache.get_or_build("b", secs(50), || Ok(2)).unwrap();
        clock.advance(secs(10));
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b").as_deref(), Some(&2));
    }

    #[test]
    fn test_failed_build_leaves_cache_unchanged() {
        let clock = Arc::new(ManualClock::new(secs(0)));
        let cache: ClientCache<u32, _> = ClientCache::with_clock(Arc::clone(&clock));
        cache.get_or_build("a", secs(1), || Ok(1)).unwrap();
        clock.advance(secs(5));

        let err = cache.get_or_build("a", secs(1), || Err(ClientError::schema("broken")));
        assert!(err.is_err());
        assert_eq!(cache.len(), 1);

        let err = cache.get_or_build("b", secs(1), || Err(ClientError::schema("broken")));
        assert!(err.is_err());
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache: ClientCache<u32> = ClientCache::new();
        cache.get_or_build("a", secs(60), || Ok(1)).unwrap();
        cache.invalidate("a");
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_async_build() {
        let cache: ClientCache<u32> = ClientCache::new();
        let value = cache
            .get_or_build_async("a", secs(60), || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(*value, 7);
        let again = cache
            .get_or_build_async("a", secs(60), || async { Ok(8) })
            .await
            .unwrap();
        assert_eq!(*again, 7);
    }
}
