use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub hit_rate: f64,
}

struct Slot<V> {
    cell: Arc<OnceCell<V>>,
    created_at: Instant,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Bounded, time-limited memoization keyed by string.
///
/// Each key owns a `OnceCell`, so concurrent callers for the same key share a
/// single in-flight initialization and a value is populated at most once per
/// slot lifetime. A failed initialization removes its slot, so the next caller
/// retries and failures never take up capacity. When the cache is full,
/// expired slots are dropped first, then the oldest populated slot. Slots still
/// being initialized are never evicted; if every slot is in flight the cache
/// briefly grows past `max_capacity`.
pub struct TtlCache<V> {
    slots: RwLock<HashMap<String, Slot<V>>>,
    max_capacity: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(max_capacity: usize, ttl: Duration) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            max_capacity: max_capacity.max(1),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Returns the cached value, or runs `init` to populate it.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.slot(key).await;

        if let Some(value) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit: {}", key);
            return Ok(value.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss: {}", key);
        match cell.get_or_try_init(init).await {
            Ok(value) => Ok(value.clone()),
            Err(e) => {
                self.discard_unfilled(key, &cell).await;
                Err(e)
            }
        }
    }

    /// Returns a populated, unexpired value without initializing anything.
    pub async fn get(&self, key: &str) -> Option<V> {
        let slots = self.slots.read().await;
        slots
            .get(key)
            .filter(|slot| !slot.is_expired(self.ttl))
            .and_then(|slot| slot.cell.get().cloned())
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.slots.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            hits as f64 / (hits + misses) as f64 * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            entries: self.len().await,
            hit_rate,
        }
    }

    async fn slot(&self, key: &str) -> Arc<OnceCell<V>> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(key) {
                if !slot.is_expired(self.ttl) {
                    return slot.cell.clone();
                }
            }
        }

        let mut slots = self.slots.write().await;

        // Another task may have replaced the slot between the two locks.
        if let Some(slot) = slots.get(key) {
            if !slot.is_expired(self.ttl) {
                return slot.cell.clone();
            }
            slots.remove(key);
        }

        if slots.len() >= self.max_capacity {
            let ttl = self.ttl;
            slots.retain(|_, slot| !slot.cell.initialized() || !slot.is_expired(ttl));
        }

        if slots.len() >= self.max_capacity {
            let oldest = slots
                .iter()
                .filter(|(_, slot)| slot.cell.initialized())
                .min_by_key(|(_, slot)| slot.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting oldest cache entry: {}", oldest);
                slots.remove(&oldest);
            }
        }

        let slot = Slot::new();
        let cell = slot.cell.clone();
        slots.insert(key.to_string(), slot);
        cell
    }

    /// Drop the slot for `key` if it still holds this empty cell.
    async fn discard_unfilled(&self, key: &str, cell: &Arc<OnceCell<V>>) {
        let mut slots = self.slots.write().await;
        let unfilled = slots
            .get(key)
            .is_some_and(|slot| Arc::ptr_eq(&slot.cell, cell) && !slot.cell.initialized());
        if unfilled {
            slots.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_value_is_initialized_once() {
        let cache: TtlCache<Vec<String>> = TtlCache::new(8, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<_, ()> = cache
                .get_or_try_init("a", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["X".to_string()])
                })
                .await;
            assert_eq!(value, Ok(vec!["X".to_string()]));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let cache: TtlCache<u32> = TtlCache::new(8, Duration::from_secs(60));

        let first: Result<u32, &str> = cache.get_or_try_init("k", || async { Err("boom") }).await;
        assert_eq!(first, Err("boom"));
        assert_eq!(cache.get("k").await, None);

        let second: Result<u32, &str> = cache.get_or_try_init("k", || async { Ok(7) }).await;
        assert_eq!(second, Ok(7));
        assert_eq!(cache.get("k").await, Some(7));
    }

    #[tokio::test]
    async fn test_expired_entries_are_refreshed() {
        let cache: TtlCache<u32> = TtlCache::new(8, Duration::from_millis(20));

        let _: Result<u32, ()> = cache.get_or_try_init("k", || async { Ok(1) }).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("k").await, None);

        let refreshed: Result<u32, ()> = cache.get_or_try_init("k", || async { Ok(2) }).await;
        assert_eq!(refreshed, Ok(2));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let cache: TtlCache<u32> = TtlCache::new(2, Duration::from_secs(60));

        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            let _: Result<u32, ()> = cache.get_or_try_init(key, || async move { Ok(i as u32) }).await;
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(1));
        assert_eq!(cache.get("c").await, Some(2));
    }

    #[tokio::test]
    async fn test_failed_init_takes_no_capacity() {
        let cache: TtlCache<u32> = TtlCache::new(2, Duration::from_secs(60));
        let _: Result<u32, &str> = cache.get_or_try_init("good", || async { Ok(1) }).await;

        for key in ["bad-1", "bad-2", "bad-3"] {
            let failed: Result<u32, &str> = cache.get_or_try_init(key, || async { Err("boom") }).await;
            assert_eq!(failed, Err("boom"));
            assert_eq!(cache.len().await, 1);
        }

        assert_eq!(cache.get("good").await, Some(1));
        let stats = cache.stats().await;
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.misses, 4);
    }

    #[tokio::test]
    async fn test_eviction_skips_in_flight_slots() {
        let cache: Arc<TtlCache<u32>> = Arc::new(TtlCache::new(1, Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow = {
            let cache = cache.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_init("a", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok::<u32, ()>(1)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let b: Result<u32, ()> = cache.get_or_try_init("b", || async { Ok(2) }).await;
        assert_eq!(b, Ok(2));

        let again: Result<u32, ()> = cache
            .get_or_try_init("a", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(99)
            })
            .await;

        assert_eq!(again, Ok(1));
        assert_eq!(slow.await.unwrap(), Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_init() {
        let cache: Arc<TtlCache<u32>> = Arc::new(TtlCache::new(8, Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..5)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_try_init("shared", || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            Ok::<u32, ()>(42)
                        })
                        .await
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            assert_eq!(task.unwrap(), Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
