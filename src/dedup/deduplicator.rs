//! Request Deduplicator
//!
//! Wraps an expensive async producer (LLM call, video search, content-host
//! read) so that repeats of the same request inside the TTL are answered from
//! the cache.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::key::cache_key;
use crate::cache::{CacheStats, TtlCache};

// == Deduplicator ==
/// Async producer wrapper keyed by namespace and normalized params.
///
/// Two concurrent calls with equal params that both miss will both run the
/// producer; only calls after the first result is stored are deduplicated.
// TODO: coalesce concurrent identical misses by parking followers on a shared in-flight future.
#[derive(Debug)]
pub struct Deduplicator<V> {
    cache: RwLock<TtlCache<V>>,
}

impl<V: Clone> Deduplicator<V> {
    // == Constructor ==
    /// Wraps `cache`; its capacity, default TTL and clock apply.
    pub fn new(cache: TtlCache<V>) -> Self {
        Self {
            cache: RwLock::new(cache),
        }
    }

    // == Execute ==
    /// Returns the cached result for `params`, or runs `producer` and caches it.
    ///
    /// A producer error is returned unchanged and nothing is cached, so the
    /// next call tries again. The cache lock is not held while the producer runs.
    pub async fn execute<P, F, Fut, E>(
        &self,
        namespace: &str,
        params: &P,
        producer: F,
        ttl_ms: Option<u64>,
    ) -> Result<V, E>
    where
        P: Serialize + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = cache_key(namespace, params);

        let cached = self.cache.write().await.get(&key);
        if let Some(value) = cached {
            debug!(key = %key, "Deduplicated request served from cache");
            return Ok(value);
        }

        debug!(key = %key, "Cache miss, invoking producer");
        let value = producer().await?;

        self.cache.write().await.set(key, value.clone(), ttl_ms);
        Ok(value)
    }

    // == Lookup ==
    /// Cached result for `params`, without invoking anything.
    pub async fn lookup<P: Serialize + ?Sized>(&self, namespace: &str, params: &P) -> Option<V> {
        let key = cache_key(namespace, params);
        self.cache.write().await.get(&key)
    }

    // == Store ==
    /// Caches `value` for `params` directly, replacing any previous result.
    pub async fn store<P: Serialize + ?Sized>(
        &self,
        namespace: &str,
        params: &P,
        value: V,
        ttl_ms: Option<u64>,
    ) {
        let key = cache_key(namespace, params);
        self.cache.write().await.set(key, value, ttl_ms);
    }

    // == Invalidate ==
    /// Drops the entry for `params`, or the whole namespace when `params` is None.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate(&self, namespace: &str, params: Option<&Value>) -> usize {
        let mut cache = self.cache.write().await;
        match params {
            Some(params) => usize::from(cache.delete(&cache_key(namespace, params))),
            None => cache.invalidate_namespace(namespace),
        }
    }

    /// Removes expired entries, returning how many went.
    pub async fn clean_expired(&self) -> usize {
        self.cache.write().await.clean_expired()
    }

    /// Runs `f` against the underlying cache under a read lock.
    pub async fn with_cache<R>(&self, f: impl FnOnce(&TtlCache<V>) -> R) -> R {
        let cache = self.cache.read().await;
        f(&cache)
    }
}

impl<V: Clone + Serialize> Deduplicator<V> {
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn dedup(max_size: usize, ttl_ms: u64) -> (Deduplicator<String>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let cache = TtlCache::with_clock(max_size, ttl_ms, Arc::new(clock.clone()));
        (Deduplicator::new(cache), clock)
    }

    async fn counted(calls: &AtomicUsize, value: &str) -> Result<String, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value.to_string())
    }

    #[tokio::test]
    async fn test_second_call_is_a_hit_regardless_of_field_order() {
        let (dedup, _) = dedup(100, 60_000);
        let calls = &AtomicUsize::new(0);

        let first = dedup
            .execute("ns", &json!({"a": 1, "b": 2}), || counted(calls, "result"), None)
            .await;
        let second = dedup
            .execute("ns", &json!({"b": 2, "a": 1}), || counted(calls, "other"), None)
            .await;

        assert_eq!(first, Ok("result".to_string()));
        assert_eq!(second, Ok("result".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_params_each_invoke_producer() {
        let (dedup, _) = dedup(100, 60_000);
        let calls = &AtomicUsize::new(0);

        dedup
            .execute("ns", &json!({"q": "pho"}), || counted(calls, "pho"), None)
            .await
            .unwrap();
        dedup
            .execute("ns", &json!({"q": "ramen"}), || counted(calls, "ramen"), None)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (dedup, clock) = dedup(100, 60_000);
        let calls = &AtomicUsize::new(0);
        let params = json!({"q": "laksa"});

        dedup
            .execute("ns", &params, || counted(calls, "v1"), Some(1_000))
            .await
            .unwrap();
        clock.advance(1_001);
        let value = dedup
            .execute("ns", &params, || counted(calls, "v2"), Some(1_000))
            .await
            .unwrap();

        assert_eq!(value, "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_producer_error_is_not_cached() {
        let (dedup, _) = dedup(100, 60_000);
        let calls = &AtomicUsize::new(0);
        let params = json!({"q": "curry"});

        let failed: Result<String, String> = dedup
            .execute(
                "ns",
                &params,
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("upstream timed out".to_string())
                },
                None,
            )
            .await;
        assert_eq!(failed, Err("upstream timed out".to_string()));
        assert!(dedup.lookup("ns", &params).await.is_none());

        let retried = dedup
            .execute("ns", &params, || counted(calls, "curry"), None)
            .await;
        assert_eq!(retried, Ok("curry".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_are_not_coalesced() {
        let (dedup, _) = dedup(100, 60_000);
        let calls = &AtomicUsize::new(0);
        let params = json!({"q": "satay"});

        let slow = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>("satay".to_string())
        };

        let (a, b) = tokio::join!(
            dedup.execute("ns", &params, slow, None),
            dedup.execute("ns", &params, slow, None)
        );

        assert_eq!(a, Ok("satay".to_string()));
        assert_eq!(b, Ok("satay".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_overrides_ttl() {
        let (dedup, clock) = dedup(10, 60_000);
        let calls = &AtomicUsize::new(0);
        let params = json!({"q": "bibimbap"});

        dedup
            .execute("ns", &params, || counted(calls, "v1"), None)
            .await
            .unwrap();
        dedup.store("ns", &params, "v2".to_string(), Some(100)).await;

        assert_eq!(dedup.lookup("ns", &params).await, Some("v2".to_string()));
        clock.advance(101);
        assert!(dedup.lookup("ns", &params).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_single_and_namespace() {
        let (dedup, _) = dedup(100, 60_000);
        let calls = &AtomicUsize::new(0);
        let p1 = json!({"id": 1});
        let p2 = json!({"id": 2});

        for params in [&p1, &p2] {
            dedup
                .execute("github", params, || counted(calls, "file"), None)
                .await
                .unwrap();
        }
        dedup
            .execute("videos", &p1, || counted(calls, "video"), None)
            .await
            .unwrap();

        assert_eq!(dedup.invalidate("github", Some(&p1)).await, 1);
        assert!(dedup.lookup("github", &p1).await.is_none());
        assert!(dedup.lookup("github", &p2).await.is_some());

        assert_eq!(dedup.invalidate("github", None).await, 1);
        assert!(dedup.lookup("github", &p2).await.is_none());
        assert!(dedup.lookup("videos", &p1).await.is_some());
    }

    #[tokio::test]
    async fn test_bounded_by_cache_capacity() {
        let (dedup, clock) = dedup(2, 60_000);
        let calls = &AtomicUsize::new(0);

        for i in 0..3 {
            dedup
                .execute("ns", &json!({ "i": i }), || counted(calls, "v"), None)
                .await
                .unwrap();
            clock.advance(1);
        }

        let stats = dedup.stats().await;
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.evictions, 1);
        assert!(dedup.lookup("ns", &json!({"i": 0})).await.is_none());
    }

    #[tokio::test]
    async fn test_clean_expired_and_with_cache() {
        let (dedup, clock) = dedup(10, 60_000);
        let calls = &AtomicUsize::new(0);

        dedup
            .execute("ns", &json!({"a": 1}), || counted(calls, "short"), Some(10))
            .await
            .unwrap();
        dedup
            .execute("ns", &json!({"a": 2}), || counted(calls, "long"), None)
            .await
            .unwrap();
        clock.advance(11);

        assert_eq!(dedup.with_cache(|c| c.valid_entries_in("ns").count()).await, 1);
        assert_eq!(dedup.clean_expired().await, 1);
        assert_eq!(dedup.with_cache(|c| c.len()).await, 1);
    }

    #[test]
    fn test_execute_from_sync_context() {
        let (dedup, _) = dedup(10, 60_000);
        let calls = &AtomicUsize::new(0);

        let value = tokio_test::block_on(dedup.execute(
            "ns",
            &json!({"q": "sync"}),
            || counted(calls, "sync"),
            None,
        ));

        assert_eq!(value, Ok("sync".to_string()));
    }
}
