//! Keyed query cache with in-flight deduplication.
//!
//! Entries live in a `moka` cache bounded by capacity and a hard TTL. On top
//! of that each entry carries its fetch time so reads can treat it as stale
//! before moka evicts it. Concurrent reads of one key share a single fetch
//! through `try_get_with`.
//!
//! A per-family epoch closes the race between an in-flight fetch and an
//! invalidation of the same family: a fetch that started before the
//! invalidation still resolves its callers, but its entry is stored already
//! stale so the next read goes back to the network.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::ops::compute::Op;
use tracing::{debug, warn};

use crate::config::{CacheConfig, StalePolicy};
use crate::error::{ApiError, Result};
use crate::query::key::{QueryKey, ResourceFamily};
use crate::query::mutation::Invalidation;
use crate::query::state::{CachedValue, Fetched, QueryState, QueryValue};

#[derive(Debug, Clone)]
struct Entry {
    value: QueryValue,
    fetched_at: Instant,
    stale: bool,
}

/// Shared query cache. Cloning is cheap and every clone sees the same entries.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<QueryCacheInner>,
}

struct QueryCacheInner {
    entries: Cache<QueryKey, Entry>,
    stale_after: Duration,
    policy: StalePolicy,
    epochs: [AtomicU64; 3],
    in_flight: Mutex<HashMap<QueryKey, usize>>,
    failures: Mutex<HashMap<QueryKey, ApiError>>,
    placeholders: Mutex<HashMap<&'static str, QueryValue>>,
    refreshing: Mutex<HashSet<QueryKey>>,
}

impl QueryCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .build();

        Self {
            inner: Arc::new(QueryCacheInner {
                entries,
                stale_after: config.stale_after,
                policy: config.stale_policy,
                epochs: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
                in_flight: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashMap::new()),
                placeholders: Mutex::new(HashMap::new()),
                refreshing: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Resolve `key`, from cache when fresh, otherwise through `fetcher`.
    ///
    /// Disabled keys resolve to [`Fetched::Disabled`] without calling the
    /// fetcher. Concurrent calls for one key share a single fetch.
    ///
    /// # Errors
    ///
    /// Returns the fetcher's error. Failures are not cached; the next call
    /// fetches again.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Fetched<T>>
    where
        T: CachedValue,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !key.is_enabled() {
            debug!(%key, "Query disabled, skipping fetch");
            return Ok(Fetched::Disabled);
        }
        let fetcher = Arc::new(fetcher);

        if let Some(entry) = self.inner.entries.get(&key).await {
            if self.is_fresh(&entry) {
                debug!(%key, "Query cache hit");
                return decode(&key, entry.value).map(Fetched::Ready);
            }
            if self.inner.policy == StalePolicy::RevalidateInBackground && !entry.stale {
                debug!(%key, "Serving stale entry, revalidating in background");
                self.spawn_refresh(key.clone(), Arc::clone(&fetcher));
                return decode(&key, entry.value).map(Fetched::Ready);
            }
            self.evict_if_unchanged(&key, entry.fetched_at).await;
        }

        let value = self.load(key.clone(), fetcher).await?;
        decode(&key, value).map(Fetched::Ready)
    }

    /// Mark entries stale. Fetches of the same family already in flight
    /// store their result as stale.
    pub async fn invalidate(&self, invalidation: &Invalidation) {
        self.bump_epoch(invalidation.family());

        let keys: Vec<QueryKey> = self
            .inner
            .entries
            .iter()
            .filter(|(k, _)| invalidation.matches(k))
            .map(|(k, _)| QueryKey::clone(&k))
            .collect();
        debug!(?invalidation, count = keys.len(), "Invalidating query cache entries");
        for key in keys {
            self.inner.entries.invalidate(&key).await;
        }
    }

    /// Drop every entry and remembered state. Used on logout.
    pub fn clear(&self) {
        for family in ResourceFamily::ALL {
            self.bump_epoch(family);
        }
        self.inner.entries.invalidate_all();
        lock(&self.inner.failures).clear();
        lock(&self.inner.placeholders).clear();
        debug!("Query cache cleared");
    }

    /// Observe `key` without fetching.
    pub async fn state<T: CachedValue>(&self, key: &QueryKey) -> QueryState<T> {
        if !key.is_enabled() {
            return QueryState::Disabled;
        }
        if let Some(value) = self
            .inner
            .entries
            .get(key)
            .await
            .and_then(|e| T::from_value(e.value))
        {
            return QueryState::Ready(value);
        }
        if self.is_in_flight(key) {
            let placeholder = key
                .keeps_previous_data()
                .then(|| lock(&self.inner.placeholders).get(key.operation()).cloned())
                .flatten()
                .and_then(T::from_value);
            return QueryState::Loading { placeholder };
        }
        if let Some(err) = lock(&self.inner.failures).get(key) {
            return QueryState::Failed(err.clone());
        }
        QueryState::Idle
    }

    /// Whether a network fetch for `key` is running.
    #[must_use]
    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        lock(&self.inner.in_flight).contains_key(key)
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        !entry.stale && entry.fetched_at.elapsed() < self.inner.stale_after
    }

    fn epoch(&self, family: ResourceFamily) -> u64 {
        self.inner.epochs[family.index()].load(Ordering::SeqCst)
    }

    fn bump_epoch(&self, family: ResourceFamily) {
        self.inner.epochs[family.index()].fetch_add(1, Ordering::SeqCst);
    }

    async fn load<T, F, Fut>(&self, key: QueryKey, fetcher: Arc<F>) -> Result<QueryValue>
    where
        T: CachedValue,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let this = self.clone();
        let fetch_key = key.clone();
        let init = async move {
            let family = fetch_key.family();
            let started = this.epoch(family);
            let _flight = FlightGuard::begin(&this, &fetch_key);
            debug!(key = %fetch_key, "Query cache miss, fetching");

            match fetcher().await {
                Ok(value) => {
                    let value = value.into_value();
                    this.settle(&fetch_key, &value);
                    let stale = this.epoch(family) != started;
                    if stale {
                        debug!(key = %fetch_key, "Family invalidated during fetch, storing as stale");
                    }
                    Ok(Entry {
                        value,
                        fetched_at: Instant::now(),
                        stale,
                    })
                }
                Err(e) => {
                    lock(&this.inner.failures).insert(fetch_key.clone(), e.clone());
                    Err(e)
                }
            }
        };

        self.inner
            .entries
            .try_get_with(key, init)
            .await
            .map(|entry| entry.value)
            .map_err(Arc::unwrap_or_clone)
    }

    fn spawn_refresh<T, F, Fut>(&self, key: QueryKey, fetcher: Arc<F>)
    where
        T: CachedValue,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        if !lock(&self.inner.refreshing).insert(key.clone()) {
            return;
        }

        let this = self.clone();
        runtime.spawn(async move {
            let family = key.family();
            let started = this.epoch(family);
            {
                let _flight = FlightGuard::begin(&this, &key);
                match fetcher().await {
                    Ok(value) => {
                        let value = value.into_value();
                        this.settle(&key, &value);
                        if this.epoch(family) == started {
                            let entry = Entry {
                                value,
                                fetched_at: Instant::now(),
                                stale: false,
                            };
                            this.inner.entries.insert(key.clone(), entry).await;
                        }
                    }
                    Err(e) => {
                        warn!(%key, error = %e, "Background revalidation failed, keeping stale entry");
                    }
                }
            }
            lock(&this.inner.refreshing).remove(&key);
        });
    }

    /// Remove the entry for `key` only if it is still the one we saw.
    async fn evict_if_unchanged(&self, key: &QueryKey, seen: Instant) {
        self.inner
            .entries
            .entry(key.clone())
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().fetched_at == seen => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
    }

    fn settle(&self, key: &QueryKey, value: &QueryValue) {
        lock(&self.inner.failures).remove(key);
        if key.keeps_previous_data() {
            lock(&self.inner.placeholders).insert(key.operation(), value.clone());
        }
    }
}

/// Tracks one running network fetch. Dropping it, including when the
/// awaiting future is cancelled, clears the loading state.
struct FlightGuard<'a> {
    cache: &'a QueryCache,
    key: &'a QueryKey,
}

impl<'a> FlightGuard<'a> {
    fn begin(cache: &'a QueryCache, key: &'a QueryKey) -> Self {
        *lock(&cache.inner.in_flight).entry(key.clone()).or_insert(0) += 1;
        Self { cache, key }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = lock(&self.cache.inner.in_flight);
        if let Some(count) = in_flight.get_mut(self.key) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(self.key);
            }
        }
    }
}

fn decode<T: CachedValue>(key: &QueryKey, value: QueryValue) -> Result<T> {
    T::from_value(value)
        .ok_or_else(|| ApiError::Decode(format!("cached value for {key} has an unexpected shape")))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use bazaar_core::{Store, StoreId};
    use tokio::sync::Notify;

    use super::*;

    fn store(name: &str) -> Store {
        Store {
            id: StoreId::new(name),
            name: name.to_string(),
            slug: name.to_string(),
            username: String::new(),
            bio: String::new(),
            whatsapp_number: String::new(),
            email: String::new(),
            updated_at: None,
        }
    }

    fn config(stale_after: Duration, stale_policy: StalePolicy) -> CacheConfig {
        CacheConfig {
            stale_after,
            stale_policy,
            ..CacheConfig::default()
        }
    }

    /// Fetcher returning one store named after the call number.
    fn counting(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<Vec<Store>>> + Send>>
    + Send
    + Sync
    + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(vec![store(&format!("s{n}"))])
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_list(None, None);

        let (a, b) = tokio::join!(
            cache.fetch(key.clone(), counting(&calls, Duration::from_millis(50))),
            cache.fetch(key.clone(), counting(&calls, Duration::from_millis(50))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn test_fresh_entry_is_served_from_cache() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_list(None, None);

        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(cache.state::<Vec<Store>>(&key).await, QueryState::Ready(_)));
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let cache = QueryCache::new(&config(Duration::ZERO, StalePolicy::Refetch));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_list(None, None);

        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        let second = cache
            .fetch(key.clone(), counting(&calls, Duration::ZERO))
            .await
            .unwrap()
            .into_option()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second[0].name, "s2");
    }

    #[tokio::test]
    async fn test_background_revalidation_serves_stale_then_updates() {
        let cache = QueryCache::new(&config(Duration::ZERO, StalePolicy::RevalidateInBackground));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_list(None, None);

        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        let served = cache
            .fetch(key.clone(), counting(&calls, Duration::ZERO))
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(served[0].name, "s1");

        for _ in 0..100 {
            if let QueryState::Ready(stores) = cache.state::<Vec<Store>>(&key).await
                && stores[0].name == "s2"
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("background revalidation never landed");
    }

    #[tokio::test]
    async fn test_disabled_key_never_fetches() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_by_slug("  ");

        let result = cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();

        assert!(result.is_disabled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(matches!(cache.state::<Vec<Store>>(&key).await, QueryState::Disabled));
    }

    #[tokio::test]
    async fn test_invalidation_forces_refetch() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_search("shoes");

        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        cache.invalidate(&Invalidation::Family(ResourceFamily::Stores)).await;
        assert!(matches!(cache.state::<Vec<Store>>(&key).await, QueryState::Idle));
        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_of_other_family_keeps_entry() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::store_list(None, None);

        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        cache.invalidate(&Invalidation::Key(QueryKey::my_products())).await;
        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_marks_result_stale() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let key = QueryKey::store_list(None, None);

        let gated = {
            let calls = Arc::clone(&calls);
            let gate = Arc::clone(&gate);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                let gate = Arc::clone(&gate);
                async move {
                    gate.notified().await;
                    Ok(vec![store("old")])
                }
            }
        };

        let pending = tokio::spawn({
            let cache = cache.clone();
            let key = key.clone();
            async move { cache.fetch(key, gated).await }
        });
        while !cache.is_in_flight(&key) {
            tokio::task::yield_now().await;
        }
        cache.invalidate(&Invalidation::Key(key.clone())).await;
        gate.notify_one();

        let first = pending.await.unwrap().unwrap().into_option().unwrap();
        assert_eq!(first[0].name, "old");

        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_is_observable_and_not_cached() {
        let cache = QueryCache::new(&CacheConfig::default());
        let key = QueryKey::my_products();

        let err = cache
            .fetch(key.clone(), || async {
                Err::<Vec<Store>, _>(ApiError::Decode("boom".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert!(cache.state::<Vec<Store>>(&key).await.error().is_some());

        let calls = Arc::new(AtomicUsize::new(0));
        cache.fetch(key.clone(), counting(&calls, Duration::ZERO)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_placeholder_shows_previous_page_while_loading() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let page1 = QueryKey::store_list(Some(1), None);
        let page2 = QueryKey::store_list(Some(2), None);

        cache.fetch(page1, counting(&calls, Duration::ZERO)).await.unwrap();

        let pending = tokio::spawn({
            let cache = cache.clone();
            let page2 = page2.clone();
            let fetcher = counting(&calls, Duration::from_millis(100));
            async move { cache.fetch(page2, fetcher).await }
        });
        while !cache.is_in_flight(&page2) {
            tokio::task::yield_now().await;
        }

        let state = cache.state::<Vec<Store>>(&page2).await;
        assert!(state.is_loading());
        assert_eq!(state.data().unwrap()[0].name, "s1");
        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_detail_reads_have_no_placeholder() {
        let cache = QueryCache::new(&CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let first = QueryKey::store_by_vendor(&bazaar_core::VendorId::new("v1"));
        let second = QueryKey::store_by_vendor(&bazaar_core::VendorId::new("v2"));

        cache.fetch(first, counting(&calls, Duration::ZERO)).await.unwrap();

        let pending = tokio::spawn({
            let cache = cache.clone();
            let second = second.clone();
            let fetcher = counting(&calls, Duration::from_millis(100));
            async move { cache.fetch(second, fetcher).await }
        });
        while !cache.is_in_flight(&second) {
            tokio::task::yield_now().await;
        }

        let state = cache.state::<Vec<Store>>(&second).await;
        assert!(state.is_loading());
        assert!(state.data().is_none());
        pending.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let cache = QueryCache::new(&CacheConfig::default());
        let key = QueryKey::pending_vendors();

        cache
            .fetch(key.clone(), || async { Ok(Vec::<bazaar_core::Vendor>::new()) })
            .await
            .unwrap();
        cache.clear();

        assert!(matches!(
            cache.state::<Vec<bazaar_core::Vendor>>(&key).await,
            QueryState::Idle
        ));
    }
}
