//! Caching decorator for collection sources

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RemoteCollectionSource;
use crate::cache::CacheConfig;
use crate::cache::CacheProvider;
use crate::cache::CachedValue;
use crate::error::FetchError;
use crate::model::Page;

/// Serves recently fetched pages from a [`CacheProvider`].
///
/// Pages are keyed by index and size and stored bincode-encoded with the
/// configured TTL. At most `max_pages` pages are kept: storing one more drops
/// the oldest, and expired entries are collected on every store. Failed
/// fetches are never cached.
///
/// # Example
///
/// ```ignore
/// use artsel_lib::cache::{CacheConfig, InMemoryCache};
/// use artsel_lib::source::{ArticSource, CachedSource};
///
/// let source = CachedSource::new(
///     ArticSource::builder().build()?,
///     InMemoryCache::new(),
///     CacheConfig::default(),
/// );
/// ```
pub struct CachedSource<S, C> {
    source: S,
    cache: C,
    config: CacheConfig,
    /// Keys currently stored, oldest first.
    stored: Mutex<VecDeque<String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S, C> CachedSource<S, C>
where
    S: RemoteCollectionSource,
    C: CacheProvider,
{
    /// Wraps `source` with `cache`.
    pub fn new(source: S, cache: C, config: CacheConfig) -> Self {
        Self {
            source,
            cache,
            config,
            stored: Mutex::new(VecDeque::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the wrapped source.
    pub fn inner(&self) -> &S {
        &self.source
    }

    /// Drops every cached page.
    pub async fn invalidate(&self) {
        self.lock_stored().clear();
        self.cache.clear().await;
    }

    /// Returns the number of pages currently stored.
    pub fn stored_pages(&self) -> usize {
        self.lock_stored().len()
    }

    /// Returns `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn key(page_index: u32, page_size: u32) -> String {
        format!("page:{page_index}:{page_size}")
    }

    /// Stores `data` under `key` and drops the oldest pages past `max_pages`.
    async fn store(&self, key: String, data: Vec<u8>) {
        self.cache
            .set(&key, CachedValue::with_ttl(data, self.config.page_ttl))
            .await;

        let evicted: Vec<String> = {
            let mut stored = self.lock_stored();
            stored.retain(|k| *k != key);
            stored.push_back(key);
            let excess = stored.len().saturating_sub(self.config.max_pages);
            stored.drain(..excess).collect()
        };
        for key in &evicted {
            self.cache.remove(key).await;
        }

        let expired = self.cache.gc().await;
        if expired > 0 || !evicted.is_empty() {
            log::debug!("page cache dropped {} evicted, {expired} expired", evicted.len());
        }
    }

    fn forget(&self, key: &str) {
        self.lock_stored().retain(|k| k != key);
    }

    fn lock_stored(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.stored.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<S, C> RemoteCollectionSource for CachedSource<S, C>
where
    S: RemoteCollectionSource,
    S::Item: Serialize + DeserializeOwned,
    C: CacheProvider,
{
    type Item = S::Item;

    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<Self::Item>, FetchError> {
        let key = Self::key(page_index, page_size);

        if self.config.is_enabled()
            && let Some(cached) = self.cache.get(&key).await
        {
            match bincode::deserialize::<Page<Self::Item>>(&cached.data) {
                Ok(page) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    log::debug!("page {page_index} served from cache");
                    return Ok(page);
                }
                Err(e) => {
                    log::warn!("dropping undecodable cache entry {key}: {e}");
                    self.forget(&key);
                    self.cache.remove(&key).await;
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let page = self.source.fetch_page(page_index, page_size).await?;

        if self.config.is_enabled() {
            match bincode::serialize(&page) {
                Ok(data) => self.store(key, data).await,
                Err(e) => log::warn!("could not cache page {page_index}: {e}"),
            }
        }

        Ok(page)
    }

    fn max_records(&self) -> Option<u64> {
        self.source.max_records()
    }

    async fn forget_page(&self, page_index: u32, page_size: u32) {
        let key = Self::key(page_index, page_size);
        self.forget(&key);
        self.cache.remove(&key).await;
        self.source.forget_page(page_index, page_size).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::cache::InMemoryCache;
    use crate::model::Artwork;
    use crate::source::InMemorySource;

    fn cached(config: CacheConfig) -> CachedSource<InMemorySource<Artwork>, InMemoryCache> {
        let items = (1..=30)
            .map(|id| Artwork {
                inscriptions: Some(format!("inscription {id}")),
                ..Artwork::new(id, format!("Artwork {id}"))
            })
            .collect();
        CachedSource::new(InMemorySource::new(items), InMemoryCache::new(), config)
    }

    #[tokio::test]
    async fn test_second_fetch_hits_cache() {
        let source = cached(CacheConfig::default());

        let first = source.fetch_page(2, 10).await.unwrap();
        let second = source.fetch_page(2, 10).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner().fetch_count(), 1);
        assert_eq!(source.stats(), (1, 1));
    }

    #[tokio::test]
    async fn test_page_size_is_part_of_key() {
        let source = cached(CacheConfig::default());

        source.fetch_page(1, 10).await.unwrap();
        let bigger = source.fetch_page(1, 20).await.unwrap();

        assert_eq!(bigger.len(), 20);
        assert_eq!(source.inner().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_fetches() {
        let source = cached(CacheConfig::no_cache());

        source.fetch_page(1, 10).await.unwrap();
        source.fetch_page(1, 10).await.unwrap();

        assert_eq!(source.inner().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let source = cached(CacheConfig::default());
        source.inner().fail_page(3);
        assert!(source.fetch_page(3, 10).await.is_err());

        source.inner().heal_page(3);
        let page = source.fetch_page(3, 10).await.unwrap();
        assert_eq!(page.keys().next(), Some(21));
    }

    #[tokio::test]
    async fn test_oldest_page_is_dropped_past_max_pages() {
        let source = CachedSource::new(
            InMemorySource::new((1..=100).map(|id| Artwork::new(id, "x")).collect()),
            InMemoryCache::new(),
            CacheConfig::default().with_max_pages(3),
        );

        for index in 1..=10 {
            source.fetch_page(index, 10).await.unwrap();
        }
        assert_eq!(source.stored_pages(), 3);
        assert_eq!(source.cache.len(), 3);

        // Pages 8 to 10 are still held, page 1 is fetched again.
        source.fetch_page(10, 10).await.unwrap();
        source.fetch_page(1, 10).await.unwrap();
        assert_eq!(source.inner().fetch_count(), 11);
        assert_eq!(source.cache.len(), 3);
    }

    #[tokio::test]
    async fn test_expired_pages_are_collected_on_store() {
        let source = cached(CacheConfig::default().with_page_ttl(Duration::from_millis(1)));

        source.fetch_page(1, 10).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        source.fetch_page(2, 10).await.unwrap();

        assert_eq!(source.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_forget_page_forces_refetch() {
        let source = cached(CacheConfig::default());
        source.fetch_page(2, 10).await.unwrap();

        source.forget_page(2, 10).await;
        source.fetch_page(2, 10).await.unwrap();

        assert_eq!(source.inner().fetch_count(), 2);
        assert_eq!(source.stored_pages(), 1);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let source = cached(CacheConfig::default());
        source.fetch_page(1, 10).await.unwrap();
        source.invalidate().await;
        source.fetch_page(1, 10).await.unwrap();
        assert_eq!(source.inner().fetch_count(), 2);
    }
}
