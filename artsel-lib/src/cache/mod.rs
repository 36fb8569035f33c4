//! Page response caching
//!
//! Provides a `CacheProvider` trait and an in-memory implementation holding
//! serialized pages with a TTL. Used by [`CachedSource`](crate::source::CachedSource)
//! so repeated bulk walks do not re-fetch pages that were just seen. Nothing
//! here outlives the process.

mod config;
mod memory;

pub use config::*;
pub use memory::*;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

/// A cached value with metadata about when it was cached and when it expires.
#[derive(Debug, Clone)]
pub struct CachedValue {
    /// The cached data, serialized with bincode.
    pub data: Vec<u8>,
    /// When this value was cached.
    pub created_at: DateTime<Utc>,
    /// When this value expires and should no longer be returned.
    pub expires_at: DateTime<Utc>,
}

impl CachedValue {
    /// Creates a new cached value with a TTL from now.
    pub fn with_ttl(data: Vec<u8>, ttl: std::time::Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        Self {
            data,
            created_at: now,
            expires_at,
        }
    }

    /// Returns `true` if this cached value has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns how long ago this value was stored.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }
}

/// Trait for cache providers.
///
/// Implementations store and retrieve cached values by string keys and must
/// never return expired values from `get()`.
///
/// # Example
///
/// ```ignore
/// use artsel_lib::cache::{CacheProvider, CachedValue, InMemoryCache};
/// use std::time::Duration;
///
/// let cache = InMemoryCache::new();
/// cache.set("page:1:10", CachedValue::with_ttl(bytes, Duration::from_secs(60))).await;
///
/// if let Some(cached) = cache.get("page:1:10").await {
///     println!("{} bytes", cached.data.len());
/// }
/// ```
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Retrieves a cached value by key, `None` if missing or expired.
    async fn get(&self, key: &str) -> Option<CachedValue>;

    /// Stores a value in the cache.
    async fn set(&self, key: &str, value: CachedValue);

    /// Removes a value from the cache.
    async fn remove(&self, key: &str);

    /// Clears all values from the cache.
    async fn clear(&self);

    /// Removes all expired entries and returns how many were removed.
    async fn gc(&self) -> usize;
}
