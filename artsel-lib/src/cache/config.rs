//! Cache configuration

use std::time::Duration;

/// TTL and size settings for cached pages.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use artsel_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default().with_page_ttl(Duration::from_secs(30));
/// assert!(config.is_enabled());
/// assert!(!CacheConfig::no_cache().is_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched page may be served without asking the source again.
    ///
    /// Default: 2 minutes
    pub page_ttl: Duration,

    /// Most pages kept at once; the oldest stored page is dropped first.
    ///
    /// Default: 32
    pub max_pages: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_ttl: Duration::from_secs(120),
            max_pages: 32,
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page TTL.
    pub fn with_page_ttl(mut self, ttl: Duration) -> Self {
        self.page_ttl = ttl;
        self
    }

    /// Sets how many pages may be stored at once.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Creates a config that never stores anything.
    pub fn no_cache() -> Self {
        Self {
            page_ttl: Duration::ZERO,
            max_pages: 0,
        }
    }

    /// Returns `true` if pages are stored at all.
    pub fn is_enabled(&self) -> bool {
        !self.page_ttl.is_zero() && self.max_pages > 0
    }
}
