//! Session configuration

use crate::model::page_count_for;

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination settings shared by the page cache, the navigator and bulk walks.
///
/// # Example
///
/// ```
/// use artsel_lib::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_page_size(25)
///     .with_page_ceiling(40);
///
/// assert_eq!(config.page_size, 25);
/// assert_eq!(config.effective_ceiling(Some(10_000)), Some(40));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Rows per page.
    ///
    /// Default: 10
    pub page_size: u32,

    /// Highest page index a navigation or bulk walk may visit.
    ///
    /// Default: unbounded (walks stop at the reported total or a short page)
    pub page_ceiling: Option<u32>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_ceiling: None,
        }
    }
}

impl SessionConfig {
    /// Creates a new session config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size. Zero is clamped to one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the page ceiling.
    pub fn with_page_ceiling(mut self, ceiling: u32) -> Self {
        self.page_ceiling = Some(ceiling);
        self
    }

    /// Removes the page ceiling.
    pub fn unbounded(mut self) -> Self {
        self.page_ceiling = None;
        self
    }

    /// Combines the configured ceiling with the enumeration window of a source.
    ///
    /// A source that refuses to page past `max_records` caps the ceiling at
    /// `max_records / page_size` pages.
    pub fn effective_ceiling(&self, max_records: Option<u64>) -> Option<u32> {
        let window = max_records
            .map(|max| u32::try_from(max / u64::from(self.page_size.max(1))).unwrap_or(u32::MAX));
        match (self.page_ceiling, window) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the number of pages needed for `total` records under this config.
    pub fn pages_for(&self, total: u64) -> u32 {
        page_count_for(total, self.page_size)
    }
}
