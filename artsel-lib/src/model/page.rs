//! Page and pagination types.

use serde::Deserialize;
use serde::Serialize;

use super::CollectionItem;

/// One fetched slice of the collection.
///
/// Pages are replaced wholesale on every navigation and never patched.
/// Page indices are 1-based.
///
/// # Example
///
/// ```
/// use artsel_lib::model::{Artwork, Page};
///
/// let page = Page::new(1, vec![Artwork::new(7, "Nighthawks")]).with_total_count(120);
///
/// assert_eq!(page.index(), 1);
/// assert_eq!(page.len(), 1);
/// assert_eq!(page.total_count(), Some(120));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    index: u32,
    items: Vec<T>,
    /// Collection total as reported by the source alongside this page.
    total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Creates a new page without a reported total.
    pub fn new(index: u32, items: Vec<T>) -> Self {
        Self {
            index,
            items,
            total_count: None,
        }
    }

    /// Sets the total record count reported by the source.
    pub fn with_total_count(mut self, count: u64) -> Self {
        self.total_count = Some(count);
        self
    }

    /// Returns the 1-based page index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the items in collection order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Consumes the page and returns the items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Returns the total record count, if the source reported one.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Returns `true` if this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T: CollectionItem> Page<T> {
    /// Returns the keys of this page in order.
    pub fn keys(&self) -> impl Iterator<Item = T::Key> + '_ {
        self.items.iter().map(CollectionItem::key)
    }

    /// Returns `true` if an item with `key` is on this page.
    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.items.iter().any(|item| &item.key() == key)
    }
}

/// Pagination metadata for the page currently held by the [`PageCache`](crate::PageCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// 1-based index of the held page.
    pub current_page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total record count. Taken from the source when reported, otherwise
    /// `page_size * page_ceiling`; may be an upper bound.
    pub total_records: u64,
    /// Whether `total_records` came from the source.
    pub total_reported: bool,
    /// Highest page index a walk or navigation will visit, if bounded.
    pub page_ceiling: Option<u32>,
    /// Whether a page after the held one is reachable.
    pub has_more: bool,
}

impl PaginationState {
    /// Derives pagination metadata from a freshly fetched page.
    pub fn from_page<T>(page: &Page<T>, page_size: u32, page_ceiling: Option<u32>) -> Self {
        let seen = u64::from(page.index().saturating_sub(1)) * u64::from(page_size)
            + page.len() as u64;
        let total_records = match (page.total_count(), page_ceiling) {
            (Some(total), _) => total,
            (None, Some(ceiling)) => u64::from(ceiling) * u64::from(page_size),
            // Nothing better than what has been seen so far.
            (None, None) => seen,
        };

        let below_ceiling = page_ceiling.is_none_or(|ceiling| page.index() < ceiling);
        let has_more = below_ceiling
            && match page.total_count() {
                Some(total) => u64::from(page.index()) * u64::from(page_size) < total,
                None => page.len() as u64 >= u64::from(page_size),
            };

        Self {
            current_page: page.index(),
            page_size,
            total_records,
            total_reported: page.total_count().is_some(),
            page_ceiling,
            has_more,
        }
    }

    /// Returns the number of pages the collection spans, capped at the ceiling.
    pub fn page_count(&self) -> u32 {
        let pages = page_count_for(self.total_records, self.page_size);
        match self.page_ceiling {
            Some(ceiling) => pages.min(ceiling),
            None => pages,
        }
    }

    /// Returns the index of the last reachable page, if it can be known
    /// without walking.
    pub fn last_page(&self) -> Option<u32> {
        if self.total_reported || self.page_ceiling.is_some() {
            Some(self.page_count().max(1))
        } else if !self.has_more {
            Some(self.current_page)
        } else {
            None
        }
    }

    /// Returns the number of records reachable within the page ceiling.
    pub fn reachable_records(&self) -> u64 {
        match self.page_ceiling {
            Some(ceiling) => self
                .total_records
                .min(u64::from(ceiling) * u64::from(self.page_size)),
            None => self.total_records,
        }
    }

    /// Returns `true` if the held page is the first one.
    pub fn is_first(&self) -> bool {
        self.current_page <= 1
    }

    /// Returns `true` if no page after the held one is reachable.
    pub fn is_last(&self) -> bool {
        !self.has_more
    }
}

/// Number of pages of `page_size` needed to hold `total` records.
pub(crate) fn page_count_for(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
