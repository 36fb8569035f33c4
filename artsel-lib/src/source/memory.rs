//! In-memory collection source

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use dashmap::DashSet;

use super::RemoteCollectionSource;
use crate::error::FetchError;
use crate::model::CollectionItem;
use crate::model::Page;

/// A source serving a fixed `Vec` in pages.
///
/// Useful for tests and offline demos. Pages can be made to fail on demand,
/// and every fetch is recorded.
///
/// # Example
///
/// ```
/// use artsel_lib::model::Artwork;
/// use artsel_lib::source::InMemorySource;
///
/// let items = (1..=25).map(|id| Artwork::new(id, format!("Artwork {id}"))).collect();
/// let source = InMemorySource::new(items).without_total();
///
/// source.fail_page(3);
/// assert_eq!(source.fetch_count(), 0);
/// ```
#[derive(Debug)]
pub struct InMemorySource<T> {
    items: Vec<T>,
    report_total: bool,
    max_records: Option<u64>,
    failing: DashSet<u32>,
    fetches: AtomicUsize,
    history: Mutex<Vec<u32>>,
}

impl<T: CollectionItem> InMemorySource<T> {
    /// Creates a source over `items` that reports the collection total.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            report_total: true,
            max_records: None,
            failing: DashSet::new(),
            fetches: AtomicUsize::new(0),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Stops reporting the collection total with each page.
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    /// Refuses to serve records past `max_records`, like the artwork API does.
    pub fn with_max_records(mut self, max_records: u64) -> Self {
        self.max_records = Some(max_records);
        self
    }

    /// Makes every fetch of `page_index` fail with HTTP 503.
    pub fn fail_page(&self, page_index: u32) {
        self.failing.insert(page_index);
    }

    /// Lets `page_index` succeed again.
    pub fn heal_page(&self, page_index: u32) {
        self.failing.remove(&page_index);
    }

    /// Returns the number of fetches attempted so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Returns the page indices fetched so far, in request order.
    pub fn fetched_pages(&self) -> Vec<u32> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Returns the number of items held.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the source holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T: CollectionItem> RemoteCollectionSource for InMemorySource<T> {
    type Item = T;

    async fn fetch_page(&self, page_index: u32, page_size: u32) -> Result<Page<T>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut history) = self.history.lock() {
            history.push(page_index);
        }

        if page_index == 0 || page_size == 0 {
            return Err(FetchError::http(
                400,
                format!("invalid page request: page={page_index} limit={page_size}"),
            ));
        }
        if self.failing.contains(&page_index) {
            return Err(FetchError::http(503, format!("page {page_index} unavailable")));
        }

        let start = (page_index as usize - 1).saturating_mul(page_size as usize);
        if let Some(max) = self.max_records
            && start as u64 >= max
        {
            return Err(FetchError::http(
                403,
                format!("pagination window of {max} records exceeded"),
            ));
        }

        let end = start.saturating_add(page_size as usize).min(self.items.len());
        let items = self.items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

        let page = Page::new(page_index, items);
        Ok(if self.report_total {
            page.with_total_count(self.items.len() as u64)
        } else {
            page
        })
    }

    fn max_records(&self) -> Option<u64> {
        self.max_records
    }
}
