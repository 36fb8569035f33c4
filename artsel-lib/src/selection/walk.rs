//! Async iterator over collection pages for bulk operations.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::PageCache;
use crate::error::Error;
use crate::model::Page;
use crate::model::page_count_for;
use crate::source::RemoteCollectionSource;

/// Walks pages `1, 2, ...` in collection order, one fetch per step.
///
/// Bulk operations read pages by explicit index, so navigating while a walk
/// is in flight does not disturb it. The page currently held by the
/// [`PageCache`] is reused instead of fetched again when its index comes up.
///
/// The walk ends at the first of: the page ceiling, the last page implied by
/// the reported total, a short or empty page, a fetch error, or cancellation
/// (checked before every fetch).
pub struct PageWalk<'a, S: RemoteCollectionSource> {
    cache: &'a PageCache<S>,
    cancel: CancellationToken,
    /// The next page index to visit.
    next_index: u32,
    /// Last page index to visit, once known.
    last_index: Option<u32>,
    /// Pages yielded so far.
    walked: u32,
    done: bool,
    cancelled: bool,
}

impl<'a, S: RemoteCollectionSource> PageWalk<'a, S> {
    /// Starts a walk at page 1.
    pub fn new(cache: &'a PageCache<S>, cancel: CancellationToken) -> Self {
        Self {
            cache,
            cancel,
            next_index: 1,
            last_index: cache.page_ceiling(),
            walked: 0,
            done: false,
            cancelled: false,
        }
    }

    /// Fetches the next page.
    ///
    /// Returns `None` once the walk is exhausted or cancelled. After an error
    /// is yielded the walk is finished.
    pub async fn next(&mut self) -> Option<Result<Arc<Page<S::Item>>, Error>> {
        if self.done {
            return None;
        }

        if self.cancel.is_cancelled() {
            log::info!("page walk cancelled before page {}", self.next_index);
            self.done = true;
            self.cancelled = true;
            return None;
        }

        if let Some(last) = self.last_index
            && self.next_index > last
        {
            self.done = true;
            return None;
        }

        let index = self.next_index;
        let page = match self.cache.peek(index) {
            Some(page) => {
                log::debug!("page walk reusing held page {index}");
                page
            }
            None => {
                let page_size = self.cache.page_size();
                match self.cache.source().fetch_page(index, page_size).await {
                    Ok(page) => Arc::new(page),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(Error::Fetch(e)));
                    }
                }
            }
        };

        self.narrow(&page);
        if page.is_empty() {
            self.done = true;
            return None;
        }

        self.next_index += 1;
        self.walked += 1;
        Some(Ok(page))
    }

    /// Returns `true` if the walk stopped because of cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Returns the number of pages yielded so far.
    pub fn pages_walked(&self) -> u32 {
        self.walked
    }

    /// Tightens `last_index` with what `page` reveals about the collection.
    fn narrow(&mut self, page: &Page<S::Item>) {
        let page_size = self.cache.page_size();

        if let Some(total) = page.total_count() {
            self.cap_last(page_count_for(total, page_size));
        }
        if (page.len() as u64) < u64::from(page_size) {
            self.cap_last(page.index());
        }
    }

    fn cap_last(&mut self, last: u32) {
        self.last_index = Some(self.last_index.map_or(last, |current| current.min(last)));
    }
}
