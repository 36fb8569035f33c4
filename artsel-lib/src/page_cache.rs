//! Holder for the page currently on screen

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::SessionConfig;
use crate::error::Error;
use crate::model::Page;
use crate::model::PaginationState;
use crate::source::RemoteCollectionSource;

type ItemOf<S> = <S as RemoteCollectionSource>::Item;

/// Holds exactly one page and its pagination metadata.
///
/// Cheap to clone; clones share the held page. Loads are ordered
/// last-fetch-wins: a fetch that completes after a newer one has already been
/// installed is discarded and the newer page is returned instead.
///
/// # Example
///
/// ```ignore
/// let cache = PageCache::new(Arc::new(source), SessionConfig::default());
///
/// let page = cache.load(1).await?;
/// assert_eq!(cache.current().map(|p| p.index()), Some(1));
/// ```
pub struct PageCache<S: RemoteCollectionSource> {
    inner: Arc<PageCacheInner<S>>,
}

struct PageCacheInner<S: RemoteCollectionSource> {
    source: Arc<S>,
    config: SessionConfig,
    page_ceiling: Option<u32>,
    /// Last ticket handed out to a `load` call.
    tickets: AtomicU64,
    slot: RwLock<Slot<ItemOf<S>>>,
}

struct Slot<T> {
    page: Option<Arc<Page<T>>>,
    pagination: Option<PaginationState>,
    /// Ticket of the load that installed `page`.
    ticket: u64,
}

impl<S: RemoteCollectionSource> Clone for PageCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RemoteCollectionSource> PageCache<S> {
    /// Creates an empty cache over `source`.
    pub fn new(source: Arc<S>, config: SessionConfig) -> Self {
        let page_ceiling = config.effective_ceiling(source.max_records());
        Self {
            inner: Arc::new(PageCacheInner {
                source,
                config,
                page_ceiling,
                tickets: AtomicU64::new(0),
                slot: RwLock::new(Slot {
                    page: None,
                    pagination: None,
                    ticket: 0,
                }),
            }),
        }
    }

    /// Fetches `page_index`, replaces the held page and returns it.
    ///
    /// On failure the held page and pagination are left untouched. If a newer
    /// load finished first, the newer page stays and is returned.
    pub async fn load(&self, page_index: u32) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        if page_index == 0 {
            return Err(Error::invalid("page indices start at 1"));
        }

        let ticket = self.inner.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let page = self
            .inner
            .source
            .fetch_page(page_index, self.page_size())
            .await
            .inspect_err(|e| log::warn!("loading page {page_index} failed: {e}"))?;

        Ok(self.install(page, ticket))
    }

    /// Like [`load`](Self::load), but first asks the source to drop any
    /// locally kept copy so the page comes from the remote collection.
    pub async fn refresh(&self, page_index: u32) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        self.inner
            .source
            .forget_page(page_index, self.page_size())
            .await;
        self.load(page_index).await
    }

    /// Returns the held page without fetching.
    pub fn current(&self) -> Option<Arc<Page<ItemOf<S>>>> {
        self.read_slot(|slot| slot.page.clone())
    }

    /// Returns the held page if it is page `page_index`.
    pub fn peek(&self, page_index: u32) -> Option<Arc<Page<ItemOf<S>>>> {
        self.read_slot(|slot| {
            slot.page
                .as_ref()
                .filter(|page| page.index() == page_index)
                .cloned()
        })
    }

    /// Returns pagination metadata of the held page.
    pub fn pagination(&self) -> Option<PaginationState> {
        self.read_slot(|slot| slot.pagination)
    }

    /// Returns the configured page size.
    pub fn page_size(&self) -> u32 {
        self.inner.config.page_size
    }

    /// Returns the highest page index reachable, combining the configured
    /// ceiling with the source's enumeration window.
    pub fn page_ceiling(&self) -> Option<u32> {
        self.inner.page_ceiling
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Returns the source pages are fetched from.
    pub fn source(&self) -> &Arc<S> {
        &self.inner.source
    }

    fn install(&self, page: Page<ItemOf<S>>, ticket: u64) -> Arc<Page<ItemOf<S>>> {
        let page = Arc::new(page);
        let mut slot = self
            .inner
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if ticket > slot.ticket {
            slot.pagination = Some(PaginationState::from_page(
                &page,
                self.page_size(),
                self.inner.page_ceiling,
            ));
            slot.page = Some(Arc::clone(&page));
            slot.ticket = ticket;
            log::debug!("installed page {} ({} items)", page.index(), page.len());
            page
        } else {
            log::debug!(
                "discarding stale page {} (ticket {ticket} < {})",
                page.index(),
                slot.ticket
            );
            slot.page.clone().unwrap_or(page)
        }
    }

    fn read_slot<R>(&self, f: impl FnOnce(&Slot<ItemOf<S>>) -> R) -> R {
        let slot = self.inner.slot.read().unwrap_or_else(PoisonError::into_inner);
        f(&slot)
    }
}
