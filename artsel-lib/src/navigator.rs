//! Page navigation

use std::sync::Arc;

use crate::PageCache;
use crate::error::Error;
use crate::model::Page;
use crate::source::RemoteCollectionSource;

type ItemOf<S> = <S as RemoteCollectionSource>::Item;

/// Turns page-change requests into fetches against the [`PageCache`].
///
/// The current page only moves when a fetch succeeds; on error the previous
/// page and pagination stay in place and the error is returned.
///
/// # Example
///
/// ```ignore
/// let navigator = PageNavigator::new(pages.clone());
///
/// navigator.first().await?;
/// let page = navigator.next().await?;
/// assert_eq!(page.index(), 2);
/// ```
pub struct PageNavigator<S: RemoteCollectionSource> {
    pages: PageCache<S>,
}

impl<S: RemoteCollectionSource> Clone for PageNavigator<S> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
        }
    }
}

impl<S: RemoteCollectionSource> PageNavigator<S> {
    /// Creates a navigator driving `pages`.
    pub fn new(pages: PageCache<S>) -> Self {
        Self { pages }
    }

    /// Returns the page cache this navigator drives.
    pub fn pages(&self) -> &PageCache<S> {
        &self.pages
    }

    /// Returns the index of the page on screen, if any.
    pub fn current_index(&self) -> Option<u32> {
        self.pages.pagination().map(|state| state.current_page)
    }

    /// Loads page `page_index` (1-based) and makes it current.
    pub async fn go_to(&self, page_index: u32) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        self.check(page_index)?;
        log::debug!("navigating to page {page_index}");
        self.pages.load(page_index).await
    }

    fn check(&self, page_index: u32) -> Result<(), Error> {
        if page_index == 0 {
            return Err(Error::invalid("page indices start at 1"));
        }
        if let Some(ceiling) = self.pages.page_ceiling()
            && page_index > ceiling
        {
            return Err(Error::invalid(format!(
                "page {page_index} is past the last reachable page {ceiling}"
            )));
        }
        Ok(())
    }

    /// Loads the first page.
    pub async fn first(&self) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        self.go_to(1).await
    }

    /// Loads the page after the current one (the first page if none is loaded).
    pub async fn next(&self) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        match self.pages.pagination() {
            None => self.first().await,
            Some(state) if state.is_last() => Err(Error::invalid(format!(
                "page {} is the last page",
                state.current_page
            ))),
            Some(state) => self.go_to(state.current_page + 1).await,
        }
    }

    /// Loads the page before the current one.
    pub async fn previous(&self) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        match self.pages.pagination() {
            None => self.first().await,
            Some(state) if state.is_first() => Err(Error::invalid("already on the first page")),
            Some(state) => self.go_to(state.current_page - 1).await,
        }
    }

    /// Loads the last reachable page.
    ///
    /// Needs either a reported total or a page ceiling; loads page 1 first
    /// when nothing is on screen yet.
    pub async fn last(&self) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        let state = match self.pages.pagination() {
            Some(state) => state,
            None => {
                self.first().await?;
                self.pages
                    .pagination()
                    .ok_or_else(|| Error::invalid("no page loaded"))?
            }
        };

        match state.last_page() {
            Some(last) => self.go_to(last).await,
            None => Err(Error::invalid(
                "the source reports no total; the last page is unknown",
            )),
        }
    }

    /// Fetches the current page again from the remote collection (page 1
    /// if none is loaded), bypassing any page cache in the source.
    pub async fn reload(&self) -> Result<Arc<Page<ItemOf<S>>>, Error> {
        let page_index = self.current_index().unwrap_or(1);
        self.check(page_index)?;
        log::debug!("reloading page {page_index}");
        self.pages.refresh(page_index).await
    }
}
