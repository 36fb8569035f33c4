//! Selection synchronization across pages
//!
//! The [`SelectionSynchronizer`] owns the set of selected items for the whole
//! collection. The per-page selection a table shows is always derived from it
//! by intersecting with the keys of the loaded page.

mod state;
mod walk;

pub use state::*;
pub use walk::PageWalk;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;

use tokio_util::sync::CancellationToken;

use crate::PageCache;
use crate::error::Error;
use crate::model::CollectionItem;
use crate::model::Page;
use crate::source::RemoteCollectionSource;

type ItemOf<S> = <S as RemoteCollectionSource>::Item;
type KeyOf<S> = <ItemOf<S> as CollectionItem>::Key;

/// Keeps a selection consistent with a paginated remote collection.
///
/// Cheap to clone; clones share the same selection. Only one bulk operation
/// ([`select_first_n`](Self::select_first_n), [`select_all`](Self::select_all),
/// [`clear_all`](Self::clear_all)) may run at a time: a second request is
/// rejected with [`Error::OperationInProgress`], never queued. Per-page
/// operations and reads are always allowed.
///
/// # Example
///
/// ```ignore
/// let pages = PageCache::new(Arc::new(source), SessionConfig::default());
/// let selection = SelectionSynchronizer::new(pages.clone());
///
/// let outcome = selection.select_first_n(15).await?;
/// assert_eq!(selection.selected_count(), 15);
///
/// let page = pages.load(2).await?;
/// let shown = selection.visible_selection(&page);
/// ```
pub struct SelectionSynchronizer<S: RemoteCollectionSource> {
    inner: Arc<SyncInner<S>>,
}

struct SyncInner<S: RemoteCollectionSource> {
    pages: PageCache<S>,
    selection: RwLock<HashMap<KeyOf<S>, ItemOf<S>>>,
    bulk: Mutex<Option<BulkSlot>>,
}

/// The bulk operation currently in flight.
struct BulkSlot {
    operation: BulkOperation,
    token: CancellationToken,
    pages_done: u32,
}

impl<S: RemoteCollectionSource> Clone for SelectionSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RemoteCollectionSource> SelectionSynchronizer<S> {
    /// Creates an empty selection over the pages served by `pages`.
    pub fn new(pages: PageCache<S>) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                pages,
                selection: RwLock::new(HashMap::new()),
                bulk: Mutex::new(None),
            }),
        }
    }

    /// Returns the page cache this synchronizer reads from.
    pub fn pages(&self) -> &PageCache<S> {
        &self.inner.pages
    }

    // =========================================================================
    // Per-page operations
    // =========================================================================

    /// Reconciles the selection with the complete set of keys chosen on `page`.
    ///
    /// Every item of `page` whose key is in `chosen` is selected (and its
    /// stored item refreshed); every other item of `page` is deselected. Keys
    /// of other pages are never touched and keys in `chosen` that are not on
    /// `page` are ignored.
    pub fn toggle_on_current_page(
        &self,
        page: &Page<ItemOf<S>>,
        chosen: &HashSet<KeyOf<S>>,
    ) -> PageDelta<KeyOf<S>> {
        let mut delta = PageDelta::default();
        let mut selection = self.write_selection();

        for item in page.items() {
            let key = item.key();
            if chosen.contains(&key) {
                if selection.insert(key.clone(), item.clone()).is_none() {
                    delta.selected.push(key);
                }
            } else if selection.remove(&key).is_some() {
                delta.deselected.push(key);
            }
        }

        log::debug!(
            "page {}: {} selected, {} deselected",
            page.index(),
            delta.selected.len(),
            delta.deselected.len()
        );
        delta
    }

    /// Returns the keys of `page` that are selected.
    pub fn visible_selection(&self, page: &Page<ItemOf<S>>) -> HashSet<KeyOf<S>> {
        let selection = self.read_selection();
        page.keys().filter(|key| selection.contains_key(key)).collect()
    }

    /// Returns the state of the page's "select all" checkbox.
    pub fn header_state(&self, page: &Page<ItemOf<S>>) -> HeaderState {
        HeaderState::from_counts(self.visible_selection(page).len(), page.len())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the number of selected items across the whole collection.
    pub fn selected_count(&self) -> usize {
        self.read_selection().len()
    }

    /// Returns `true` if the item with `key` is selected.
    pub fn is_selected(&self, key: &KeyOf<S>) -> bool {
        self.read_selection().contains_key(key)
    }

    /// Returns the selected keys, in no particular order.
    pub fn selected_keys(&self) -> Vec<KeyOf<S>> {
        self.read_selection().keys().cloned().collect()
    }

    /// Returns clones of the selected items, in no particular order.
    pub fn selected_items(&self) -> Vec<ItemOf<S>> {
        self.read_selection().values().cloned().collect()
    }

    /// Returns what the synchronizer is doing right now.
    pub fn state(&self) -> SyncState {
        match self.lock_bulk().as_ref() {
            None => SyncState::Idle,
            Some(slot) => SyncState::Fetching {
                operation: slot.operation,
                pages_done: slot.pages_done,
                cancelling: slot.token.is_cancelled(),
            },
        }
    }

    // =========================================================================
    // Bulk operations
    // =========================================================================

    /// Ensures the first `n` items of the collection are selected.
    ///
    /// Walks pages from 1 in order and stops fetching as soon as `n` items
    /// have been walked, or when the page ceiling or the end of the collection
    /// is reached. Existing selections are never removed, so calling this
    /// twice with the same `n` changes nothing the second time.
    ///
    /// A fetch error aborts the walk; items from pages already walked stay
    /// selected.
    pub async fn select_first_n(&self, n: usize) -> Result<BulkOutcome, Error> {
        if n == 0 {
            return Err(Error::invalid("select count must be greater than zero"));
        }
        self.select_prefix(BulkOperation::SelectFirstN(n), Some(n))
            .await
    }

    /// Selects every item up to the page ceiling.
    ///
    /// A fetch error aborts the walk; items from pages already walked stay
    /// selected.
    pub async fn select_all(&self) -> Result<BulkOutcome, Error> {
        self.select_prefix(BulkOperation::SelectAll, None).await
    }

    /// Empties the selection.
    ///
    /// No page is fetched: the selection is discarded and recreated, which
    /// also drops keys from pages no walk would reach any more.
    pub fn clear_all(&self) -> Result<BulkOutcome, Error> {
        let guard = self.begin(BulkOperation::ClearAll)?;

        let removed = {
            let mut selection = self.write_selection();
            let removed = selection.len();
            *selection = HashMap::new();
            removed
        };
        drop(guard);

        log::info!("cleared selection ({removed} items)");
        Ok(BulkOutcome {
            removed,
            ..BulkOutcome::new(BulkOperation::ClearAll)
        })
    }

    /// Requests cancellation of the running bulk operation.
    ///
    /// The walk stops before its next fetch; pages already applied stay
    /// applied. Returns `false` if nothing was running.
    pub fn cancel(&self) -> bool {
        match self.lock_bulk().as_ref() {
            Some(slot) => {
                log::info!("cancelling {}", slot.operation);
                slot.token.cancel();
                true
            }
            None => false,
        }
    }

    async fn select_prefix(
        &self,
        operation: BulkOperation,
        limit: Option<usize>,
    ) -> Result<BulkOutcome, Error> {
        let guard = self.begin(operation)?;
        let mut outcome = BulkOutcome::new(operation);
        let mut remaining = limit;
        let mut walk = PageWalk::new(&self.inner.pages, guard.token.clone());

        while remaining != Some(0) {
            let page = match walk.next().await {
                Some(Ok(page)) => page,
                Some(Err(e)) => {
                    log::warn!(
                        "{operation} aborted after {} pages ({} newly selected): {e}",
                        outcome.pages_walked,
                        outcome.newly_selected
                    );
                    return Err(e);
                }
                None => break,
            };

            let take = remaining.map_or(page.len(), |r| r.min(page.len()));
            outcome.newly_selected += self.insert_items(&page.items()[..take]);
            outcome.pages_walked += 1;
            guard.page_done();

            if let Some(r) = remaining.as_mut() {
                *r -= take;
            }
        }

        outcome.cancelled = walk.was_cancelled();
        outcome.selected_total = self.selected_count();
        log::info!(
            "{operation} finished: {} pages, {} newly selected, {} selected{}",
            outcome.pages_walked,
            outcome.newly_selected,
            outcome.selected_total,
            if outcome.cancelled { " (cancelled)" } else { "" }
        );
        Ok(outcome)
    }

    /// Inserts `items` under one lock and returns how many were new.
    fn insert_items(&self, items: &[ItemOf<S>]) -> usize {
        let mut selection = self.write_selection();
        items
            .iter()
            .filter(|item| selection.insert(item.key(), (*item).clone()).is_none())
            .count()
    }

    /// Claims the bulk slot for `operation`.
    fn begin(&self, operation: BulkOperation) -> Result<BulkGuard<'_>, Error> {
        let mut slot = self.lock_bulk();
        if let Some(active) = slot.as_ref() {
            log::debug!("rejecting {operation}: {} in progress", active.operation);
            return Err(Error::OperationInProgress {
                active: active.operation,
                requested: operation,
            });
        }

        let token = CancellationToken::new();
        *slot = Some(BulkSlot {
            operation,
            token: token.clone(),
            pages_done: 0,
        });
        Ok(BulkGuard {
            slot: &self.inner.bulk,
            token,
        })
    }

    fn lock_bulk(&self) -> MutexGuard<'_, Option<BulkSlot>> {
        self.inner.bulk.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_selection(&self) -> RwLockReadGuard<'_, HashMap<KeyOf<S>, ItemOf<S>>> {
        self.inner
            .selection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_selection(&self) -> RwLockWriteGuard<'_, HashMap<KeyOf<S>, ItemOf<S>>> {
        self.inner
            .selection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the bulk slot when the operation ends, including when its
/// future is dropped mid-walk.
struct BulkGuard<'a> {
    slot: &'a Mutex<Option<BulkSlot>>,
    token: CancellationToken,
}

impl BulkGuard<'_> {
    fn page_done(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slot.as_mut() {
            slot.pages_done += 1;
        }
    }
}

impl Drop for BulkGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

/// Parses a bulk count typed by a user.
///
/// Accepts surrounding whitespace; rejects anything that is not a positive
/// integer.
///
/// ```
/// use artsel_lib::selection::parse_count;
///
/// assert_eq!(parse_count(" 15 ").unwrap(), 15);
/// assert!(parse_count("0").is_err());
/// assert!(parse_count("ten").is_err());
/// ```
pub fn parse_count(input: &str) -> Result<usize, Error> {
    let trimmed = input.trim();
    match trimmed.parse::<usize>() {
        Ok(0) => Err(Error::invalid("count must be greater than zero")),
        Ok(n) => Ok(n),
        Err(_) => Err(Error::invalid(format!("not a positive number: {trimmed:?}"))),
    }
}
