//! Bulk operations racing with navigation, other bulk requests and
//! cancellation.
//!
//! `GatedSource` parks the first fetch of one chosen page until the test
//! releases it, so the interleavings below are deterministic.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use tokio::sync::Notify;

use artsel_lib::PageCache;
use artsel_lib::PageNavigator;
use artsel_lib::SelectionSynchronizer;
use artsel_lib::SessionConfig;
use artsel_lib::error::Error;
use artsel_lib::error::FetchError;
use artsel_lib::model::Artwork;
use artsel_lib::model::Page;
use artsel_lib::selection::BulkOperation;
use artsel_lib::selection::SyncState;
use artsel_lib::source::InMemorySource;
use artsel_lib::source::RemoteCollectionSource;

struct GatedSource {
    inner: InMemorySource<Artwork>,
    /// Page whose next fetch parks; 0 once the gate has been used.
    gate: AtomicU32,
    entered: Notify,
    release: Notify,
}

impl GatedSource {
    fn new(items: u64, gate: u32) -> Self {
        Self {
            inner: InMemorySource::new((1..=items).map(|id| Artwork::new(id, "gated")).collect()),
            gate: AtomicU32::new(gate),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl RemoteCollectionSource for GatedSource {
    type Item = Artwork;

    async fn fetch_page(&self, page_index: u32, page_size: u32) -> Result<Page<Artwork>, FetchError> {
        if self
            .gate
            .compare_exchange(page_index, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.fetch_page(page_index, page_size).await
    }
}

struct Harness {
    source: Arc<GatedSource>,
    navigator: PageNavigator<GatedSource>,
    selection: SelectionSynchronizer<GatedSource>,
}

fn harness(items: u64, gate: u32) -> Harness {
    let source = Arc::new(GatedSource::new(items, gate));
    let pages = PageCache::new(Arc::clone(&source), SessionConfig::default());
    Harness {
        source,
        navigator: PageNavigator::new(pages.clone()),
        selection: SelectionSynchronizer::new(pages),
    }
}

#[tokio::test]
async fn test_second_bulk_request_is_rejected() {
    let h = harness(100, 3);

    let running = tokio::spawn({
        let selection = h.selection.clone();
        async move { selection.select_all().await }
    });
    h.source.entered.notified().await;

    assert!(matches!(
        h.selection.state(),
        SyncState::Fetching {
            operation: BulkOperation::SelectAll,
            pages_done: 2,
            cancelling: false,
        }
    ));

    let err = h.selection.select_first_n(5).await.unwrap_err();
    assert!(matches!(
        err,
        Error::OperationInProgress {
            active: BulkOperation::SelectAll,
            requested: BulkOperation::SelectFirstN(5),
        }
    ));
    assert!(h.selection.clear_all().unwrap_err().is_in_progress());
    assert!(h.selection.select_all().await.unwrap_err().is_in_progress());

    h.source.release.notify_one();
    let outcome = running.await.unwrap().unwrap();

    assert_eq!(outcome.pages_walked, 10);
    assert_eq!(h.selection.selected_count(), 100);
    assert!(h.selection.state().is_idle());
    assert!(h.selection.clear_all().is_ok());
}

#[tokio::test]
async fn test_navigation_during_bulk_operation() {
    let h = harness(100, 4);
    h.navigator.go_to(1).await.unwrap();

    let running = tokio::spawn({
        let selection = h.selection.clone();
        async move { selection.select_first_n(60).await }
    });
    h.source.entered.notified().await;

    let before = h.selection.selected_count();
    let page = h.navigator.go_to(8).await.unwrap();
    assert_eq!(page.index(), 8);
    assert_eq!(h.selection.selected_count(), before);

    // Per-page edits are still allowed while the walk is parked.
    h.selection
        .toggle_on_current_page(&page, &HashSet::from([71, 72]));

    h.source.release.notify_one();
    running.await.unwrap().unwrap();

    let mut keys = h.selection.selected_keys();
    keys.sort_unstable();
    let mut expected: Vec<u64> = (1..=60).collect();
    expected.extend([71, 72]);
    assert_eq!(keys, expected);

    // The walk fetched by index, so the page on screen did not move.
    assert_eq!(h.navigator.current_index(), Some(8));
}

#[tokio::test]
async fn test_cancel_keeps_applied_pages() {
    let h = harness(100, 3);

    let running = tokio::spawn({
        let selection = h.selection.clone();
        async move { selection.select_all().await }
    });
    h.source.entered.notified().await;

    assert!(h.selection.cancel());
    assert!(matches!(
        h.selection.state(),
        SyncState::Fetching {
            cancelling: true,
            ..
        }
    ));

    h.source.release.notify_one();
    let outcome = running.await.unwrap().unwrap();

    // Page 3 was already in flight when the cancel arrived.
    assert!(outcome.cancelled);
    assert_eq!(outcome.pages_walked, 3);
    assert_eq!(h.selection.selected_count(), 30);
    assert_eq!(h.source.inner.fetched_pages(), vec![1, 2, 3]);
    assert!(h.selection.state().is_idle());
    assert!(!h.selection.cancel());
}

#[tokio::test]
async fn test_dropped_operation_releases_slot() {
    let h = harness(100, 2);

    let running = tokio::spawn({
        let selection = h.selection.clone();
        async move { selection.select_all().await }
    });
    h.source.entered.notified().await;

    running.abort();
    assert!(running.await.unwrap_err().is_cancelled());

    assert!(h.selection.state().is_idle());
    assert_eq!(h.selection.selected_count(), 10);
    assert!(h.selection.select_first_n(5).await.is_ok());
}

#[tokio::test]
async fn test_racing_bulk_requests_on_one_task() {
    let h = harness(50, 2);

    let (first, second) = futures::join!(h.selection.select_all(), async {
        h.source.entered.notified().await;
        let rejected = h.selection.select_first_n(3).await;
        h.source.release.notify_one();
        rejected
    });

    assert_eq!(first.unwrap().selected_total, 50);
    assert!(second.unwrap_err().is_in_progress());
}

#[tokio::test]
async fn test_slow_navigation_does_not_replace_newer_page() {
    let h = harness(100, 2);

    let slow = tokio::spawn({
        let navigator = h.navigator.clone();
        async move { navigator.go_to(2).await }
    });
    h.source.entered.notified().await;

    let newer = h.navigator.go_to(3).await.unwrap();
    assert_eq!(newer.index(), 3);

    h.source.release.notify_one();
    let returned = slow.await.unwrap().unwrap();

    // The page 2 fetch completed last but was started first.
    assert_eq!(returned.index(), 3);
    assert_eq!(h.navigator.current_index(), Some(3));
    assert_eq!(h.navigator.pages().current().unwrap().index(), 3);
    assert_eq!(h.source.inner.fetched_pages(), vec![3, 2]);
}
