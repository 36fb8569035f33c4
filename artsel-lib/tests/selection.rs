//! Integration tests for selection across pages.
//!
//! Every test runs against an `InMemorySource` of numbered artworks, so the
//! key of an artwork is also its position in the collection.

use std::collections::HashSet;
use std::sync::Arc;

use artsel_lib::PageCache;
use artsel_lib::PageNavigator;
use artsel_lib::SelectionSynchronizer;
use artsel_lib::SessionConfig;
use artsel_lib::cache::CacheConfig;
use artsel_lib::cache::InMemoryCache;
use artsel_lib::error::Error;
use artsel_lib::model::Artwork;
use artsel_lib::selection::HeaderState;
use artsel_lib::source::CachedSource;
use artsel_lib::source::InMemorySource;
use artsel_lib::source::RemoteCollectionSource;

struct Session<S: RemoteCollectionSource> {
    source: Arc<S>,
    navigator: PageNavigator<S>,
    selection: SelectionSynchronizer<S>,
}

fn session<S: RemoteCollectionSource>(source: S, config: SessionConfig) -> Session<S> {
    let source = Arc::new(source);
    let pages = PageCache::new(Arc::clone(&source), config);
    Session {
        source,
        navigator: PageNavigator::new(pages.clone()),
        selection: SelectionSynchronizer::new(pages),
    }
}

fn artworks(n: u64) -> Vec<Artwork> {
    (1..=n)
        .map(|id| Artwork::new(id, format!("Artwork {id}")))
        .collect()
}

fn collection(n: u64) -> Session<InMemorySource<Artwork>> {
    session(InMemorySource::new(artworks(n)), SessionConfig::default())
}

fn sorted_keys<S>(selection: &SelectionSynchronizer<S>) -> Vec<u64>
where
    S: RemoteCollectionSource<Item = Artwork>,
{
    let mut keys = selection.selected_keys();
    keys.sort_unstable();
    keys
}

// =============================================================================
// Per-page reconciliation
// =============================================================================

mod per_page {
    use super::*;

    #[tokio::test]
    async fn test_visible_selection_matches_chosen_subset() {
        let s = collection(100);
        let page = s.navigator.go_to(3).await.unwrap();

        for chosen in [
            HashSet::new(),
            HashSet::from([21]),
            HashSet::from([22, 25, 30]),
            page.keys().collect::<HashSet<_>>(),
            HashSet::from([24, 26]),
        ] {
            s.selection.toggle_on_current_page(&page, &chosen);
            assert_eq!(s.selection.visible_selection(&page), chosen);
        }
    }

    #[tokio::test]
    async fn test_other_pages_are_untouched() {
        let s = collection(100);

        let first = s.navigator.go_to(1).await.unwrap();
        s.selection
            .toggle_on_current_page(&first, &HashSet::from([1, 2, 3]));

        let fifth = s.navigator.go_to(5).await.unwrap();
        s.selection
            .toggle_on_current_page(&fifth, &HashSet::from([45]));
        s.selection.toggle_on_current_page(&fifth, &HashSet::new());

        assert_eq!(sorted_keys(&s.selection), vec![1, 2, 3]);

        let first = s.navigator.go_to(1).await.unwrap();
        assert_eq!(
            s.selection.visible_selection(&first),
            HashSet::from([1, 2, 3])
        );
        assert_eq!(s.selection.header_state(&first), HeaderState::Indeterminate);
    }

    #[tokio::test]
    async fn test_navigation_never_changes_count() {
        let s = collection(100);
        let page = s.navigator.go_to(2).await.unwrap();
        s.selection
            .toggle_on_current_page(&page, &HashSet::from([11, 12]));
        s.selection.select_first_n(5).await.unwrap();
        let count = s.selection.selected_count();

        for index in [1, 7, 10, 3] {
            s.navigator.go_to(index).await.unwrap();
            assert_eq!(s.selection.selected_count(), count);
        }
        s.navigator.next().await.unwrap();
        s.navigator.last().await.unwrap();
        assert_eq!(s.selection.selected_count(), count);

        s.source.fail_page(4);
        assert!(s.navigator.go_to(4).await.is_err());
        assert_eq!(s.selection.selected_count(), count);
    }
}

// =============================================================================
// Select first N
// =============================================================================

mod select_first_n {
    use super::*;

    #[tokio::test]
    async fn test_first_fifteen_of_hundred() {
        let s = collection(100);

        let outcome = s.selection.select_first_n(15).await.unwrap();

        assert_eq!(s.selection.selected_count(), 15);
        assert_eq!(sorted_keys(&s.selection), (1..=15).collect::<Vec<_>>());
        assert_eq!(outcome.pages_walked, 2);
        assert_eq!(outcome.newly_selected, 15);
        assert_eq!(s.source.fetched_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_count_is_min_of_n_and_total() {
        for (n, expected) in [(1, 1), (10, 10), (37, 37), (40, 40), (41, 40), (500, 40)] {
            let s = collection(40);
            s.selection.select_first_n(n).await.unwrap();
            assert_eq!(s.selection.selected_count(), expected, "n = {n}");
        }
    }

    #[tokio::test]
    async fn test_count_without_reported_total() {
        let s = session(
            InMemorySource::new(artworks(23)).without_total(),
            SessionConfig::default(),
        );
        s.selection.select_first_n(100).await.unwrap();
        assert_eq!(s.selection.selected_count(), 23);
    }

    #[tokio::test]
    async fn test_repeated_call_changes_nothing() {
        let s = collection(100);
        s.selection.select_first_n(25).await.unwrap();
        let before = sorted_keys(&s.selection);

        let outcome = s.selection.select_first_n(25).await.unwrap();

        assert_eq!(outcome.newly_selected, 0);
        assert_eq!(sorted_keys(&s.selection), before);
    }

    #[tokio::test]
    async fn test_smaller_n_keeps_longer_prefix() {
        let s = collection(100);
        s.selection.select_first_n(30).await.unwrap();
        s.selection.select_first_n(5).await.unwrap();
        assert_eq!(s.selection.selected_count(), 30);
    }

    #[tokio::test]
    async fn test_keeps_selections_outside_prefix() {
        let s = collection(100);
        let page = s.navigator.go_to(9).await.unwrap();
        s.selection
            .toggle_on_current_page(&page, &HashSet::from([85, 90]));

        s.selection.select_first_n(10).await.unwrap();

        assert_eq!(s.selection.selected_count(), 12);
        assert!(s.selection.is_selected(&85));
        assert!(s.selection.is_selected(&90));
    }

    #[tokio::test]
    async fn test_reuses_page_on_screen() {
        let s = collection(100);
        s.navigator.go_to(1).await.unwrap();

        s.selection.select_first_n(15).await.unwrap();

        assert_eq!(s.source.fetched_pages(), vec![1, 2]);
    }
}

// =============================================================================
// Select all / clear all
// =============================================================================

mod select_all {
    use super::*;

    #[tokio::test]
    async fn test_covers_every_page() {
        let s = collection(95);

        let outcome = s.selection.select_all().await.unwrap();

        assert_eq!(outcome.pages_walked, 10);
        assert_eq!(s.selection.selected_count(), 95);
        for index in 1..=10 {
            let page = s.navigator.go_to(index).await.unwrap();
            assert_eq!(
                s.selection.visible_selection(&page),
                page.keys().collect::<HashSet<_>>()
            );
            assert_eq!(s.selection.header_state(&page), HeaderState::Checked);
        }
    }

    #[tokio::test]
    async fn test_deselecting_shown_page_after_select_all() {
        let s = collection(100);
        s.selection.select_all().await.unwrap();

        let page = s.navigator.go_to(4).await.unwrap();
        let delta = s.selection.toggle_on_current_page(&page, &HashSet::new());

        assert_eq!(delta.deselected.len(), 10);
        assert_eq!(s.selection.selected_count(), 100 - 10);
        assert_eq!(s.selection.header_state(&page), HeaderState::Unchecked);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_walked_pages() {
        let s = collection(100);
        s.source.fail_page(6);

        let err = s.selection.select_all().await.unwrap_err();

        assert_eq!(err.as_fetch().and_then(|e| e.status_code()), Some(503));
        assert_eq!(sorted_keys(&s.selection), (1..=50).collect::<Vec<_>>());
        assert!(s.selection.state().is_idle());
    }

    #[tokio::test]
    async fn test_retry_after_error_completes() {
        let s = collection(100);
        s.source.fail_page(6);
        assert!(s.selection.select_all().await.is_err());

        s.source.heal_page(6);
        let outcome = s.selection.select_all().await.unwrap();

        assert_eq!(outcome.newly_selected, 50);
        assert_eq!(s.selection.selected_count(), 100);
    }

    #[tokio::test]
    async fn test_capped_by_page_ceiling() {
        let s = session(
            InMemorySource::new(artworks(100)),
            SessionConfig::default().with_page_ceiling(3),
        );
        s.selection.select_all().await.unwrap();
        assert_eq!(s.selection.selected_count(), 30);
    }

    #[tokio::test]
    async fn test_capped_by_source_window() {
        let s = session(
            InMemorySource::new(artworks(100)).with_max_records(40),
            SessionConfig::default(),
        );
        s.selection.select_all().await.unwrap();
        assert_eq!(s.selection.selected_count(), 40);
        assert_eq!(s.source.fetched_pages(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_clear_all_resets() {
        let s = collection(100);
        s.selection.select_all().await.unwrap();
        let page = s.navigator.go_to(2).await.unwrap();
        s.selection.toggle_on_current_page(&page, &HashSet::from([11]));

        s.selection.clear_all().unwrap();

        assert_eq!(s.selection.selected_count(), 0);
        assert!(s.selection.visible_selection(&page).is_empty());
        s.navigator.go_to(7).await.unwrap();
        assert_eq!(s.selection.selected_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_all_needs_no_fetch() {
        let s = collection(100);
        s.selection.select_first_n(42).await.unwrap();
        let fetches = s.source.fetch_count();

        let outcome = s.selection.clear_all().unwrap();

        assert_eq!(outcome.removed, 42);
        assert_eq!(s.source.fetch_count(), fetches);
    }

    #[tokio::test]
    async fn test_cached_source_skips_refetch() {
        let cached = CachedSource::new(
            InMemorySource::new(artworks(50)),
            InMemoryCache::new(),
            CacheConfig::default(),
        );
        let s = session(cached, SessionConfig::default());

        s.selection.select_all().await.unwrap();
        s.selection.clear_all().unwrap();
        s.selection.select_all().await.unwrap();

        assert_eq!(s.selection.selected_count(), 50);
        assert_eq!(s.source.inner().fetch_count(), 5);
        assert_eq!(s.source.stats(), (5, 5));
    }

    #[tokio::test]
    async fn test_invalid_count_is_rejected_before_fetching() {
        let s = collection(100);
        assert!(matches!(
            s.selection.select_first_n(0).await,
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(s.source.fetch_count(), 0);
    }
}
