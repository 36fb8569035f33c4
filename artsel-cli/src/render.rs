//! Plain-text rendering of pages and selection state.

use std::collections::HashSet;
use std::fmt::Write;

use artsel_lib::model::Artwork;
use artsel_lib::model::Page;
use artsel_lib::model::PaginationState;
use artsel_lib::selection::BulkOperation;
use artsel_lib::selection::BulkOutcome;
use artsel_lib::selection::HeaderState;
use artsel_lib::selection::PageDelta;
use artsel_lib::selection::SyncState;

const TITLE_WIDTH: usize = 40;
const ORIGIN_WIDTH: usize = 16;

fn marker(selected: bool) -> &'static str {
    if selected { "[x]" } else { "[ ]" }
}

fn header_marker(state: HeaderState) -> &'static str {
    match state {
        HeaderState::Checked => "[x]",
        HeaderState::Unchecked => "[ ]",
        HeaderState::Indeterminate => "[-]",
    }
}

/// Cuts `text` to `width` characters, marking the cut with `~`.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn years(artwork: &Artwork) -> String {
    match (artwork.date_start, artwork.date_end) {
        (Some(start), Some(end)) if start != end => format!("{start}-{end}"),
        (Some(year), _) | (None, Some(year)) => year.to_string(),
        (None, None) => String::new(),
    }
}

/// Renders `page` as a table with a checkbox column.
pub fn page(
    page: &Page<Artwork>,
    pagination: Option<&PaginationState>,
    visible: &HashSet<u64>,
    header: HeaderState,
    selected_total: usize,
) -> String {
    let mut out = String::new();

    let position = match pagination.and_then(|p| p.last_page()) {
        Some(last) => format!("page {} of {last}", page.index()),
        None => format!("page {}", page.index()),
    };
    let _ = writeln!(out, "{position}  ({selected_total} selected in total)");
    let _ = writeln!(
        out,
        "{} {:>8}  {:<TITLE_WIDTH$}  {:<ORIGIN_WIDTH$}  years",
        header_marker(header),
        "id",
        "title",
        "origin"
    );

    if page.is_empty() {
        let _ = writeln!(out, "    (no artworks on this page)");
    }
    for artwork in page.items() {
        let _ = writeln!(
            out,
            "{} {:>8}  {:<TITLE_WIDTH$}  {:<ORIGIN_WIDTH$}  {}",
            marker(visible.contains(&artwork.id)),
            artwork.id,
            fit(artwork.title_or_empty(), TITLE_WIDTH),
            fit(artwork.place_of_origin.as_deref().unwrap_or(""), ORIGIN_WIDTH),
            years(artwork)
        );
    }
    out
}

/// Renders pagination and synchronizer state.
pub fn status(
    pagination: Option<&PaginationState>,
    state: SyncState,
    selected_total: usize,
) -> String {
    let mut out = String::new();

    match pagination {
        Some(p) => {
            let total = if p.total_reported {
                p.total_records.to_string()
            } else {
                "unknown".to_string()
            };
            let _ = writeln!(
                out,
                "page {} of {} ({} per page, {} artworks, {} reachable)",
                p.current_page,
                p.last_page().map_or_else(|| "?".to_string(), |n| n.to_string()),
                p.page_size,
                total,
                p.reachable_records()
            );
        }
        None => {
            let _ = writeln!(out, "no page loaded");
        }
    }

    let _ = writeln!(out, "{selected_total} selected");
    let _ = match state {
        SyncState::Idle => writeln!(out, "idle"),
        SyncState::Fetching {
            operation,
            pages_done,
            cancelling,
        } => writeln!(
            out,
            "{operation}: {pages_done} pages done{}",
            if cancelling { ", cancelling" } else { "" }
        ),
    };
    out
}

/// Renders the selected artworks ordered by id.
pub fn selected(mut items: Vec<Artwork>) -> String {
    if items.is_empty() {
        return "nothing selected\n".to_string();
    }
    items.sort_unstable_by_key(|artwork| artwork.id);

    let mut out = String::new();
    for artwork in &items {
        let _ = writeln!(out, "{:>8}  {}", artwork.id, artwork.title_or_empty());
    }
    let _ = writeln!(out, "{} selected", items.len());
    out
}

/// Summarizes a per-page reconciliation.
pub fn delta(delta: &PageDelta<u64>, ignored: &[u64]) -> String {
    let mut out = format!(
        "{} selected, {} deselected on this page",
        delta.selected.len(),
        delta.deselected.len()
    );
    if !ignored.is_empty() {
        let ids: Vec<String> = ignored.iter().map(u64::to_string).collect();
        let _ = write!(out, " (not on this page: {})", ids.join(", "));
    }
    out.push('\n');
    out
}

/// Summarizes a finished bulk operation.
pub fn outcome(outcome: &BulkOutcome) -> String {
    if outcome.operation == BulkOperation::ClearAll {
        return format!(
            "{}: {} removed, {} selected\n",
            outcome.operation, outcome.removed, outcome.selected_total
        );
    }
    format!(
        "{}{}: {} pages, {} newly selected, {} selected\n",
        outcome.operation,
        if outcome.cancelled { " (cancelled)" } else { "" },
        outcome.pages_walked,
        outcome.newly_selected,
        outcome.selected_total
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> Page<Artwork> {
        let mut dated = Artwork::new(2, "A Sunday on La Grande Jatte");
        dated.date_start = Some(1884);
        dated.date_end = Some(1886);
        dated.place_of_origin = Some("France".to_string());
        Page::new(1, vec![Artwork::new(1, "Nighthawks"), dated]).with_total_count(25)
    }

    #[test]
    fn test_page_markers() {
        let page = sample_page();
        let pagination = PaginationState::from_page(&page, 10, None);
        let text = super::page(
            &page,
            Some(&pagination),
            &HashSet::from([2]),
            HeaderState::Indeterminate,
            7,
        );

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "page 1 of 3  (7 selected in total)");
        assert!(lines[1].starts_with("[-]"));
        assert!(lines[2].starts_with("[ ]"));
        assert!(lines[3].starts_with("[x]"));
        assert!(lines[3].contains("France"));
        assert!(lines[3].ends_with("1884-1886"));
    }

    #[test]
    fn test_fit_marks_cut() {
        assert_eq!(fit("short", 10), "short");
        assert_eq!(fit("abcdefghij", 5), "abcd~");
    }

    #[test]
    fn test_status_while_fetching() {
        let text = status(
            None,
            SyncState::Fetching {
                operation: BulkOperation::SelectAll,
                pages_done: 4,
                cancelling: true,
            },
            40,
        );
        assert_eq!(
            text,
            "no page loaded\n40 selected\nselect all: 4 pages done, cancelling\n"
        );
    }

    #[test]
    fn test_selected_is_sorted() {
        let text = selected(vec![Artwork::new(9, "b"), Artwork::new(3, "a")]);
        assert_eq!(text, "       3  a\n       9  b\n2 selected\n");
        assert_eq!(selected(Vec::new()), "nothing selected\n");
    }

    #[test]
    fn test_delta_lists_ignored_ids() {
        let delta = PageDelta {
            selected: vec![1, 2],
            deselected: vec![3],
        };
        assert_eq!(
            super::delta(&delta, &[99]),
            "2 selected, 1 deselected on this page (not on this page: 99)\n"
        );
    }
}
