//! Synchronizer state and operation results.

use std::fmt;

/// Operations that may walk pages beyond the one on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkOperation {
    /// Select the first `n` items of the collection.
    SelectFirstN(usize),
    /// Select every item up to the page ceiling.
    SelectAll,
    /// Empty the selection.
    ClearAll,
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectFirstN(n) => write!(f, "select first {n}"),
            Self::SelectAll => write!(f, "select all"),
            Self::ClearAll => write!(f, "clear all"),
        }
    }
}

/// What the synchronizer is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// No bulk operation in flight.
    #[default]
    Idle,
    /// A bulk operation is walking pages.
    Fetching {
        /// The running operation.
        operation: BulkOperation,
        /// Pages applied so far.
        pages_done: u32,
        /// Whether cancellation has been requested.
        cancelling: bool,
    },
}

impl SyncState {
    /// Returns `true` if no bulk operation is running.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Result of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutcome {
    /// The operation that ran.
    pub operation: BulkOperation,
    /// Pages visited (fetched or taken from the page cache).
    pub pages_walked: u32,
    /// Keys that were not selected before this call.
    pub newly_selected: usize,
    /// Keys removed by this call.
    pub removed: usize,
    /// Selection size after the call.
    pub selected_total: usize,
    /// Whether the walk stopped early because it was cancelled.
    pub cancelled: bool,
}

impl BulkOutcome {
    pub(crate) fn new(operation: BulkOperation) -> Self {
        Self {
            operation,
            pages_walked: 0,
            newly_selected: 0,
            removed: 0,
            selected_total: 0,
            cancelled: false,
        }
    }
}

/// Keys whose state changed after a per-page reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDelta<K> {
    /// Keys added to the selection.
    pub selected: Vec<K>,
    /// Keys removed from the selection.
    pub deselected: Vec<K>,
}

impl<K> PageDelta<K> {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.deselected.is_empty()
    }
}

impl<K> Default for PageDelta<K> {
    fn default() -> Self {
        Self {
            selected: Vec::new(),
            deselected: Vec::new(),
        }
    }
}

/// State of a page-level "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    /// Every item on the page is selected.
    Checked,
    /// No item on the page is selected (or the page is empty).
    Unchecked,
    /// Some, but not all, items on the page are selected.
    Indeterminate,
}

impl HeaderState {
    pub(crate) fn from_counts(selected: usize, on_page: usize) -> Self {
        if on_page == 0 || selected == 0 {
            Self::Unchecked
        } else if selected >= on_page {
            Self::Checked
        } else {
            Self::Indeterminate
        }
    }
}
