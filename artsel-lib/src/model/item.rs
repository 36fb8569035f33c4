//! Keyed collection items

use std::fmt::Debug;
use std::hash::Hash;

/// A record of a remote collection with a stable, unique key.
///
/// Items are immutable once fetched; the selection keeps a clone of every
/// selected item keyed by [`CollectionItem::key`].
///
/// # Example
///
/// ```
/// use artsel_lib::model::CollectionItem;
///
/// #[derive(Debug, Clone)]
/// struct Row {
///     id: u32,
///     label: String,
/// }
///
/// impl CollectionItem for Row {
///     type Key = u32;
///
///     fn key(&self) -> u32 {
///         self.id
///     }
/// }
/// ```
pub trait CollectionItem: Clone + Send + Sync + 'static {
    /// The stable key type.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns the key identifying this item across pages.
    fn key(&self) -> Self::Key;
}
