//! Remote collection sources
//!
//! A [`RemoteCollectionSource`] is an opaque paginated fetch endpoint. The
//! crate ships an HTTP source for the Art Institute of Chicago API, an
//! in-memory source and a caching decorator.

mod artic;
mod cached;
mod memory;

pub use artic::*;
pub use cached::*;
pub use memory::*;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::CollectionItem;
use crate::model::Page;

/// A paginated collection that can only be read one page at a time.
///
/// Implementations must not keep partial state on failure: a failed fetch
/// returns a [`FetchError`] and nothing else.
#[async_trait]
pub trait RemoteCollectionSource: Send + Sync {
    /// The item type served by this source.
    type Item: CollectionItem;

    /// Fetches page `page_index` (1-based) holding at most `page_size` items.
    ///
    /// The returned page carries `page_index` and, when the source knows it,
    /// the collection total.
    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> Result<Page<Self::Item>, FetchError>;

    /// Returns the number of records the source is willing to enumerate, if
    /// it refuses to page further than that.
    fn max_records(&self) -> Option<u64> {
        None
    }

    /// Drops any locally kept copy of a page so the next fetch of it reaches
    /// the remote collection.
    async fn forget_page(&self, _page_index: u32, _page_size: u32) {}
}
