//! Paginated selection library
//!
//! Keeps a selection set consistent with a large remote collection that is only
//! ever fetched one page at a time.

pub mod cache;
pub mod error;
pub mod model;
pub mod rate_limit;
pub mod selection;
pub mod source;

mod config;
mod navigator;
mod page_cache;

pub use config::*;
pub use navigator::PageNavigator;
pub use page_cache::PageCache;
pub use selection::SelectionSynchronizer;
