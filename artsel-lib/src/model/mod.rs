//! Collection models

mod artwork;
mod item;
mod page;

pub use artwork::*;
pub use item::*;
pub use page::*;
