//! Read-only views over the collection: filtering, ordering, paging and
//! the tag bar. Nothing here mutates the store.

pub mod browser;
pub mod filter;
pub mod pagination;
pub mod projection;
pub mod tags;

pub use browser::{GalleryPage, GalleryView};
pub use filter::{CategorySelector, FilterSpec, SortKey};
pub use pagination::{Pagination, DEFAULT_PAGE_SIZE};
pub use projection::project;
pub use tags::{tag_index, TagChip};
