//! Folio: a local photo gallery.
//!
//! The [`store::CollectionStore`] owns photos and categories and writes every
//! change through to durable storage. [`view`] derives the filtered, sorted
//! and paged grid from it, and [`viewer`] holds full-screen viewer state.

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod store;
pub mod upload;
pub mod view;
pub mod viewer;

pub use error::{GalleryError, Result};
