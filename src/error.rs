use thiserror::Error;

use crate::store::PhotoId;

/// Failures reported by the collection store and its collaborators.
///
/// None of these are fatal: callers get them back as values and decide
/// what to show the user.
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("photo not found: {0}")]
    NotFound(PhotoId),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),

    #[error("input too large: {size} bytes (limit {limit} bytes)")]
    OversizeInput { size: u64, limit: u64 },

    #[error("image processing failed: {0}")]
    Image(String),
}

impl From<image::ImageError> for GalleryError {
    fn from(err: image::ImageError) -> Self {
        GalleryError::Image(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;
