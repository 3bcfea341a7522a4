//! Adding image files to the collection.
//!
//! Files are validated up front, decoded in parallel, and each one that
//! processes successfully is added on its own. A file that fails does not
//! affect the rest of the batch, and files already added stay added.

pub mod discovery;
pub mod processor;

use anyhow::Context;
use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::{GalleryError, Result};
use crate::store::{CollectionStore, NewPhoto, Photo, PhotoMetadata};

pub use discovery::{discover_images, mime_type_for};
pub use processor::{DataUriProcessor, ImageProcessor, ProcessedImage};

/// Largest image file accepted for upload.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Self {
            name,
            mime_type: mime_type_for(path).to_string(),
            bytes,
        })
    }
}

/// Form values applied to every file of a batch.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub compress: bool,
    pub max_file_bytes: u64,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            title: None,
            tags: Vec::new(),
            category: None,
            compress: false,
            max_file_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

#[derive(Debug)]
pub struct UploadFailure {
    pub name: String,
    pub error: GalleryError,
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub added: Vec<Photo>,
    pub failed: Vec<UploadFailure>,
}

/// A batch stopped by a storage failure. `report` lists what was added
/// before it; files after the failing one were not attempted.
#[derive(Debug, Error)]
#[error("upload stopped after {added} photos: {error}", added = .report.added.len())]
pub struct UploadAborted {
    pub report: UploadReport,
    #[source]
    pub error: GalleryError,
}

/// Reject files that are not images or exceed `max_bytes`.
pub fn validate(file: &UploadFile, max_bytes: u64) -> Result<()> {
    if !file.mime_type.starts_with("image/") {
        return Err(GalleryError::Validation(format!(
            "{} is not an image ({})",
            file.name, file.mime_type
        )));
    }
    crate::export::check_size(file.bytes.len() as u64, max_bytes)
}

/// Process `files` and add each successful one to `store`.
///
/// Only a storage failure while adding aborts the batch; photos added
/// before it remain in the collection and come back in the error.
pub fn upload_batch(
    store: &mut CollectionStore,
    processor: &dyn ImageProcessor,
    files: Vec<UploadFile>,
    options: &UploadOptions,
) -> std::result::Result<UploadReport, UploadAborted> {
    let mut report = UploadReport::default();

    let mut accepted = Vec::new();
    for file in files {
        match validate(&file, options.max_file_bytes) {
            Ok(()) => accepted.push(file),
            Err(error) => {
                warn!("Skipping {}: {}", file.name, error);
                report.failed.push(UploadFailure {
                    name: file.name,
                    error,
                });
            }
        }
    }

    debug!("Processing {} images", accepted.len());
    let processed: Vec<(UploadFile, Result<ProcessedImage>)> = accepted
        .into_par_iter()
        .map(|file| {
            let result = processor.process(&file.bytes, &file.mime_type, options.compress);
            (file, result)
        })
        .collect();

    for (file, result) in processed {
        let image = match result {
            Ok(image) => image,
            Err(error) => {
                warn!("Failed to process {}: {}", file.name, error);
                report.failed.push(UploadFailure {
                    name: file.name,
                    error,
                });
                continue;
            }
        };

        let added = store.add(NewPhoto {
            name: file.name,
            mime_type: file.mime_type,
            byte_size: file.bytes.len() as u64,
            primary_image_ref: image.primary_image_ref,
            thumbnail_image_ref: image.thumbnail_image_ref,
            title: options.title.clone(),
            tags: options.tags.clone(),
            category: options.category.clone(),
            metadata: PhotoMetadata::from_dimensions(image.width, image.height),
        });
        match added {
            Ok(photo) => report.added.push(photo),
            Err(error) => {
                warn!(
                    "Upload stopped after {} photos: {}",
                    report.added.len(),
                    error
                );
                return Err(UploadAborted { report, error });
            }
        }
    }

    info!(
        "Upload finished: {} added, {} failed",
        report.added.len(),
        report.failed.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStorage, SequentialIds, Storage, StoreOptions, SystemClock};

    /// Accepts anything whose first byte is not zero.
    struct FakeProcessor;

    impl ImageProcessor for FakeProcessor {
        fn process(&self, bytes: &[u8], _mime_type: &str, _compress: bool) -> Result<ProcessedImage> {
            match bytes.first() {
                Some(0) | None => Err(GalleryError::Image("cannot decode".to_string())),
                Some(_) => Ok(ProcessedImage {
                    primary_image_ref: format!("data:{}", bytes.len()),
                    thumbnail_image_ref: format!("thumb:{}", bytes.len()),
                    width: 400,
                    height: 200,
                }),
            }
        }
    }

    fn file(name: &str, mime: &str, bytes: Vec<u8>) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            mime_type: mime.to_string(),
            bytes,
        }
    }

    #[test]
    fn test_validate() {
        assert!(validate(&file("a.jpg", "image/jpeg", vec![1; 10]), 10).is_ok());
        assert!(matches!(
            validate(&file("a.jpg", "image/jpeg", vec![1; 11]), 10),
            Err(GalleryError::OversizeInput { size: 11, limit: 10 })
        ));
        assert!(matches!(
            validate(&file("a.txt", "text/plain", vec![1]), 10),
            Err(GalleryError::Validation(_))
        ));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let mut store = CollectionStore::in_memory(StoreOptions::default());
        let options = UploadOptions {
            title: Some("Trip".to_string()),
            tags: vec!["sea".to_string(), " ".to_string()],
            category: Some("Travel".to_string()),
            max_file_bytes: 8,
            ..Default::default()
        };
        let files = vec![
            file("good1.jpg", "image/jpeg", vec![1, 2, 3]),
            file("broken.jpg", "image/jpeg", vec![0, 1]),
            file("huge.jpg", "image/jpeg", vec![1; 9]),
            file("notes.txt", "text/plain", vec![1]),
            file("good2.png", "image/png", vec![5; 4]),
        ];

        let report = upload_batch(&mut store, &FakeProcessor, files, &options).unwrap();

        assert_eq!(report.added.len(), 2);
        assert_eq!(report.failed.len(), 3);
        assert_eq!(store.len(), 2);

        let added = &report.added[0];
        assert_eq!(added.title, "Trip");
        assert_eq!(added.tags, vec!["sea"]);
        assert_eq!(added.category, "Travel");
        assert_eq!(added.metadata.width, 400);
        assert!((added.metadata.aspect_ratio - 2.0).abs() < 1e-9);

        let failed: Vec<&str> = report.failed.iter().map(|f| f.name.as_str()).collect();
        assert!(failed.contains(&"broken.jpg"));
        assert!(failed.contains(&"huge.jpg"));
        assert!(failed.contains(&"notes.txt"));
    }

    /// Accepts `writes_left` writes, then fails every one after.
    struct FillingStorage {
        inner: MemoryStorage,
        writes_left: usize,
    }

    impl Storage for FillingStorage {
        fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.writes_left == 0 {
                anyhow::bail!("disk full");
            }
            self.writes_left -= 1;
            self.inner.write(key, value)
        }
    }

    #[test]
    fn test_storage_failure_returns_partial_report() {
        // Each add writes the photos and categories entries.
        let storage = FillingStorage {
            inner: MemoryStorage::new(),
            writes_left: 2,
        };
        let mut store = CollectionStore::open(
            Box::new(storage),
            Box::new(SystemClock),
            Box::new(SequentialIds::with_salt("u")),
            StoreOptions::default(),
        );
        let files = vec![
            file("one.jpg", "image/jpeg", vec![1]),
            file("two.jpg", "image/jpeg", vec![2]),
            file("three.jpg", "image/jpeg", vec![3]),
        ];

        let aborted = upload_batch(&mut store, &FakeProcessor, files, &UploadOptions::default())
            .unwrap_err();

        assert!(matches!(aborted.error, GalleryError::Storage(_)));
        let names: Vec<&str> = aborted.report.added.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["one.jpg"]);
        assert!(aborted.to_string().starts_with("upload stopped after 1 photos"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.JPG");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let upload = UploadFile::from_path(&path).unwrap();
        assert_eq!(upload.name, "shot.JPG");
        assert_eq!(upload.mime_type, "image/jpeg");
        assert_eq!(upload.bytes.len(), 3);
    }
}
