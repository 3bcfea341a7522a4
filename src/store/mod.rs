//! The collection store: sole owner and mutator of photos and categories.
//!
//! Every mutation is written through to [`Storage`] before the call returns.
//! When a write fails the in-memory state is kept as the source of truth for
//! the session and the failure is returned to the caller.

pub mod clock;
pub mod photo;
pub mod seed;
pub mod sqlite;
pub mod storage;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::error::{GalleryError, Result};
use crate::export;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidIds};
pub use photo::{
    normalize_tags, parse_tag_list, NewPhoto, Photo, PhotoId, PhotoMetadata, PhotoPatch,
    UNCATEGORIZED,
};
pub use sqlite::SqliteStorage;
pub use storage::{MemoryStorage, Storage, CATEGORIES_KEY, PHOTOS_KEY};

/// Categories offered before the user adds any.
pub fn default_categories() -> Vec<String> {
    ["Travel", "Family", "Nature", "Events", "Work"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// The unit of persistence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub photos: Vec<Photo>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub default_categories: Vec<String>,
    /// Seed sample photos when storage holds none.
    pub seed_samples: bool,
    pub samples_dir: String,
    pub max_import_bytes: u64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            default_categories: default_categories(),
            seed_samples: false,
            samples_dir: "img/samples".to_string(),
            max_import_bytes: export::MAX_IMPORT_BYTES,
        }
    }
}

/// Published to subscribers after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionEvent {
    Added(PhotoId),
    Updated(PhotoId),
    Deleted(PhotoId),
    FavoriteToggled { id: PhotoId, favorite: bool },
    Imported { photos: usize },
    Seeded { photos: usize },
    CategoryAdded(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&CollectionEvent)>;

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub dropped: usize,
    pub categories_added: usize,
}

const MAX_ID_ATTEMPTS: usize = 16;

pub struct CollectionStore {
    photos: Vec<Photo>,
    categories: Vec<String>,
    storage: Box<dyn Storage>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    options: StoreOptions,
    /// Bumped whenever the photo set changes.
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl CollectionStore {
    /// Load the collection from `storage`.
    ///
    /// Unreadable or malformed entries fall back to an empty collection and
    /// the default categories. When no photos were ever stored and seeding
    /// is enabled, the sample set is written.
    pub fn open(
        storage: Box<dyn Storage>,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
        options: StoreOptions,
    ) -> Self {
        let (photos, needs_seed) = load_photos(storage.as_ref());
        let categories = load_categories(storage.as_ref(), &options.default_categories);

        let mut store = Self {
            photos,
            categories,
            storage,
            clock,
            ids,
            options,
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 1,
        };

        if needs_seed && store.options.seed_samples {
            if let Err(e) = store.seed_samples() {
                warn!("Sample photos could not be persisted: {}", e);
            }
        }

        info!(
            "Collection loaded: {} photos, {} categories",
            store.photos.len(),
            store.categories.len()
        );
        store
    }

    /// Store over in-memory storage with the system clock and UUID ids.
    pub fn in_memory(options: StoreOptions) -> Self {
        Self::open(
            Box::new(MemoryStorage::new()),
            Box::new(SystemClock),
            Box::new(UuidIds),
            options,
        )
    }

    // === Reads ===

    /// Photos in collection order, most recently added first.
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn get(&self, id: &PhotoId) -> Option<&Photo> {
        self.photos.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PhotoId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Changes every time the photo set is mutated.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            photos: self.photos.clone(),
            categories: self.categories.clone(),
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    // === Subscriptions ===

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CollectionEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    // === Mutations ===

    /// Add a photo at the front of the collection.
    pub fn add(&mut self, input: NewPhoto) -> Result<Photo> {
        let photo = Photo {
            id: self.fresh_id()?,
            name: input.name,
            mime_type: input.mime_type,
            byte_size: input.byte_size,
            primary_image_ref: input.primary_image_ref,
            thumbnail_image_ref: input.thumbnail_image_ref,
            upload_timestamp: self.clock.now(),
            title: input.title.unwrap_or_default(),
            tags: normalize_tags(input.tags),
            category: photo::category_or_default(input.category),
            favorite: false,
            metadata: input.metadata,
        };

        debug!("Adding photo {} ({})", photo.id, photo.name);
        self.photos.insert(0, photo.clone());
        self.commit(CollectionEvent::Added(photo.id.clone()), true)?;
        Ok(photo)
    }

    /// Merge `patch` into the photo with `id`.
    pub fn update(&mut self, id: &PhotoId, patch: PhotoPatch) -> Result<Photo> {
        let photo = self
            .photos
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| GalleryError::NotFound(id.clone()))?;

        patch.apply_to(photo);
        let updated = photo.clone();

        debug!("Updated photo {}", id);
        self.commit(CollectionEvent::Updated(id.clone()), true)?;
        Ok(updated)
    }

    /// Remove a photo. Returns `false` when no photo has `id`.
    pub fn delete(&mut self, id: &PhotoId) -> Result<bool> {
        let Some(index) = self.photos.iter().position(|p| &p.id == id) else {
            return Ok(false);
        };

        self.photos.remove(index);
        info!("Deleted photo {}", id);
        self.commit(CollectionEvent::Deleted(id.clone()), true)?;
        Ok(true)
    }

    /// Flip the favorite flag, returning the new value.
    pub fn toggle_favorite(&mut self, id: &PhotoId) -> Result<bool> {
        let photo = self
            .photos
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| GalleryError::NotFound(id.clone()))?;

        photo.favorite = !photo.favorite;
        let favorite = photo.favorite;

        self.commit(
            CollectionEvent::FavoriteToggled {
                id: id.clone(),
                favorite,
            },
            true,
        )?;
        Ok(favorite)
    }

    /// Append a category. Returns `false` when the exact name already exists.
    pub fn add_category(&mut self, name: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(GalleryError::Validation("category name is empty".to_string()));
        }
        if self.categories.iter().any(|c| c == name) {
            return Ok(false);
        }

        self.categories.push(name.to_string());
        self.commit(CollectionEvent::CategoryAdded(name.to_string()), false)?;
        Ok(true)
    }

    /// Serialize the whole collection as an export document.
    pub fn export_snapshot(&self) -> Result<String> {
        export::render_document(&self.photos, &self.categories, self.clock.now())
    }

    /// Replace the photo collection with the valid records of `document`
    /// and merge its categories into the registry.
    pub fn import_snapshot(&mut self, document: &str) -> Result<ImportSummary> {
        let parsed = export::parse_document(document, self.options.max_import_bytes)?;

        let before = self.categories.len();
        for category in parsed.categories {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }

        let summary = ImportSummary {
            imported: parsed.photos.len(),
            dropped: parsed.dropped,
            categories_added: self.categories.len() - before,
        };
        self.photos = parsed.photos;

        info!(
            "Imported {} photos ({} dropped, {} new categories)",
            summary.imported, summary.dropped, summary.categories_added
        );
        self.commit(
            CollectionEvent::Imported {
                photos: summary.imported,
            },
            true,
        )?;
        Ok(summary)
    }

    /// Add the sample photo set in front of the current collection.
    pub fn seed_samples(&mut self) -> Result<usize> {
        let now = self.clock.now();
        let mut samples = seed::sample_photos(&self.options.samples_dir, now, self.ids.as_mut());

        let mut taken: HashSet<PhotoId> = self.photos.iter().map(|p| p.id.clone()).collect();
        for photo in samples.iter_mut() {
            if photo.id.is_blank() || taken.contains(&photo.id) {
                photo.id = draw_unique_id(self.ids.as_mut(), |id| taken.contains(id))?;
            }
            taken.insert(photo.id.clone());
        }

        let count = samples.len();
        samples.append(&mut self.photos);
        self.photos = samples;

        info!("Seeded {} sample photos", count);
        self.commit(CollectionEvent::Seeded { photos: count }, true)?;
        Ok(count)
    }

    // === Internals ===

    fn fresh_id(&mut self) -> Result<PhotoId> {
        let photos = &self.photos;
        draw_unique_id(self.ids.as_mut(), |id| photos.iter().any(|p| &p.id == id))
    }

    /// Persist, then notify subscribers. Subscribers hear about the change
    /// even when the write failed, since the in-memory state did change.
    fn commit(&mut self, event: CollectionEvent, photos_changed: bool) -> Result<()> {
        if photos_changed {
            self.revision += 1;
        }
        let saved = self.persist();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        saved
    }

    fn persist(&mut self) -> Result<()> {
        let photos = serde_json::to_string(&self.photos)
            .map_err(|e| GalleryError::Storage(e.into()))?;
        let categories = serde_json::to_string(&self.categories)
            .map_err(|e| GalleryError::Storage(e.into()))?;

        self.storage
            .write(PHOTOS_KEY, &photos)
            .and_then(|_| self.storage.write(CATEGORIES_KEY, &categories))
            .map_err(|e| {
                warn!("Failed to persist collection: {:#}", e);
                GalleryError::Storage(e)
            })
    }
}

/// Draw ids until one is non-blank and not `taken`, giving up after
/// `MAX_ID_ATTEMPTS` draws.
fn draw_unique_id(ids: &mut dyn IdGenerator, taken: impl Fn(&PhotoId) -> bool) -> Result<PhotoId> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = ids.next_id();
        if !id.is_blank() && !taken(&id) {
            return Ok(id);
        }
        warn!("Id generator produced an unusable id '{}', retrying", id);
    }
    Err(GalleryError::Validation(format!(
        "no unique photo id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

/// Returns the stored photos and whether the store should be seeded.
fn load_photos(storage: &dyn Storage) -> (Vec<Photo>, bool) {
    let raw = match storage.read(PHOTOS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Vec::new(), true),
        Err(e) => {
            warn!("Could not read stored photos, starting empty: {:#}", e);
            return (Vec::new(), false);
        }
    };

    match serde_json::from_str::<Vec<Value>>(&raw) {
        Ok(records) => {
            let (photos, dropped) = export::parse_records(&records);
            if dropped > 0 {
                warn!("Ignored {} unusable stored photo records", dropped);
            }
            (photos, records.is_empty())
        }
        Err(e) => {
            warn!("Stored photos are malformed, starting empty: {}", e);
            (Vec::new(), false)
        }
    }
}

fn load_categories(storage: &dyn Storage, defaults: &[String]) -> Vec<String> {
    match storage.read(CATEGORIES_KEY) {
        Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(categories) => categories,
            Err(e) => {
                warn!("Stored categories are malformed, using defaults: {}", e);
                defaults.to_vec()
            }
        },
        Ok(None) => defaults.to_vec(),
        Err(e) => {
            warn!("Could not read stored categories, using defaults: {:#}", e);
            defaults.to_vec()
        }
    }
}
