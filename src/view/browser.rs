//! State behind the gallery grid: the current filter, how far the user has
//! paged, and the page rendered from them.

use chrono::{DateTime, Utc};

use super::filter::{CategorySelector, FilterSpec, SortKey};
use super::pagination::Pagination;
use super::projection::project;
use super::tags::{tag_index, TagChip};
use crate::store::{CollectionStore, Photo};

/// Paging restarts at page 1 whenever the filter is replaced or the
/// collection's revision moves.
#[derive(Debug, Clone)]
pub struct GalleryView {
    spec: FilterSpec,
    pagination: Pagination,
    seen_revision: Option<u64>,
}

/// What the grid shows after a render.
#[derive(Debug)]
pub struct GalleryPage<'a> {
    pub photos: Vec<&'a Photo>,
    pub total: usize,
    pub has_more: bool,
    pub tags: Vec<TagChip>,
}

impl GalleryPage<'_> {
    pub fn status(&self) -> String {
        if self.total == 0 {
            "No photos match the current filters".to_string()
        } else {
            format!("Showing {} of {} photos", self.photos.len(), self.total)
        }
    }
}

impl GalleryView {
    pub fn new(page_size: usize, sort_key: SortKey) -> Self {
        Self {
            spec: FilterSpec::new().with_sort(sort_key),
            pagination: Pagination::new(page_size),
            seen_revision: None,
        }
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// Replace the filter wholesale.
    pub fn set_spec(&mut self, spec: FilterSpec) {
        self.spec = spec;
        self.pagination.reset();
    }

    pub fn select_category(&mut self, selector: impl Into<CategorySelector>) {
        let spec = self.spec.clone().with_selector(selector);
        self.set_spec(spec);
    }

    pub fn set_search(&mut self, term: &str) {
        let spec = self.spec.clone().with_search(term.to_lowercase());
        self.set_spec(spec);
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        let spec = self.spec.clone().with_tag_toggled(tag);
        self.set_spec(spec);
    }

    pub fn set_sort(&mut self, sort_key: SortKey) {
        let spec = self.spec.clone().with_sort(sort_key);
        self.set_spec(spec);
    }

    pub fn clear_filters(&mut self) {
        let spec = self.spec.clone().cleared();
        self.set_spec(spec);
    }

    /// Reveal another page. Returns false when everything is already shown.
    pub fn load_more(&mut self, store: &CollectionStore, now: DateTime<Utc>) -> bool {
        self.sync(store);
        let total = project(store.photos(), &self.spec, now).len();
        self.pagination.advance(total)
    }

    pub fn render<'a>(&mut self, store: &'a CollectionStore, now: DateTime<Utc>) -> GalleryPage<'a> {
        self.sync(store);

        let projected = project(store.photos(), &self.spec, now);
        let total = projected.len();

        GalleryPage {
            photos: self.pagination.window(&projected).to_vec(),
            total,
            has_more: self.pagination.has_more(total),
            tags: tag_index(store.photos(), &self.spec),
        }
    }

    fn sync(&mut self, store: &CollectionStore) {
        let revision = store.revision();
        if self.seen_revision != Some(revision) {
            if self.seen_revision.is_some() {
                self.pagination.reset();
            }
            self.seen_revision = Some(revision);
        }
    }
}

impl Default for GalleryView {
    fn default() -> Self {
        Self::new(super::pagination::DEFAULT_PAGE_SIZE, SortKey::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FixedClock, MemoryStorage, NewPhoto, SequentialIds, StoreOptions, UNCATEGORIZED};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_with(count: usize) -> CollectionStore {
        let mut store = CollectionStore::open(
            Box::new(MemoryStorage::new()),
            Box::new(FixedClock(now())),
            Box::new(SequentialIds::with_salt("v")),
            StoreOptions::default(),
        );
        for i in 0..count {
            store
                .add(NewPhoto {
                    name: format!("IMG_{:04}.jpg", i),
                    primary_image_ref: format!("data:{}", i),
                    thumbnail_image_ref: format!("thumb:{}", i),
                    tags: if i % 2 == 0 { vec!["even".to_string()] } else { Vec::new() },
                    ..Default::default()
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_search_change_resets_paging() {
        let store = store_with(50);
        let mut view = GalleryView::new(20, SortKey::default());

        view.render(&store, now());
        assert!(view.load_more(&store, now()));
        assert!(view.load_more(&store, now()));
        assert_eq!(view.pagination().current_page(), 3);
        assert_eq!(view.pagination().visible_count(), 60);

        view.set_search("img");
        assert_eq!(view.pagination().current_page(), 1);
        assert_eq!(view.pagination().visible_count(), 20);
    }

    #[test]
    fn test_collection_change_resets_paging() {
        let mut store = store_with(30);
        let mut view = GalleryView::new(20, SortKey::default());

        view.load_more(&store, now());
        assert_eq!(view.render(&store, now()).photos.len(), 30);

        let id = store.photos()[0].id.clone();
        store.toggle_favorite(&id).unwrap();

        let page = view.render(&store, now());
        assert_eq!(view.pagination().current_page(), 1);
        assert_eq!(page.photos.len(), 20);
        assert!(page.has_more);
    }

    #[test]
    fn test_render_reports_totals_and_tags() {
        let store = store_with(5);
        let mut view = GalleryView::new(2, SortKey::default());
        view.toggle_tag("even");

        let page = view.render(&store, now());
        assert_eq!(page.total, 3);
        assert_eq!(page.photos.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.status(), "Showing 2 of 3 photos");
        assert_eq!(
            page.tags,
            vec![TagChip {
                tag: "even".to_string(),
                active: true
            }]
        );
    }

    #[test]
    fn test_tag_bar_lists_tags_of_filtered_out_photos() {
        let mut store = store_with(4);
        store
            .add(NewPhoto {
                name: "harbour.jpg".to_string(),
                primary_image_ref: "data:h".to_string(),
                thumbnail_image_ref: "thumb:h".to_string(),
                tags: vec!["sea".to_string(), "boats".to_string()],
                category: Some("Travel".to_string()),
                ..Default::default()
            })
            .unwrap();

        let mut view = GalleryView::new(20, SortKey::default());
        view.toggle_tag("even");
        view.select_category(CategorySelector::Category(UNCATEGORIZED.to_string()));

        let page = view.render(&store, now());
        assert_eq!(page.total, 2);
        assert!(page.photos.iter().all(|p| !p.has_tag("sea")));

        let chips: Vec<(&str, bool)> = page
            .tags
            .iter()
            .map(|chip| (chip.tag.as_str(), chip.active))
            .collect();
        assert_eq!(chips, vec![("boats", false), ("even", true), ("sea", false)]);
    }

    #[test]
    fn test_empty_status_and_clear_filters() {
        let store = store_with(3);
        let mut view = GalleryView::default();
        view.select_category("favorites");
        view.set_sort(SortKey::TitleAsc);

        let page = view.render(&store, now());
        assert_eq!(page.total, 0);
        assert_eq!(page.status(), "No photos match the current filters");
        assert!(!view.load_more(&store, now()));

        view.clear_filters();
        assert_eq!(view.spec().selector, CategorySelector::All);
        assert_eq!(view.spec().sort_key, SortKey::TitleAsc);
        assert_eq!(view.render(&store, now()).total, 3);
    }
}
