//! Derives the ordered view of the collection for a [`FilterSpec`].
//!
//! Stages run in a fixed order, each narrowing the previous one:
//! category selector, search, tags, then a stable sort. Evaluation is pure;
//! the only outside input is the instant used for the "recent" window.

use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;

use super::filter::{CategorySelector, FilterSpec, SortKey};
use crate::store::Photo;

/// Photos uploaded within this window count as recent.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Filter and sort `photos` for `spec`. Nothing is paginated yet.
pub fn project<'a>(photos: &'a [Photo], spec: &FilterSpec, now: DateTime<Utc>) -> Vec<&'a Photo> {
    let selected = by_selector(photos.iter().collect(), &spec.selector, now);
    let searched = by_search(selected, &spec.search_term);
    let mut tagged = by_tags(searched, spec);
    sort_photos(&mut tagged, spec.sort_key);
    tagged
}

pub fn by_selector<'a>(
    photos: Vec<&'a Photo>,
    selector: &CategorySelector,
    now: DateTime<Utc>,
) -> Vec<&'a Photo> {
    match selector {
        CategorySelector::All => photos,
        CategorySelector::Recent => {
            let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
            photos
                .into_iter()
                .filter(|p| p.upload_timestamp > cutoff)
                .collect()
        }
        CategorySelector::Favorites => photos.into_iter().filter(|p| p.favorite).collect(),
        CategorySelector::Category(name) => photos
            .into_iter()
            .filter(|p| &p.category == name)
            .collect(),
    }
}

pub fn by_search<'a>(photos: Vec<&'a Photo>, term: &str) -> Vec<&'a Photo> {
    if term.is_empty() {
        return photos;
    }
    let needle = term.to_lowercase();
    photos
        .into_iter()
        .filter(|p| matches_search(p, &needle))
        .collect()
}

/// `needle` must already be lowercase.
fn matches_search(photo: &Photo, needle: &str) -> bool {
    field_matches(&photo.title, needle)
        || field_matches(&photo.name, needle)
        || photo.tags.iter().any(|t| field_matches(t, needle))
        || field_matches(&photo.category, needle)
}

fn field_matches(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(needle)
}

/// Keep photos sharing at least one tag with the active set.
pub fn by_tags<'a>(photos: Vec<&'a Photo>, spec: &FilterSpec) -> Vec<&'a Photo> {
    if spec.active_tags.is_empty() {
        return photos;
    }
    photos
        .into_iter()
        .filter(|p| p.tags.iter().any(|t| spec.active_tags.contains(t)))
        .collect()
}

/// Stable sort: photos with equal keys keep their relative order.
pub fn sort_photos(photos: &mut [&Photo], key: SortKey) {
    match key {
        SortKey::UploadDateDesc => photos.sort_by(|a, b| b.upload_timestamp.cmp(&a.upload_timestamp)),
        SortKey::UploadDateAsc => photos.sort_by(|a, b| a.upload_timestamp.cmp(&b.upload_timestamp)),
        SortKey::TitleAsc => photos.sort_by(|a, b| compare_titles(a, b)),
        SortKey::TitleDesc => photos.sort_by(|a, b| compare_titles(b, a)),
        SortKey::SizeDesc => photos.sort_by(|a, b| b.byte_size.cmp(&a.byte_size)),
        SortKey::SizeAsc => photos.sort_by(|a, b| a.byte_size.cmp(&b.byte_size)),
    }
}

fn compare_titles(a: &Photo, b: &Photo) -> Ordering {
    collation_key(a.display_title()).cmp(&collation_key(b.display_title()))
}

/// Base-letter comparison key: case and common Latin accents are ignored,
/// so "Água", "agua" and "AGUA" collate together.
pub fn collation_key(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).map(base_letter).collect()
}

fn base_letter(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'ď' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => 'i',
        'ł' => 'l',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => 'o',
        'ř' => 'r',
        'ś' | 'š' | 'ş' => 's',
        'ť' | 'ţ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => 'u',
        'ý' | 'ÿ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        other => other,
    }
}
