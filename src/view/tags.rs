use std::collections::BTreeSet;

use super::filter::FilterSpec;
use crate::store::Photo;

/// One entry of the tag bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChip {
    pub tag: String,
    pub active: bool,
}

/// Every distinct tag in the whole collection, sorted ascending, marked
/// active when it is part of the filter.
pub fn tag_index(photos: &[Photo], spec: &FilterSpec) -> Vec<TagChip> {
    let tags: BTreeSet<&str> = photos
        .iter()
        .flat_map(|p| p.tags.iter().map(String::as_str))
        .collect();

    tags.into_iter()
        .map(|tag| TagChip {
            tag: tag.to_string(),
            active: spec.is_tag_active(tag),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PhotoId, PhotoMetadata, UNCATEGORIZED};
    use chrono::Utc;

    fn tagged(id: &str, tags: &[&str]) -> Photo {
        Photo {
            id: PhotoId::from(id),
            name: format!("{}.jpg", id),
            mime_type: String::new(),
            byte_size: 0,
            primary_image_ref: "d".to_string(),
            thumbnail_image_ref: "t".to_string(),
            upload_timestamp: Utc::now(),
            title: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: UNCATEGORIZED.to_string(),
            favorite: false,
            metadata: PhotoMetadata::default(),
        }
    }

    #[test]
    fn test_tags_are_distinct_sorted_and_annotated() {
        let photos = vec![
            tagged("a", &["sun", "beach"]),
            tagged("b", &["city", "sun"]),
            tagged("c", &[]),
        ];
        let spec = FilterSpec::new().with_tag("city").with_tag("gone");

        let chips = tag_index(&photos, &spec);
        let names: Vec<&str> = chips.iter().map(|c| c.tag.as_str()).collect();

        assert_eq!(names, vec!["beach", "city", "sun"]);
        assert_eq!(chips.iter().filter(|c| c.active).count(), 1);
        assert!(chips[1].active);
    }

    #[test]
    fn test_empty_collection_has_no_tags() {
        assert!(tag_index(&[], &FilterSpec::new()).is_empty());
    }
}
