//! Gallery export documents and import validation.
//!
//! The exported file is a pretty-printed JSON document:
//!
//! ```json
//! { "photos": [...], "categories": [...], "exportDate": "...", "version": "1.0" }
//! ```
//!
//! Import accepts the same shape. Records missing an id or either image
//! reference are dropped; the document as a whole is rejected only when it
//! is malformed, has no `photos` array, or exceeds the size ceiling.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

use crate::error::{GalleryError, Result};
use crate::store::{Photo, PhotoId};

pub const EXPORT_VERSION: &str = "1.0";

/// Largest import document accepted.
pub const MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GalleryDocument<'a> {
    photos: &'a [Photo],
    categories: &'a [String],
    export_date: DateTime<Utc>,
    version: &'static str,
}

/// Serialize the full collection as an export document.
pub fn render_document(
    photos: &[Photo],
    categories: &[String],
    exported_at: DateTime<Utc>,
) -> Result<String> {
    let document = GalleryDocument {
        photos,
        categories,
        export_date: exported_at,
        version: EXPORT_VERSION,
    };
    serde_json::to_string_pretty(&document)
        .map_err(|e| GalleryError::Validation(format!("could not serialize gallery: {}", e)))
}

/// Default file name offered when saving an export.
pub fn export_file_name(exported_at: DateTime<Utc>) -> String {
    format!("galeria_fotos_{}.json", exported_at.format("%Y-%m-%d"))
}

/// Validated content of an import document.
#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub photos: Vec<Photo>,
    pub categories: Vec<String>,
    /// Photo records rejected during validation.
    pub dropped: usize,
}

/// Check that input of `size` bytes is within `limit`.
pub fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(GalleryError::OversizeInput { size, limit });
    }
    Ok(())
}

/// Parse and validate an import document.
pub fn parse_document(input: &str, max_bytes: u64) -> Result<ParsedImport> {
    check_size(input.len() as u64, max_bytes)?;

    let document: Value = serde_json::from_str(input)
        .map_err(|e| GalleryError::Validation(format!("malformed gallery document: {}", e)))?;

    let records = document
        .get("photos")
        .and_then(Value::as_array)
        .ok_or_else(|| GalleryError::Validation("gallery document has no photos array".to_string()))?;

    let (photos, dropped) = parse_records(records);
    let mut parsed = ParsedImport {
        photos,
        dropped,
        ..Default::default()
    };

    if let Some(categories) = document.get("categories").and_then(Value::as_array) {
        parsed.categories = categories
            .iter()
            .filter_map(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string)
            .collect();
    }

    Ok(parsed)
}

/// Validate photo records, keeping the first record for each id.
///
/// A record is dropped only when it lacks an id or either image reference;
/// other fields that are absent, null or mistyped take their defaults.
/// Returns the kept photos and the number dropped.
pub fn parse_records(records: &[Value]) -> (Vec<Photo>, usize) {
    let mut photos = Vec::with_capacity(records.len());
    let mut dropped = 0;
    let mut seen: HashSet<PhotoId> = HashSet::new();

    for (idx, record) in records.iter().enumerate() {
        match parse_photo(record) {
            Some(photo) if seen.insert(photo.id.clone()) => photos.push(photo),
            Some(photo) => {
                warn!("Dropping photo record {}: duplicate id {}", idx, photo.id);
                dropped += 1;
            }
            None => {
                warn!("Dropping photo record {}: missing id or image data", idx);
                dropped += 1;
            }
        }
    }

    (photos, dropped)
}

fn parse_photo(record: &Value) -> Option<Photo> {
    let has_id = match record.get("id") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    };
    if !has_id || !non_empty_str(record, "dataURL") || !non_empty_str(record, "thumbnailURL") {
        return None;
    }

    let mut photo: Photo = match serde_json::from_value(record.clone()) {
        Ok(photo) => photo,
        Err(e) => {
            warn!("Photo record rejected: {}", e);
            return None;
        }
    };
    if photo.name.is_empty() {
        photo.name = photo.id.to_string();
    }
    Some(photo)
}

fn non_empty_str(record: &Value, key: &str) -> bool {
    record
        .get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_export_file_name() {
        let at = Utc.with_ymd_and_hms(2025, 3, 9, 22, 15, 0).unwrap();
        assert_eq!(export_file_name(at), "galeria_fotos_2025-03-09.json");
    }

    #[test]
    fn test_render_document_shape() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let json = render_document(&[], &["Travel".to_string()], at).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], "1.0");
        assert_eq!(value["categories"][0], "Travel");
        assert!(value["photos"].as_array().unwrap().is_empty());
        assert!(value["exportDate"].as_str().unwrap().starts_with("2025-01-01T00:00:00"));
    }

    #[test]
    fn test_rejects_document_without_photos() {
        let err = parse_document(r#"{"categories": ["Travel"]}"#, MAX_IMPORT_BYTES).unwrap_err();
        assert!(matches!(err, GalleryError::Validation(_)));

        let err = parse_document(r#"{"photos": {}}"#, MAX_IMPORT_BYTES).unwrap_err();
        assert!(matches!(err, GalleryError::Validation(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = parse_document("{not json", MAX_IMPORT_BYTES).unwrap_err();
        assert!(matches!(err, GalleryError::Validation(_)));
    }

    #[test]
    fn test_rejects_oversize_document() {
        let err = parse_document(r#"{"photos": []}"#, 4).unwrap_err();
        assert!(matches!(err, GalleryError::OversizeInput { size: 14, limit: 4 }));
    }

    #[test]
    fn test_keeps_records_with_null_or_loose_optional_fields() {
        let doc = r#"{
            "photos": [
                {"id": "a", "dataURL": "data:a", "thumbnailURL": "thumb:a", "title": null},
                {"id": "b", "dataURL": "data:b", "thumbnailURL": "thumb:b", "uploadDate": "2024-05-01"},
                {"id": "c", "dataURL": "data:c", "thumbnailURL": "thumb:c", "category": null},
                {"id": "d", "dataURL": "data:d", "thumbnailURL": "thumb:d"}
            ]
        }"#;

        let parsed = parse_document(doc, MAX_IMPORT_BYTES).unwrap();
        let ids: Vec<&str> = parsed.photos.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(parsed.dropped, 0);
        assert_eq!(parsed.photos[0].title, "");
        assert_eq!(
            parsed.photos[1].upload_timestamp,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(parsed.photos[2].category, crate::store::UNCATEGORIZED);
    }

    #[test]
    fn test_drops_incomplete_and_duplicate_records() {
        let doc = r#"{
            "photos": [
                {"id": "a", "name": "a.jpg", "dataURL": "data:a", "thumbnailURL": "thumb:a"},
                {"id": "b", "name": "b.jpg", "dataURL": "data:b"},
                {"id": "", "name": "c.jpg", "dataURL": "data:c", "thumbnailURL": "thumb:c"},
                {"id": "a", "name": "a2.jpg", "dataURL": "data:a2", "thumbnailURL": "thumb:a2"},
                {"id": 42, "dataURL": "data:d", "thumbnailURL": "thumb:d", "tags": [" x ", ""]}
            ],
            "categories": ["Travel", 3, ""]
        }"#;

        let parsed = parse_document(doc, MAX_IMPORT_BYTES).unwrap();
        let ids: Vec<&str> = parsed.photos.iter().map(|p| p.id.as_str()).collect();

        assert_eq!(ids, vec!["a", "42"]);
        assert_eq!(parsed.dropped, 3);
        assert_eq!(parsed.photos[1].name, "42");
        assert_eq!(parsed.photos[1].tags, vec!["x"]);
        assert_eq!(parsed.categories, vec!["Travel"]);
    }
}
