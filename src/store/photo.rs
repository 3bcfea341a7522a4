//! Photo records as stored, exported and imported.
//!
//! Field names on the wire follow the persisted layout used by existing
//! galleries (`dataURL`, `thumbnailURL`, `uploadDate`, ...), so old data
//! loads without migration.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Category assigned to photos that were never put in one.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Stable identifier of a photo within a collection.
///
/// Older galleries stored numeric ids; those are read back as their
/// decimal text so both forms compare the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(String);

impl PhotoId {
    pub fn new(id: impl Into<String>) -> Self {
        PhotoId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        PhotoId(s.to_string())
    }
}

impl From<String> for PhotoId {
    fn from(s: String) -> Self {
        PhotoId(s)
    }
}

impl Serialize for PhotoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PhotoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => PhotoId(s),
            RawId::Number(n) => PhotoId(n.to_string()),
        })
    }
}

/// Image dimensions, filled in by the image processor when known.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub width: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub height: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub aspect_ratio: f64,
}

impl PhotoMetadata {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let aspect_ratio = if height == 0 {
            0.0
        } else {
            width as f64 / height as f64
        };
        Self {
            width,
            height,
            aspect_ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,

    #[serde(default, deserialize_with = "lenient")]
    pub name: String,

    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub mime_type: String,

    #[serde(rename = "size", default, deserialize_with = "lenient_size")]
    pub byte_size: u64,

    #[serde(rename = "dataURL")]
    pub primary_image_ref: String,

    #[serde(rename = "thumbnailURL")]
    pub thumbnail_image_ref: String,

    #[serde(rename = "uploadDate", default, deserialize_with = "deserialize_upload_date")]
    pub upload_timestamp: DateTime<Utc>,

    #[serde(default, deserialize_with = "lenient")]
    pub title: String,

    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,

    #[serde(default = "default_category", deserialize_with = "deserialize_category")]
    pub category: String,

    #[serde(default, deserialize_with = "lenient")]
    pub favorite: bool,

    #[serde(default, deserialize_with = "lenient")]
    pub metadata: PhotoMetadata,
}

impl Photo {
    /// Title used for display and title ordering: the title, or the file
    /// name when no title was given.
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

fn default_category() -> String {
    UNCATEGORIZED.to_string()
}

// Optional fields of stored and imported records are read leniently: a null
// or mistyped value becomes the field's default instead of rejecting the
// whole record.

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Sizes written by older galleries may be floats.
fn lenient_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or_default(),
        _ => 0,
    })
}

fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let tags = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(normalize_tags(tags))
}

fn deserialize_category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let category = match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    };
    Ok(category_or_default(category))
}

fn deserialize_upload_date<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(parse_upload_date(&value).unwrap_or_default())
}

/// RFC 3339 text, a bare `YYYY-MM-DD` date (midnight UTC), or epoch
/// milliseconds.
fn parse_upload_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

/// Fields supplied when adding a photo. Everything else is assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub name: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub primary_image_ref: String,
    pub thumbnail_image_ref: String,
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub metadata: PhotoMetadata,
}

/// Typed partial update.
///
/// `None` leaves a field untouched. `Some(vec![])` for tags clears them and
/// `Some("")` for category puts the photo back in [`UNCATEGORIZED`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoPatch {
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub favorite: Option<bool>,
    pub metadata: Option<PhotoMetadata>,
}

impl PhotoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn metadata(mut self, metadata: PhotoMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the named fields into `photo`. Identity and upload time never change.
    pub fn apply_to(self, photo: &mut Photo) {
        if let Some(title) = self.title {
            photo.title = title;
        }
        if let Some(tags) = self.tags {
            photo.tags = normalize_tags(tags);
        }
        if let Some(category) = self.category {
            photo.category = category_or_default(Some(category));
        }
        if let Some(favorite) = self.favorite {
            photo.favorite = favorite;
        }
        if let Some(metadata) = self.metadata {
            photo.metadata = metadata;
        }
    }
}

pub(crate) fn category_or_default(category: Option<String>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c,
        _ => default_category(),
    }
}

/// Trim tags, drop empty ones and duplicates, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Parse a comma-separated tag list as typed in the upload and edit forms.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}
