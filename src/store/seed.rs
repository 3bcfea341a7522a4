//! Sample photos shown on first run.

use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use super::clock::IdGenerator;
use super::photo::{Photo, PhotoMetadata, UNCATEGORIZED};
use crate::upload::mime_type_for;

struct Sample {
    name: &'static str,
    title: &'static str,
    tags: &'static [&'static str],
    category: &'static str,
    favorite: bool,
}

const SAMPLES: &[Sample] = &[
    Sample { name: "20240330_130225.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "20240622_201519.jpg", title: "Sunset on the Beach", tags: &["beach", "sun"], category: "Travel", favorite: false },
    Sample { name: "20240720_151443.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "20240803_185933.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "20240906_231414.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "20241020_193623.jpg", title: "Family Gathering", tags: &["family", "event"], category: "Family", favorite: true },
    Sample { name: "20241130_131531.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "20241224_215015.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "20250301_225741.jpg", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "IMG_20240830_104101_199.webp", title: "", tags: &[], category: UNCATEGORIZED, favorite: false },
    Sample { name: "IMG-20231111-WA0009.jpg", title: "Wildflowers", tags: &["flowers", "countryside"], category: "Nature", favorite: false },
    Sample { name: "IMG-20240205-WA0009.jpg", title: "City Trip", tags: &["city", "travel"], category: "Travel", favorite: false },
];

/// Build the sample set. The first sample is dated `now`, each following
/// one a day earlier. Image refs point into `samples_dir`.
pub fn sample_photos(samples_dir: &str, now: DateTime<Utc>, ids: &mut dyn IdGenerator) -> Vec<Photo> {
    let dir = samples_dir.trim_end_matches('/');

    SAMPLES
        .iter()
        .enumerate()
        .map(|(idx, sample)| {
            let image_ref = format!("{}/{}", dir, sample.name);
            let title = if sample.title.is_empty() {
                format!("Photo {}", stem(sample.name))
            } else {
                sample.title.to_string()
            };

            Photo {
                id: ids.next_id(),
                name: sample.name.to_string(),
                mime_type: mime_type_for(Path::new(sample.name)).to_string(),
                byte_size: 0,
                primary_image_ref: image_ref.clone(),
                thumbnail_image_ref: image_ref,
                upload_timestamp: now - Duration::days(idx as i64),
                title,
                tags: sample.tags.iter().map(|t| t.to_string()).collect(),
                category: sample.category.to_string(),
                favorite: sample.favorite,
                metadata: PhotoMetadata {
                    width: 0,
                    height: 0,
                    aspect_ratio: 1.78,
                },
            }
        })
        .collect()
}

fn stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}
