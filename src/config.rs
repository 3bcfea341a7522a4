use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::MAX_IMPORT_BYTES;
use crate::store::{default_categories, StoreOptions};
use crate::upload::{DataUriProcessor, UploadOptions, MAX_UPLOAD_BYTES};
use crate::view::{SortKey, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Where the rolling log file goes when journald is unavailable.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub gallery: GalleryConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub default_sort: SortKey,

    /// Fill an empty gallery with the sample photos on first start.
    #[serde(default = "default_seed_samples")]
    pub seed_samples: bool,

    #[serde(default = "default_samples_dir")]
    pub samples_dir: String,

    #[serde(default = "default_categories")]
    pub default_categories: Vec<String>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_seed_samples() -> bool {
    true
}

fn default_samples_dir() -> String {
    "img/samples".to_string()
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_sort: SortKey::default(),
            seed_samples: default_seed_samples(),
            samples_dir: default_samples_dir(),
            default_categories: default_categories(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Re-encode uploaded images as JPEG.
    #[serde(default)]
    pub compress: bool,

    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,

    #[serde(default = "default_thumbnail_quality")]
    pub thumbnail_quality: u8,

    #[serde(default = "default_compress_quality")]
    pub compress_quality: u8,

    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_max_file_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_thumbnail_size() -> u32 {
    200
}

fn default_thumbnail_quality() -> u8 {
    70
}

fn default_compress_quality() -> u8 {
    80
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            compress: false,
            thumbnail_size: default_thumbnail_size(),
            thumbnail_quality: default_thumbnail_quality(),
            compress_quality: default_compress_quality(),
            image_extensions: default_image_extensions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_max_import_bytes")]
    pub max_bytes: u64,
}

fn default_max_import_bytes() -> u64 {
    MAX_IMPORT_BYTES
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_import_bytes(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
        .join("folio.db")
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
        .join("logs")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_dir: default_log_dir(),
            gallery: GalleryConfig::default(),
            upload: UploadConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    /// Load from `FOLIO_CONFIG` or the default location, writing the
    /// defaults there on first run.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("FOLIO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(Self::config_path);
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_categories: self.gallery.default_categories.clone(),
            seed_samples: self.gallery.seed_samples,
            samples_dir: self.gallery.samples_dir.clone(),
            max_import_bytes: self.import.max_bytes,
        }
    }

    pub fn processor(&self) -> DataUriProcessor {
        DataUriProcessor {
            thumbnail_size: self.upload.thumbnail_size,
            thumbnail_quality: self.upload.thumbnail_quality,
            compress_quality: self.upload.compress_quality,
        }
    }

    pub fn upload_options(&self) -> UploadOptions {
        UploadOptions {
            compress: self.upload.compress,
            max_file_bytes: self.upload.max_file_bytes,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folio").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.gallery.page_size, 20);
        assert_eq!(config.upload.max_file_bytes, 10 * 1024 * 1024);
        assert!(config.log_dir.ends_with("folio/logs"));

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.gallery.default_categories, config.gallery.default_categories);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "db_path = \"/tmp/g.db\"\n[gallery]\npage_size = 12\ndefault_sort = \"title-asc\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/g.db"));
        assert_eq!(config.log_dir, default_log_dir());
        assert_eq!(config.gallery.page_size, 12);
        assert_eq!(config.gallery.default_sort, SortKey::TitleAsc);
        assert!(config.gallery.seed_samples);
        assert_eq!(config.import.max_bytes, MAX_IMPORT_BYTES);
        assert_eq!(config.store_options().max_import_bytes, MAX_IMPORT_BYTES);
    }
}
